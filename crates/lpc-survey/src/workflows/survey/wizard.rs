//! Reviewer session state machine.
//!
//! The wizard walks a reviewer from the welcome page through one evaluation page per
//! catalog project to the funding selection page, and only lets a snapshot reach the
//! storage collaborator once every evaluation is complete (or recused) and the selected
//! total is inside the funding window. Every refusal is returned to the caller and kept on
//! the wizard so the presentation layer can render it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::catalog::{Project, ProjectCatalog};
use super::domain::{Category, ChecklistIndexError, Evaluation, FieldValue, ProjectId};
use super::draft::{DraftStore, SurveyDraft};
use super::repository::{StorageError, SubmissionReceipt, SubmissionStore};
use super::scoring::{ScoringEngine, ScoringVariant};
use super::selection::{self, FundingRange, RangeError, RangeStatus, SelectionState};
use super::submission::{self, SubmissionParts, SubmissionPayload};
use super::validation::{self, ValidationErrors};

/// Page the reviewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum WizardStep {
    Welcome,
    Evaluating { index: usize },
    Selecting,
    /// Snapshot handed to storage, waiting on the result.
    Submitting,
    Submitted,
}

/// Navigation requested by the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Start,
    Next,
    Back,
    Submit,
}

/// Question the presentation layer must put to the reviewer before the wizard proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfirmationPrompt {
    Recusal { project_id: ProjectId },
}

impl ConfirmationPrompt {
    pub fn title(&self) -> &'static str {
        match self {
            ConfirmationPrompt::Recusal { .. } => "Confirm Recusal",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ConfirmationPrompt::Recusal { .. } => {
                "Are you sure you want to recuse yourself from evaluating this project? \
                 This action will skip this project and move to the next one."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("reviewer name is required")]
    MissingReviewerName,
    #[error("reviewer name can only be changed on the welcome page")]
    NameLocked,
    #[error("project {project_id} evaluation is missing {} field(s)", .missing.len())]
    Incomplete {
        project_id: ProjectId,
        missing: ValidationErrors,
    },
    #[error(transparent)]
    OutOfRange(#[from] RangeError),
    #[error("failed to submit survey: {0}")]
    Storage(#[from] StorageError),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("survey has already been submitted")]
    Closed,
    #[error("cannot {request:?} from {step:?}")]
    InvalidTransition {
        step: WizardStep,
        request: Transition,
    },
    #[error("project {0} is not in the catalog")]
    UnknownProject(ProjectId),
    #[error("'{0}' is not a field of this survey")]
    UnknownField(String),
    #[error(transparent)]
    Checklist(#[from] ChecklistIndexError),
    #[error("project {0} is recused and cannot be selected")]
    RecusedProject(ProjectId),
    #[error("project {0} has a single funding amount")]
    NoFundingOptions(ProjectId),
    #[error("project {project_id} has no funding option '{key}'")]
    UnknownOption { project_id: ProjectId, key: String },
    #[error("project {0} is not the project under evaluation")]
    NotCurrentProject(ProjectId),
    #[error("no confirmation is pending")]
    NoPendingConfirmation,
}

/// Snapshot of everything the presentation layer renders for the current page.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub step: WizardStep,
    pub reviewer_name: String,
    pub current_project: Option<ProjectId>,
    pub validation_errors: ValidationErrors,
    pub scores: BTreeMap<ProjectId, u32>,
    pub categories: BTreeMap<ProjectId, Category>,
    pub total: u64,
    pub range_status: RangeStatus,
    pub in_range: bool,
    pub pending_confirmation: Option<ConfirmationPrompt>,
    pub error: Option<String>,
}

/// One reviewer's survey session.
pub struct SurveyWizard {
    catalog: Arc<ProjectCatalog>,
    engine: ScoringEngine,
    range: FundingRange,
    drafts: Option<Arc<dyn DraftStore>>,
    step: WizardStep,
    reviewer_name: String,
    evaluations: BTreeMap<ProjectId, Evaluation>,
    scores: BTreeMap<ProjectId, u32>,
    categories: BTreeMap<ProjectId, Category>,
    selection: SelectionState,
    validation_errors: ValidationErrors,
    pending_confirmation: Option<ConfirmationPrompt>,
    last_error: Option<WizardError>,
    in_flight: Option<SubmissionPayload>,
    receipt: Option<SubmissionReceipt>,
}

impl SurveyWizard {
    pub fn new(catalog: Arc<ProjectCatalog>, variant: ScoringVariant) -> Self {
        let evaluations = catalog
            .ids()
            .map(|id| (id, Evaluation::default()))
            .collect();

        let mut wizard = Self {
            catalog,
            engine: ScoringEngine::new(variant),
            range: FundingRange::default(),
            drafts: None,
            step: WizardStep::Welcome,
            reviewer_name: String::new(),
            evaluations,
            scores: BTreeMap::new(),
            categories: BTreeMap::new(),
            selection: SelectionState::default(),
            validation_errors: ValidationErrors::new(),
            pending_confirmation: None,
            last_error: None,
            in_flight: None,
            receipt: None,
        };
        wizard.rescore_all();
        wizard
    }

    pub fn with_drafts(mut self, drafts: Arc<dyn DraftStore>) -> Self {
        self.drafts = Some(drafts);
        self
    }

    pub fn with_range(mut self, range: FundingRange) -> Self {
        self.range = range;
        self
    }

    /// Restore the reviewer name and evaluations from the draft store, if one is attached
    /// and holds a draft. Returns whether anything was restored.
    pub fn resume(&mut self) -> bool {
        let Some(drafts) = &self.drafts else {
            return false;
        };

        let draft = match drafts.load() {
            Ok(Some(draft)) => draft,
            Ok(None) => return false,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable survey draft");
                return false;
            }
        };

        self.reviewer_name = draft.user_name;
        for (id, evaluation) in draft.evaluations {
            if let Some(slot) = self.evaluations.get_mut(&id) {
                *slot = evaluation;
            }
        }
        self.rescore_all();
        info!(reviewer = %self.reviewer_name, "restored survey draft");
        true
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn catalog(&self) -> &ProjectCatalog {
        &self.catalog
    }

    pub fn variant(&self) -> &ScoringVariant {
        self.engine.variant()
    }

    pub fn reviewer_name(&self) -> &str {
        &self.reviewer_name
    }

    pub fn evaluation(&self, id: ProjectId) -> Option<&Evaluation> {
        self.evaluations.get(&id)
    }

    pub fn evaluations(&self) -> &BTreeMap<ProjectId, Evaluation> {
        &self.evaluations
    }

    pub fn score(&self, id: ProjectId) -> Option<u32> {
        self.scores.get(&id).copied()
    }

    pub fn category(&self, id: ProjectId) -> Option<Category> {
        self.categories.get(&id).copied()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn validation_errors(&self) -> &ValidationErrors {
        &self.validation_errors
    }

    pub fn pending_confirmation(&self) -> Option<ConfirmationPrompt> {
        self.pending_confirmation
    }

    pub fn last_error(&self) -> Option<&WizardError> {
        self.last_error.as_ref()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    pub fn in_flight(&self) -> Option<&SubmissionPayload> {
        self.in_flight.as_ref()
    }

    pub fn current_project(&self) -> Option<&Project> {
        match self.step {
            WizardStep::Evaluating { index } => self.catalog.at(index),
            _ => None,
        }
    }

    pub fn total(&self) -> u64 {
        selection::total(&self.selection, &self.evaluations, &self.catalog)
    }

    pub fn range_status(&self) -> RangeStatus {
        self.range.classify(self.total())
    }

    pub fn in_range(&self) -> bool {
        self.range.contains(self.total())
    }

    /// Projects ordered by score, highest first, as shown on the selection page.
    pub fn ranked_projects(&self) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.catalog.projects().iter().collect();
        projects.sort_by(|a, b| {
            let a_score = self.scores.get(&a.id).copied().unwrap_or(0);
            let b_score = self.scores.get(&b.id).copied().unwrap_or(0);
            b_score.cmp(&a_score)
        });
        projects
    }

    pub fn view(&self) -> WizardView {
        let total = self.total();
        WizardView {
            step: self.step,
            reviewer_name: self.reviewer_name.clone(),
            current_project: self.current_project().map(|project| project.id),
            validation_errors: self.validation_errors.clone(),
            scores: self.scores.clone(),
            categories: self.categories.clone(),
            total,
            range_status: self.range.classify(total),
            in_range: self.range.contains(total),
            pending_confirmation: self.pending_confirmation,
            error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    pub fn set_reviewer_name(&mut self, name: &str) -> Result<(), WizardError> {
        self.ensure_open()?;
        if self.step != WizardStep::Welcome {
            return self.refuse(WizardError::NameLocked);
        }
        self.reviewer_name = name.to_string();
        self.autosave();
        Ok(())
    }

    /// Set a rating or priority answer on the evaluation currently on screen.
    pub fn set_evaluation_field(
        &mut self,
        project_id: ProjectId,
        field: &str,
        value: FieldValue,
    ) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.ensure_current(project_id)?;
        let variant = self.engine.variant();
        let known = match value {
            FieldValue::Rating(_) => variant.rating_field(field).is_some(),
            FieldValue::Priority(_) => variant.priority_field(field).is_some(),
        };
        if !known {
            return self.refuse(WizardError::UnknownField(field.to_string()));
        }

        let evaluation = match self.evaluations.get_mut(&project_id) {
            Some(evaluation) => evaluation,
            None => return self.refuse(WizardError::UnknownProject(project_id)),
        };
        match value {
            FieldValue::Rating(rating) => evaluation.set_rating(field, rating),
            FieldValue::Priority(answer) => evaluation.set_priority(field, answer),
        }

        debug!(%project_id, field, ?value, "evaluation field updated");
        self.validation_errors.remove(field);
        self.rescore(project_id);
        self.autosave();
        Ok(())
    }

    pub fn toggle_checklist_option(
        &mut self,
        project_id: ProjectId,
        group: &str,
        index: usize,
        checked: bool,
    ) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.ensure_current(project_id)?;
        let Some(checklist) = self.engine.variant().checklist(group).cloned() else {
            return self.refuse(WizardError::UnknownField(group.to_string()));
        };

        let evaluation = match self.evaluations.get_mut(&project_id) {
            Some(evaluation) => evaluation,
            None => return self.refuse(WizardError::UnknownProject(project_id)),
        };
        if let Err(err) = evaluation.toggle_checklist(&checklist, index, checked) {
            return self.refuse(err.into());
        }

        debug!(%project_id, group, index, checked, "checklist toggled");
        self.validation_errors.remove(group);
        self.rescore(project_id);
        self.autosave();
        Ok(())
    }

    /// Ask to recuse from (or return to) the project under evaluation.
    ///
    /// Recusing waits for [`SurveyWizard::confirm`]; withdrawing a recusal applies
    /// immediately.
    pub fn request_recusal(
        &mut self,
        project_id: ProjectId,
        recused: bool,
    ) -> Result<Option<ConfirmationPrompt>, WizardError> {
        self.ensure_open()?;
        self.ensure_current(project_id)?;

        if !recused {
            if let Some(evaluation) = self.evaluations.get_mut(&project_id) {
                evaluation.recused = false;
            }
            self.rescore(project_id);
            self.autosave();
            return Ok(None);
        }

        let prompt = ConfirmationPrompt::Recusal { project_id };
        self.pending_confirmation = Some(prompt);
        Ok(Some(prompt))
    }

    /// Accept the pending prompt and carry out what it asked about.
    pub fn confirm(&mut self) -> Result<WizardStep, WizardError> {
        self.ensure_open()?;
        let Some(prompt) = self.pending_confirmation.take() else {
            return self.refuse(WizardError::NoPendingConfirmation);
        };

        match prompt {
            ConfirmationPrompt::Recusal { project_id } => {
                if let Some(evaluation) = self.evaluations.get_mut(&project_id) {
                    evaluation.recused = true;
                }
                self.selection.clear(project_id);
                self.rescore(project_id);
                self.validation_errors.clear();
                self.last_error = None;
                self.autosave();

                let next = match self.step {
                    WizardStep::Evaluating { index } => self.advance_from(index),
                    other => other,
                };
                info!(%project_id, ?next, "reviewer recused from project");
                self.step = next;
                Ok(next)
            }
        }
    }

    pub fn cancel_confirmation(&mut self) {
        self.pending_confirmation = None;
    }

    pub fn set_selection(&mut self, project_id: ProjectId, selected: bool) -> Result<(), WizardError> {
        self.ensure_open()?;
        let Some(evaluation) = self.evaluations.get(&project_id) else {
            return self.refuse(WizardError::UnknownProject(project_id));
        };
        if selected && evaluation.recused {
            return self.refuse(WizardError::RecusedProject(project_id));
        }

        self.selection.set_selected(project_id, selected);
        debug!(%project_id, selected, total = self.total(), "selection updated");
        Ok(())
    }

    pub fn set_option(&mut self, project_id: ProjectId, key: &str) -> Result<(), WizardError> {
        self.ensure_open()?;
        let Some(project) = self.catalog.get(project_id) else {
            return self.refuse(WizardError::UnknownProject(project_id));
        };
        if !project.has_options() {
            return self.refuse(WizardError::NoFundingOptions(project_id));
        }
        if project.option(key).is_none() {
            return self.refuse(WizardError::UnknownOption {
                project_id,
                key: key.to_string(),
            });
        }
        if self
            .evaluations
            .get(&project_id)
            .map_or(false, |evaluation| evaluation.recused)
        {
            return self.refuse(WizardError::RecusedProject(project_id));
        }

        self.selection.set_option(project_id, key);
        debug!(%project_id, key, total = self.total(), "funding option chosen");
        Ok(())
    }

    /// Work out where `request` leads from the current step without changing anything.
    pub fn plan(&self, request: Transition) -> Result<WizardStep, WizardError> {
        let last = self.catalog.len().saturating_sub(1);

        match (self.step, request) {
            (WizardStep::Submitted, _) => Err(WizardError::Closed),
            (WizardStep::Submitting, _) => Err(WizardError::SubmissionInFlight),
            (WizardStep::Welcome, Transition::Start) => {
                if self.reviewer_name.trim().is_empty() {
                    Err(WizardError::MissingReviewerName)
                } else {
                    Ok(WizardStep::Evaluating { index: 0 })
                }
            }
            (WizardStep::Evaluating { index }, Transition::Next) => {
                self.completeness_guard(index)?;
                Ok(self.advance_from(index))
            }
            (WizardStep::Evaluating { index: 0 }, Transition::Back) => Ok(WizardStep::Welcome),
            (WizardStep::Evaluating { index }, Transition::Back) => {
                Ok(WizardStep::Evaluating { index: index - 1 })
            }
            (WizardStep::Selecting, Transition::Back) => Ok(WizardStep::Evaluating { index: last }),
            (WizardStep::Selecting, Transition::Submit) => {
                if self.reviewer_name.trim().is_empty() {
                    return Err(WizardError::MissingReviewerName);
                }
                for index in 0..self.catalog.len() {
                    self.completeness_guard(index)?;
                }
                self.range.check(self.total())?;
                Ok(WizardStep::Submitting)
            }
            (step, request) => Err(WizardError::InvalidTransition { step, request }),
        }
    }

    /// Apply `request`, or record and return why it was refused.
    ///
    /// A successful `Submit` leaves the wizard in `Submitting` with the assembled snapshot
    /// available from [`SurveyWizard::in_flight`] until [`SurveyWizard::complete_submit`].
    pub fn request(&mut self, request: Transition) -> Result<WizardStep, WizardError> {
        let next = match self.plan(request) {
            Ok(next) => next,
            Err(err) => {
                if let WizardError::Incomplete { missing, .. } = &err {
                    self.validation_errors = missing.clone();
                }
                return self.refuse(err);
            }
        };

        if request == Transition::Submit {
            self.in_flight = Some(self.assemble());
        }
        if matches!(request, Transition::Next | Transition::Back) {
            self.validation_errors.clear();
        }

        info!(from = ?self.step, to = ?next, ?request, "wizard transition");
        self.pending_confirmation = None;
        self.last_error = None;
        self.step = next;
        self.autosave();
        Ok(next)
    }

    /// Move to `Submitting` and hand back the snapshot to deliver.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, WizardError> {
        self.request(Transition::Submit)?;
        self.in_flight
            .clone()
            .ok_or(WizardError::InvalidTransition {
                step: self.step,
                request: Transition::Submit,
            })
    }

    /// Resolve the in-flight submission with the storage outcome.
    pub fn complete_submit(
        &mut self,
        outcome: Result<SubmissionReceipt, StorageError>,
    ) -> Result<SubmissionReceipt, WizardError> {
        if self.step != WizardStep::Submitting {
            return self.refuse(WizardError::InvalidTransition {
                step: self.step,
                request: Transition::Submit,
            });
        }
        self.in_flight = None;

        match outcome {
            Ok(receipt) => {
                self.step = WizardStep::Submitted;
                self.last_error = None;
                self.receipt = Some(receipt.clone());
                if let Some(drafts) = &self.drafts {
                    if let Err(err) = drafts.clear() {
                        warn!(error = %err, "failed to clear survey draft after submission");
                    }
                }
                info!(id = %receipt.id.0, reviewer = %self.reviewer_name, "survey submitted");
                Ok(receipt)
            }
            Err(err) => {
                self.step = WizardStep::Selecting;
                self.refuse(WizardError::Storage(err))
            }
        }
    }

    /// Drive a whole submission against a synchronous store.
    pub fn submit<S>(&mut self, store: &S) -> Result<SubmissionReceipt, WizardError>
    where
        S: SubmissionStore + ?Sized,
    {
        let payload = self.begin_submit()?;
        let outcome = store.submit(payload);
        self.complete_submit(outcome)
    }

    fn completeness_guard(&self, index: usize) -> Result<(), WizardError> {
        let Some(project) = self.catalog.at(index) else {
            return Ok(());
        };
        let Some(evaluation) = self.evaluations.get(&project.id) else {
            return Ok(());
        };

        let missing = validation::validation_errors(evaluation, self.engine.variant());
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WizardError::Incomplete {
                project_id: project.id,
                missing,
            })
        }
    }

    fn advance_from(&self, index: usize) -> WizardStep {
        if index + 1 < self.catalog.len() {
            WizardStep::Evaluating { index: index + 1 }
        } else {
            WizardStep::Selecting
        }
    }

    fn assemble(&self) -> SubmissionPayload {
        let options = self
            .selection
            .options
            .iter()
            .filter(|(id, _)| {
                self.catalog
                    .get(**id)
                    .map_or(false, |project| project.has_options())
            })
            .map(|(id, key)| (*id, key.clone()))
            .collect();

        submission::build(SubmissionParts {
            user_name: self.reviewer_name.clone(),
            evaluations: self.evaluations.clone(),
            scores: self.scores.clone(),
            categories: self.categories.clone(),
            selections: self.selection.selections.clone(),
            options,
            total: self.total(),
        })
    }

    fn ensure_open(&mut self) -> Result<(), WizardError> {
        match self.step {
            WizardStep::Submitted => self.refuse(WizardError::Closed),
            WizardStep::Submitting => self.refuse(WizardError::SubmissionInFlight),
            _ => Ok(()),
        }
    }

    /// Evaluations only change on their own page.
    fn ensure_current(&mut self, project_id: ProjectId) -> Result<(), WizardError> {
        if !self.evaluations.contains_key(&project_id) {
            return self.refuse(WizardError::UnknownProject(project_id));
        }
        if self.current_project().map(|project| project.id) != Some(project_id) {
            return self.refuse(WizardError::NotCurrentProject(project_id));
        }
        Ok(())
    }

    fn refuse<T>(&mut self, err: WizardError) -> Result<T, WizardError> {
        warn!(step = ?self.step, error = %err, "survey action refused");
        self.last_error = Some(err.clone());
        Err(err)
    }

    fn rescore(&mut self, id: ProjectId) {
        if let Some(evaluation) = self.evaluations.get(&id) {
            let score = self.engine.score(evaluation);
            self.scores.insert(id, score);
            self.categories.insert(id, self.engine.categorize(score));
        }
    }

    fn rescore_all(&mut self) {
        let ids: Vec<ProjectId> = self.evaluations.keys().copied().collect();
        for id in ids {
            self.rescore(id);
        }
    }

    fn autosave(&self) {
        if matches!(self.step, WizardStep::Submitted) {
            return;
        }
        let Some(drafts) = &self.drafts else {
            return;
        };
        let draft = SurveyDraft {
            user_name: self.reviewer_name.clone(),
            evaluations: self.evaluations.clone(),
            saved_at: Utc::now(),
        };
        if let Err(err) = drafts.save(&draft) {
            warn!(error = %err, "failed to back up survey draft");
        }
    }
}
