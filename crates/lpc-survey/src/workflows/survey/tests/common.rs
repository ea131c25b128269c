use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::workflows::survey::catalog::{FundingOption, Project, ProjectCatalog};
use crate::workflows::survey::domain::{Answer, Evaluation, ProjectId, Rating};
use crate::workflows::survey::draft::{DraftError, DraftStore, SurveyDraft};
use crate::workflows::survey::repository::{
    RepositoryError, ResponseId, ResponseRecord, ResponseRepository, StorageError,
    SubmissionReceipt, SubmissionStore, SubmissionSummary,
};
use crate::workflows::survey::scoring::{ScoringEngine, ScoringVariant};
use crate::workflows::survey::submission::SubmissionPayload;
use crate::workflows::survey::{survey_router, SurveyApi, SurveyIntakeService, SurveyWizard};

pub(super) fn project(id: u32, funding_request: u64) -> Project {
    Project {
        id: ProjectId(id),
        title: format!("Project {id}"),
        location: "Main Street".to_string(),
        description: "Downtown improvement".to_string(),
        funding_request,
        total_cost: funding_request * 2,
        options: Vec::new(),
        image: None,
    }
}

pub(super) fn project_with_options(id: u32, options: &[(&str, u64)]) -> Project {
    let mut project = project(id, options.first().map_or(0, |(_, amount)| *amount));
    project.options = options
        .iter()
        .map(|(key, amount)| FundingOption {
            key: key.to_string(),
            label: format!("{key} scope"),
            funding_request: *amount,
            total_cost: amount * 2,
        })
        .collect();
    project
}

pub(super) fn catalog(projects: Vec<Project>) -> Arc<ProjectCatalog> {
    Arc::new(ProjectCatalog::new(projects).expect("test catalog is valid"))
}

/// Three plain projects: 3,000,000 + 2,999,999 + 1 = 6,000,000 when all are selected.
pub(super) fn boundary_catalog() -> Arc<ProjectCatalog> {
    catalog(vec![
        project(1, 3_000_000),
        project(2, 2_999_999),
        project(3, 1),
    ])
}

/// An evaluation that answers every field with the first option, a High rating and Yes.
pub(super) fn complete_evaluation(variant: &ScoringVariant) -> Evaluation {
    let mut evaluation = Evaluation::default();
    for group in &variant.checklist_groups {
        evaluation
            .toggle_checklist(group, 0, true)
            .expect("first option exists");
    }
    for field in &variant.rating_fields {
        evaluation.set_rating(&field.key, Some(Rating::High));
    }
    for field in &variant.priority_fields {
        evaluation.set_priority(&field.key, Some(Answer::Yes));
    }
    evaluation
}

pub(super) fn select_indices(
    evaluation: &mut Evaluation,
    variant: &ScoringVariant,
    group: &str,
    indices: &[usize],
) {
    let group = variant.checklist(group).expect("checklist exists").clone();
    for index in indices {
        evaluation
            .toggle_checklist(&group, *index, true)
            .expect("index in range");
    }
}

/// Drives a wizard to the selection page with every project fully evaluated.
pub(super) fn wizard_at_selection(
    catalog: Arc<ProjectCatalog>,
    variant: ScoringVariant,
) -> SurveyWizard {
    let mut wizard = SurveyWizard::new(catalog, variant);
    wizard.set_reviewer_name("Jordan").expect("name accepted");
    wizard
        .request(crate::workflows::survey::Transition::Start)
        .expect("welcome advances");
    fill_remaining(&mut wizard);
    wizard
}

pub(super) fn fill_remaining(wizard: &mut SurveyWizard) {
    let variant = wizard.variant().clone();
    while let Some(project) = wizard.current_project().cloned() {
        answer_all(wizard, project.id, &variant);
        wizard
            .request(crate::workflows::survey::Transition::Next)
            .expect("complete evaluation advances");
    }
}

pub(super) fn answer_all(wizard: &mut SurveyWizard, id: ProjectId, variant: &ScoringVariant) {
    use crate::workflows::survey::domain::FieldValue;

    for group in &variant.checklist_groups {
        wizard
            .toggle_checklist_option(id, &group.key, 0, true)
            .expect("checklist accepted");
    }
    for field in &variant.rating_fields {
        wizard
            .set_evaluation_field(id, &field.key, FieldValue::Rating(Some(Rating::High)))
            .expect("rating accepted");
    }
    for field in &variant.priority_fields {
        wizard
            .set_evaluation_field(id, &field.key, FieldValue::Priority(Some(Answer::Yes)))
            .expect("priority accepted");
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryResponses {
    pub(super) records: Arc<Mutex<Vec<ResponseRecord>>>,
}

impl ResponseRepository for MemoryResponses {
    fn insert(&self, record: ResponseRecord) -> Result<ResponseRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ResponseId) -> Result<Option<ResponseRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn all(&self) -> Result<Vec<ResponseRecord>, RepositoryError> {
        Ok(self.records.lock().expect("repository mutex poisoned").clone())
    }
}

impl MemoryResponses {
    pub(super) fn fetch_all_ids(&self) -> Vec<ResponseId> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .iter()
            .map(|record| record.id.clone())
            .collect()
    }
}

pub(super) struct UnavailableResponses;

impl ResponseRepository for UnavailableResponses {
    fn insert(&self, _record: ResponseRecord) -> Result<ResponseRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ResponseId) -> Result<Option<ResponseRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<ResponseRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingStore {
    pub(super) payloads: Mutex<Vec<SubmissionPayload>>,
}

impl SubmissionStore for RecordingStore {
    fn submit(&self, payload: SubmissionPayload) -> Result<SubmissionReceipt, StorageError> {
        let mut guard = self.payloads.lock().expect("store mutex poisoned");
        guard.push(payload);
        Ok(SubmissionReceipt {
            id: ResponseId(format!("stored-{}", guard.len())),
            submission_id: "abc123xyz".to_string(),
            timestamp: Utc::now(),
        })
    }

    fn list(&self) -> Result<Vec<SubmissionSummary>, StorageError> {
        Ok(Vec::new())
    }
}

pub(super) struct FailingStore;

impl SubmissionStore for FailingStore {
    fn submit(&self, _payload: SubmissionPayload) -> Result<SubmissionReceipt, StorageError> {
        Err(StorageError::Unavailable("server returned 500".to_string()))
    }

    fn list(&self) -> Result<Vec<SubmissionSummary>, StorageError> {
        Err(StorageError::Unavailable("server returned 500".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryDrafts {
    pub(super) draft: Mutex<Option<SurveyDraft>>,
    pub(super) saves: Mutex<usize>,
}

impl MemoryDrafts {
    pub(super) fn current(&self) -> Option<SurveyDraft> {
        self.draft.lock().expect("draft mutex poisoned").clone()
    }

    pub(super) fn save_count(&self) -> usize {
        *self.saves.lock().expect("draft mutex poisoned")
    }
}

impl DraftStore for MemoryDrafts {
    fn save(&self, draft: &SurveyDraft) -> Result<(), DraftError> {
        *self.draft.lock().expect("draft mutex poisoned") = Some(draft.clone());
        *self.saves.lock().expect("draft mutex poisoned") += 1;
        Ok(())
    }

    fn load(&self) -> Result<Option<SurveyDraft>, DraftError> {
        Ok(self.current())
    }

    fn clear(&self) -> Result<(), DraftError> {
        *self.draft.lock().expect("draft mutex poisoned") = None;
        Ok(())
    }
}

pub(super) struct BrokenDrafts;

impl DraftStore for BrokenDrafts {
    fn save(&self, _draft: &SurveyDraft) -> Result<(), DraftError> {
        Err(DraftError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only storage",
        )))
    }

    fn load(&self) -> Result<Option<SurveyDraft>, DraftError> {
        Ok(None)
    }

    fn clear(&self) -> Result<(), DraftError> {
        Ok(())
    }
}

pub(super) fn build_intake() -> (SurveyIntakeService<MemoryResponses>, MemoryResponses) {
    let repository = MemoryResponses::default();
    let service = SurveyIntakeService::new(Arc::new(repository.clone()));
    (service, repository)
}

pub(super) fn survey_router_with<R>(service: SurveyIntakeService<R>) -> axum::Router
where
    R: ResponseRepository + 'static,
{
    survey_router(SurveyApi {
        intake: Arc::new(service),
        catalog: Arc::new(ProjectCatalog::brockport()),
        engine: Arc::new(ScoringEngine::new(ScoringVariant::lpc_priorities())),
    })
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
