//! End-to-end reviewer sessions driven through the public wizard and intake facades.
//!
//! Each scenario walks the full Brockport slate, backs drafts up to disk and hands the final
//! snapshot to the intake service the HTTP layer uses.

mod common {
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use lpc_survey::workflows::survey::{
        Answer, FieldValue, ProjectId, Rating, RepositoryError, ResponseId, ResponseRecord,
        ResponseRepository, ScoringVariant, SurveyWizard,
    };

    #[derive(Default, Clone)]
    pub(super) struct MemoryResponses {
        records: Arc<Mutex<BTreeMap<ResponseId, ResponseRecord>>>,
    }

    impl MemoryResponses {
        pub(super) fn len(&self) -> usize {
            self.records.lock().expect("repository mutex poisoned").len()
        }
    }

    impl ResponseRepository for MemoryResponses {
        fn insert(&self, record: ResponseRecord) -> Result<ResponseRecord, RepositoryError> {
            let mut guard = self.records.lock().expect("repository mutex poisoned");
            if guard.contains_key(&record.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(record.id.clone(), record.clone());
            Ok(record)
        }

        fn fetch(&self, id: &ResponseId) -> Result<Option<ResponseRecord>, RepositoryError> {
            let guard = self.records.lock().expect("repository mutex poisoned");
            Ok(guard.get(id).cloned())
        }

        fn all(&self) -> Result<Vec<ResponseRecord>, RepositoryError> {
            let guard = self.records.lock().expect("repository mutex poisoned");
            Ok(guard.values().cloned().collect())
        }
    }

    pub(super) fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "lpc-survey-session-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    /// Answer every field on the project under evaluation with strong marks.
    pub(super) fn evaluate_current(wizard: &mut SurveyWizard, variant: &ScoringVariant) -> ProjectId {
        let id = wizard.current_project().expect("on an evaluation page").id;
        for group in &variant.checklist_groups {
            for index in 0..group.sentinel.min(3) {
                wizard
                    .toggle_checklist_option(id, &group.key, index, true)
                    .expect("checklist accepted");
            }
        }
        for field in &variant.rating_fields {
            wizard
                .set_evaluation_field(id, &field.key, FieldValue::Rating(Some(Rating::High)))
                .expect("rating accepted");
        }
        for field in &variant.priority_fields {
            wizard
                .set_evaluation_field(id, &field.key, FieldValue::Priority(Some(Answer::No)))
                .expect("priority accepted");
        }
        id
    }
}

use std::sync::Arc;

use common::*;
use lpc_survey::workflows::survey::{
    Category, FileDraftStore, ProjectCatalog, ProjectId, ScoringVariant, SurveyIntakeService,
    SurveyWizard, Transition, WizardError, WizardStep,
};

#[test]
fn reviewer_completes_the_brockport_survey_end_to_end() {
    let dir = scratch_dir("complete");
    let drafts = Arc::new(FileDraftStore::new(&dir, "jordan"));
    let repository = MemoryResponses::default();
    let intake = SurveyIntakeService::new(Arc::new(repository.clone()));
    let variant = ScoringVariant::lpc_priorities();

    let mut wizard = SurveyWizard::new(Arc::new(ProjectCatalog::brockport()), variant.clone())
        .with_drafts(drafts.clone());
    assert!(!wizard.resume());
    wizard.set_reviewer_name("Jordan Reyes").expect("name accepted");
    wizard.request(Transition::Start).expect("welcome advances");

    while let Some(project) = wizard.current_project().cloned() {
        if project.id == ProjectId(4) {
            wizard
                .request_recusal(project.id, true)
                .expect("recusal requested");
            wizard.confirm().expect("recusal confirmed");
            continue;
        }
        evaluate_current(&mut wizard, &variant);
        wizard.request(Transition::Next).expect("evaluation advances");
    }
    assert_eq!(wizard.step(), WizardStep::Selecting);
    assert!(drafts.path().exists(), "draft written while evaluating");

    // 3 strategies (3) + 3 goals (2) + four High ratings (12) + three No answers (3)
    assert_eq!(wizard.score(ProjectId(1)), Some(20));
    assert_eq!(wizard.category(ProjectId(1)), Some(Category::Medium));
    assert_eq!(wizard.score(ProjectId(4)), Some(0));

    for id in [2, 3, 5, 8, 9, 11, 18] {
        wizard.set_selection(ProjectId(id), true).expect("selected");
    }
    assert_eq!(wizard.total(), 6_300_000, "grant fund needs an option first");
    wizard
        .set_option(ProjectId(18), "expanded")
        .expect("option chosen");
    assert_eq!(wizard.total(), 6_800_000);

    match wizard.set_selection(ProjectId(4), true) {
        Err(WizardError::RecusedProject(ProjectId(4))) => {}
        other => panic!("expected recused refusal, got {other:?}"),
    }

    let receipt = wizard.submit(&intake).expect("survey stored");
    assert_eq!(wizard.step(), WizardStep::Submitted);
    assert!(!drafts.path().exists(), "draft cleared after submission");
    assert_eq!(repository.len(), 1);

    let stored = intake.get(&receipt.id).expect("record stored");
    assert_eq!(stored.payload.user_name, "Jordan Reyes");
    assert_eq!(stored.payload.total_request, 6_800_000);
    assert_eq!(stored.payload.evaluations.len(), 18);
    assert!(stored.payload.evaluations[&ProjectId(4)].recused);
    assert_eq!(
        stored.payload.project_options.get(&ProjectId(18)).map(String::as_str),
        Some("expanded")
    );

    let listing = intake.responses().expect("listing works");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, receipt.id);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn interrupted_session_resumes_from_the_draft_on_disk() {
    let dir = scratch_dir("resume");
    let variant = ScoringVariant::lpc_core();
    let catalog = Arc::new(ProjectCatalog::brockport());

    let first_scores = {
        let drafts = Arc::new(FileDraftStore::new(&dir, "casey"));
        let mut wizard =
            SurveyWizard::new(catalog.clone(), variant.clone()).with_drafts(drafts);
        wizard.set_reviewer_name("Casey").expect("name accepted");
        wizard.request(Transition::Start).expect("welcome advances");
        evaluate_current(&mut wizard, &variant);
        wizard.request(Transition::Next).expect("evaluation advances");
        evaluate_current(&mut wizard, &variant);
        wizard.set_selection(ProjectId(1), true).expect("selected");
        (wizard.score(ProjectId(1)), wizard.score(ProjectId(2)))
    };

    let drafts = Arc::new(FileDraftStore::new(&dir, "casey"));
    let mut wizard = SurveyWizard::new(catalog, variant).with_drafts(drafts);
    assert!(wizard.resume());
    assert_eq!(wizard.reviewer_name(), "Casey");
    assert_eq!(
        (wizard.score(ProjectId(1)), wizard.score(ProjectId(2))),
        first_scores
    );
    assert_eq!(first_scores.0, Some(17));
    assert!(!wizard.selection().is_selected(ProjectId(1)));

    let _ = std::fs::remove_dir_all(&dir);
}
