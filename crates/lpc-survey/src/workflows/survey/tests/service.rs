use std::collections::BTreeMap;
use std::sync::Arc;

use super::common::*;
use crate::workflows::survey::domain::{Category, Evaluation, ProjectId};
use crate::workflows::survey::repository::{
    RepositoryError, ResponseId, StorageError, SubmissionStore,
};
use crate::workflows::survey::scoring::ScoringVariant;
use crate::workflows::survey::selection::RangeStatus;
use crate::workflows::survey::service::{IntakeError, SubmissionRequest, SurveyIntakeService};
use crate::workflows::survey::submission::SubmissionPayload;

pub(super) fn valid_request(total_request: u64) -> SubmissionRequest {
    let mut evaluations = BTreeMap::new();
    evaluations.insert(ProjectId(1), Evaluation::default());
    let mut scores = BTreeMap::new();
    scores.insert(ProjectId(1), 14);
    let mut categories = BTreeMap::new();
    categories.insert(ProjectId(1), Category::Medium);
    let mut selections = BTreeMap::new();
    selections.insert(ProjectId(1), true);

    SubmissionRequest {
        user_name: Some("Jordan".to_string()),
        evaluations: Some(evaluations),
        scores: Some(scores),
        categories: Some(categories),
        project_selections: Some(selections),
        project_options: None,
        total_request: Some(total_request),
    }
}

#[test]
fn accept_persists_valid_submissions_with_metadata() {
    let (service, repository) = build_intake();

    let record = service
        .accept(valid_request(7_000_000), Some("survey-browser/1.0".to_string()))
        .expect("submission accepted");

    assert!(record.id.0.starts_with("resp-"));
    assert_eq!(record.metadata.submission_id.len(), 9);
    assert!(record
        .metadata
        .submission_id
        .chars()
        .all(|ch| ch.is_ascii_digit() || ch.is_ascii_lowercase()));
    assert_eq!(
        record.metadata.user_agent.as_deref(),
        Some("survey-browser/1.0")
    );
    assert_eq!(record.payload.total_request, 7_000_000);
    assert!(record.payload.project_options.is_empty());

    let stored = repository
        .fetch_all_ids()
        .into_iter()
        .any(|id| id == record.id);
    assert!(stored);
}

#[test]
fn accept_lists_every_missing_field() {
    let (service, repository) = build_intake();
    let mut request = valid_request(7_000_000);
    request.scores = None;
    request.user_name = Some("  ".to_string());

    match service.accept(request, None) {
        Err(IntakeError::MissingFields(received)) => {
            assert!(!received.user_name);
            assert!(!received.scores);
            assert!(received.evaluations);
            assert!(received.total_request);
            assert!(!received.project_options);
        }
        other => panic!("expected missing fields, got {other:?}"),
    }
    assert!(repository.fetch_all_ids().is_empty());
}

#[test]
fn accept_rechecks_the_funding_range() {
    let (service, repository) = build_intake();

    match service.accept(valid_request(8_000_001), None) {
        Err(IntakeError::TotalOutOfRange(err)) => {
            assert_eq!(err.total, 8_000_001);
            assert_eq!(err.status, RangeStatus::Above { excess: 1 });
        }
        other => panic!("expected out of range, got {other:?}"),
    }
    assert!(service.accept(valid_request(6_000_000), None).is_ok());
    assert!(service.accept(valid_request(8_000_000), None).is_ok());
    assert_eq!(repository.fetch_all_ids().len(), 2);
}

#[test]
fn accept_propagates_repository_failures() {
    let service = SurveyIntakeService::new(Arc::new(UnavailableResponses));
    match service.accept(valid_request(7_000_000), None) {
        Err(IntakeError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected repository failure, got {other:?}"),
    }
}

#[test]
fn responses_are_listed_newest_first() {
    let (service, _) = build_intake();
    let first = service
        .accept(valid_request(6_500_000), None)
        .expect("first accepted");
    let second = service
        .accept(valid_request(7_500_000), None)
        .expect("second accepted");

    let responses = service.responses().expect("listing works");
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].id, second.id);
    assert_eq!(responses[1].id, first.id);
    assert_eq!(responses[0].total_request, 7_500_000);
    assert_eq!(responses[0].user_name, "Jordan");
    assert!(responses[0].submitted_at.ends_with('Z'));
}

#[test]
fn get_reports_missing_records() {
    let (service, _) = build_intake();
    match service.get(&ResponseId("resp-missing".to_string())) {
        Err(IntakeError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn intake_service_acts_as_the_wizard_store() {
    let (service, repository) = build_intake();
    let mut wizard = wizard_at_selection(boundary_catalog(), ScoringVariant::lpc_core());
    for id in 1..=3 {
        wizard.set_selection(ProjectId(id), true).expect("selected");
    }

    let receipt = wizard.submit(&service).expect("stored through intake");
    assert_eq!(repository.fetch_all_ids(), vec![receipt.id.clone()]);
    assert_eq!(service.list().expect("listing works").len(), 1);

    let unavailable = SurveyIntakeService::new(Arc::new(UnavailableResponses));
    assert!(matches!(
        unavailable.submit(wizard_payload()),
        Err(StorageError::Unavailable(_))
    ));
}

fn wizard_payload() -> SubmissionPayload {
    let mut wizard = wizard_at_selection(boundary_catalog(), ScoringVariant::lpc_core());
    for id in 1..=3 {
        wizard.set_selection(ProjectId(id), true).expect("selected");
    }
    wizard.begin_submit().expect("in range")
}

#[test]
fn submission_tags_differ_between_submissions() {
    let (service, _repository) = build_intake();
    let tags: std::collections::BTreeSet<String> = (0..5)
        .map(|_| {
            service
                .accept(valid_request(7_000_000), None)
                .expect("submission accepted")
                .metadata
                .submission_id
        })
        .collect();
    assert_eq!(tags.len(), 5);
}
