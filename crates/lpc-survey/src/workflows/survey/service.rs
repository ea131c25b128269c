use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{Category, Evaluation, ProjectId};
use super::repository::{
    RepositoryError, ResponseId, ResponseRecord, ResponseRepository, StorageError,
    SubmissionMetadata, SubmissionReceipt, SubmissionStore, SubmissionSummary,
};
use super::selection::{format_dollars, FundingRange, RangeError};
use super::submission::SubmissionPayload;

/// Top-level fields a submission must carry.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "userName",
    "evaluations",
    "scores",
    "categories",
    "projectSelections",
    "totalRequest",
];

/// Submission body as received over the wire, before presence checks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub user_name: Option<String>,
    pub evaluations: Option<BTreeMap<ProjectId, Evaluation>>,
    pub scores: Option<BTreeMap<ProjectId, u32>>,
    pub categories: Option<BTreeMap<ProjectId, Category>>,
    pub project_selections: Option<BTreeMap<ProjectId, bool>>,
    pub project_options: Option<BTreeMap<ProjectId, String>>,
    pub total_request: Option<u64>,
}

impl SubmissionRequest {
    fn received(&self) -> ReceivedFields {
        ReceivedFields {
            user_name: self
                .user_name
                .as_deref()
                .map_or(false, |name| !name.trim().is_empty()),
            evaluations: self.evaluations.is_some(),
            scores: self.scores.is_some(),
            categories: self.categories.is_some(),
            project_selections: self.project_selections.is_some(),
            project_options: self.project_options.is_some(),
            total_request: self.total_request.is_some(),
        }
    }
}

impl From<SubmissionPayload> for SubmissionRequest {
    fn from(payload: SubmissionPayload) -> Self {
        Self {
            user_name: Some(payload.user_name),
            evaluations: Some(payload.evaluations),
            scores: Some(payload.scores),
            categories: Some(payload.categories),
            project_selections: Some(payload.project_selections),
            project_options: Some(payload.project_options),
            total_request: Some(payload.total_request),
        }
    }
}

/// Which fields were present on a rejected submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedFields {
    pub user_name: bool,
    pub evaluations: bool,
    pub scores: bool,
    pub categories: bool,
    pub project_selections: bool,
    pub project_options: bool,
    pub total_request: bool,
}

impl ReceivedFields {
    pub fn is_complete(&self) -> bool {
        self.user_name
            && self.evaluations
            && self.scores
            && self.categories
            && self.project_selections
            && self.total_request
    }
}

/// Server side of the storage collaborator: re-validates and persists submissions.
pub struct SurveyIntakeService<R> {
    repository: Arc<R>,
    range: FundingRange,
}

const SUBMISSION_TAG_LEN: usize = 9;

static RESPONSE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_response_id() -> ResponseId {
    let id = RESPONSE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ResponseId(format!("resp-{id:06}"))
}

/// Short lowercase alphanumeric tag a reviewer can quote for their submission.
fn submission_tag() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUBMISSION_TAG_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

impl<R> SurveyIntakeService<R>
where
    R: ResponseRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            range: FundingRange::default(),
        }
    }

    pub fn with_range(mut self, range: FundingRange) -> Self {
        self.range = range;
        self
    }

    pub fn range(&self) -> FundingRange {
        self.range
    }

    /// Check presence and range, then persist the response.
    pub fn accept(
        &self,
        request: SubmissionRequest,
        user_agent: Option<String>,
    ) -> Result<ResponseRecord, IntakeError> {
        let received = request.received();
        debug!(?received, "survey submission received");

        let (
            Some(user_name),
            Some(evaluations),
            Some(scores),
            Some(categories),
            Some(project_selections),
            Some(total_request),
        ) = (
            request.user_name,
            request.evaluations,
            request.scores,
            request.categories,
            request.project_selections,
            request.total_request,
        )
        else {
            warn!(?received, "survey submission missing required fields");
            return Err(IntakeError::MissingFields(received));
        };
        if !received.is_complete() {
            warn!(?received, "survey submission missing required fields");
            return Err(IntakeError::MissingFields(received));
        }

        if let Err(err) = self.range.check(total_request) {
            warn!(total_request, "survey submission outside funding range");
            return Err(IntakeError::TotalOutOfRange(err));
        }

        let id = next_response_id();
        let received_at = Utc::now();
        let record = ResponseRecord {
            metadata: SubmissionMetadata {
                submission_id: submission_tag(),
                user_agent,
            },
            id,
            payload: SubmissionPayload {
                user_name: user_name.trim().to_string(),
                evaluations,
                scores,
                categories,
                project_selections,
                project_options: request.project_options.unwrap_or_default(),
                total_request,
                timestamp: received_at,
            },
            received_at,
        };

        let stored = self.repository.insert(record)?;
        if self.repository.fetch(&stored.id)?.is_none() {
            return Err(IntakeError::Repository(RepositoryError::NotFound));
        }

        info!(
            id = %stored.id.0,
            reviewer = %stored.payload.user_name,
            total_request = stored.payload.total_request,
            "survey response stored"
        );
        Ok(stored)
    }

    /// Stored responses, most recent first.
    pub fn responses(&self) -> Result<Vec<SubmissionSummary>, IntakeError> {
        let mut records = self.repository.all()?;
        records.sort_by(|a, b| {
            b.received_at
                .cmp(&a.received_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records.iter().map(ResponseRecord::summary).collect())
    }

    pub fn get(&self, id: &ResponseId) -> Result<ResponseRecord, IntakeError> {
        let record = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

impl<R> SubmissionStore for SurveyIntakeService<R>
where
    R: ResponseRepository + 'static,
{
    fn submit(&self, payload: SubmissionPayload) -> Result<SubmissionReceipt, StorageError> {
        self.accept(payload.into(), None)
            .map(|record| record.receipt())
            .map_err(StorageError::from)
    }

    fn list(&self) -> Result<Vec<SubmissionSummary>, StorageError> {
        self.responses().map_err(StorageError::from)
    }
}

/// Error raised by the intake service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("Missing required fields")]
    MissingFields(ReceivedFields),
    #[error(
        "Total request must be between {} and {}",
        format_dollars(.0.lower),
        format_dollars(.0.upper)
    )]
    TotalOutOfRange(RangeError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<IntakeError> for StorageError {
    fn from(value: IntakeError) -> Self {
        match value {
            IntakeError::Repository(RepositoryError::Unavailable(reason)) => {
                StorageError::Unavailable(reason)
            }
            other => StorageError::Rejected(other.to_string()),
        }
    }
}
