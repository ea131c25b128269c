use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::submission::SubmissionPayload;

/// Identifier assigned by the response store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResponseId(pub String);

/// Acknowledgement returned once a submission has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: ResponseId,
    pub submission_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Read-only listing entry consumed by reporting tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: ResponseId,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
    pub total_request: u64,
    pub submitted_at: String,
}

/// Storage collaborator the wizard hands completed surveys to.
pub trait SubmissionStore: Send + Sync {
    fn submit(&self, payload: SubmissionPayload) -> Result<SubmissionReceipt, StorageError>;
    fn list(&self) -> Result<Vec<SubmissionSummary>, StorageError>;
}

/// Failure reported by a [`SubmissionStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Request metadata recorded next to each stored response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMetadata {
    pub submission_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Persisted survey response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub id: ResponseId,
    pub payload: SubmissionPayload,
    pub received_at: DateTime<Utc>,
    pub metadata: SubmissionMetadata,
}

impl ResponseRecord {
    pub fn receipt(&self) -> SubmissionReceipt {
        SubmissionReceipt {
            id: self.id.clone(),
            submission_id: self.metadata.submission_id.clone(),
            timestamp: self.received_at,
        }
    }

    pub fn summary(&self) -> SubmissionSummary {
        SubmissionSummary {
            id: self.id.clone(),
            user_name: self.payload.user_name.clone(),
            timestamp: self.received_at,
            total_request: self.payload.total_request,
            submitted_at: self
                .received_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Raw record storage behind the intake service.
pub trait ResponseRepository: Send + Sync {
    fn insert(&self, record: ResponseRecord) -> Result<ResponseRecord, RepositoryError>;
    fn fetch(&self, id: &ResponseId) -> Result<Option<ResponseRecord>, RepositoryError>;
    fn all(&self) -> Result<Vec<ResponseRecord>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
