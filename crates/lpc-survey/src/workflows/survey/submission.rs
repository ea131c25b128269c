use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Category, Evaluation, ProjectId};

/// Snapshot of a completed survey handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub user_name: String,
    pub evaluations: BTreeMap<ProjectId, Evaluation>,
    pub scores: BTreeMap<ProjectId, u32>,
    pub categories: BTreeMap<ProjectId, Category>,
    pub project_selections: BTreeMap<ProjectId, bool>,
    #[serde(default)]
    pub project_options: BTreeMap<ProjectId, String>,
    pub total_request: u64,
    pub timestamp: DateTime<Utc>,
}

/// Inputs gathered by the wizard at submit time.
#[derive(Debug, Clone)]
pub struct SubmissionParts {
    pub user_name: String,
    pub evaluations: BTreeMap<ProjectId, Evaluation>,
    pub scores: BTreeMap<ProjectId, u32>,
    pub categories: BTreeMap<ProjectId, Category>,
    pub selections: BTreeMap<ProjectId, bool>,
    pub options: BTreeMap<ProjectId, String>,
    pub total: u64,
}

/// Stamp the snapshot with the current time. Performs no validation.
pub fn build(parts: SubmissionParts) -> SubmissionPayload {
    build_at(parts, Utc::now())
}

pub fn build_at(parts: SubmissionParts, timestamp: DateTime<Utc>) -> SubmissionPayload {
    SubmissionPayload {
        user_name: parts.user_name.trim().to_string(),
        evaluations: parts.evaluations,
        scores: parts.scores,
        categories: parts.categories,
        project_selections: parts.selections,
        project_options: parts.options,
        total_request: parts.total,
        timestamp,
    }
}
