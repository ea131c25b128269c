use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Evaluation, ProjectId};

/// Best-effort backup of an unfinished survey. Selections are deliberately not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDraft {
    pub user_name: String,
    pub evaluations: BTreeMap<ProjectId, Evaluation>,
    pub saved_at: DateTime<Utc>,
}

/// Local backup capability injected into the wizard.
pub trait DraftStore: Send + Sync {
    fn save(&self, draft: &SurveyDraft) -> Result<(), DraftError>;
    fn load(&self) -> Result<Option<SurveyDraft>, DraftError>;
    fn clear(&self) -> Result<(), DraftError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("draft storage failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("draft is unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// JSON file per session under a drafts directory.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn new<P: AsRef<Path>>(dir: P, session: &str) -> Self {
        let session: String = session
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        Self {
            path: dir.as_ref().join(format!("lpc-survey-{session}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileDraftStore {
    fn save(&self, draft: &SurveyDraft) -> Result<(), DraftError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(draft)?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<SurveyDraft>, DraftError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn clear(&self) -> Result<(), DraftError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
