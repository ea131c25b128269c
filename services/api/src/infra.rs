use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use lpc_survey::config::SurveyConfig;
use lpc_survey::error::AppError;
use lpc_survey::workflows::survey::{
    DraftError, DraftStore, ProjectCatalog, RepositoryError, ResponseId, ResponseRecord,
    ResponseRepository, ScoringVariant, SurveyDraft,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryResponseRepository {
    records: Arc<Mutex<BTreeMap<ResponseId, ResponseRecord>>>,
}

impl ResponseRepository for InMemoryResponseRepository {
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

/// Draft store for sessions that should leave nothing on disk.
#[derive(Default)]
pub(crate) struct InMemoryDraftStore {
    draft: Mutex<Option<SurveyDraft>>,
}

impl DraftStore for InMemoryDraftStore {
    fn save(&self, draft: &SurveyDraft) -> Result<(), DraftError> {
        *self.draft.lock().expect("draft mutex poisoned") = Some(draft.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SurveyDraft>, DraftError> {
        Ok(self.draft.lock().expect("draft mutex poisoned").clone())
    }

    fn clear(&self) -> Result<(), DraftError> {
        *self.draft.lock().expect("draft mutex poisoned") = None;
        Ok(())
    }
}

/// Resolve the project slate and scoring rules a deployment is configured for.
pub(crate) fn load_survey(
    config: &SurveyConfig,
) -> Result<(Arc<ProjectCatalog>, ScoringVariant), AppError> {
    let catalog = config.catalog()?;
    let variant = config.scoring_variant()?;
    Ok((Arc::new(catalog), variant))
}

pub(crate) fn parse_variant(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if ScoringVariant::named(name).is_some() {
        Ok(name.to_string())
    } else {
        Err(format!(
            "unknown variant '{name}' (expected one of: {})",
            ScoringVariant::NAMES.join(", ")
        ))
    }
}
