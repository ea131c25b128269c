//! Project evaluation survey: catalog, scoring rules, reviewer wizard and submission intake.
//!
//! The pure pieces (scoring, validation, selection totals, payload assembly) are plain
//! functions over the catalog and a [`ScoringVariant`] rules table. [`SurveyWizard`]
//! sequences them for one reviewer, and [`SurveyIntakeService`] re-checks what reaches
//! storage before it is persisted.

pub mod catalog;
pub mod domain;
pub mod draft;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod selection;
pub mod service;
pub mod submission;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, FundingOption, Project, ProjectCatalog};
pub use domain::{
    Answer, Category, ChecklistIndexError, Evaluation, FieldValue, ProjectId, Rating,
};
pub use draft::{DraftError, DraftStore, FileDraftStore, SurveyDraft};
pub use repository::{
    RepositoryError, ResponseId, ResponseRecord, ResponseRepository, StorageError,
    SubmissionMetadata, SubmissionReceipt, SubmissionStore, SubmissionSummary,
};
pub use router::{survey_router, SurveyApi};
pub use scoring::{
    CategoryCutoffs, ChecklistGroup, FieldSpec, ScoreCard, ScoreComponent, ScoreStep,
    ScoringEngine, ScoringVariant, VariantError, DEFAULT_VARIANT,
};
pub use selection::{FundingRange, RangeError, RangeStatus, SelectionState};
pub use service::{IntakeError, ReceivedFields, SubmissionRequest, SurveyIntakeService};
pub use submission::{SubmissionParts, SubmissionPayload};
pub use validation::ValidationErrors;
pub use wizard::{ConfirmationPrompt, SurveyWizard, Transition, WizardError, WizardStep, WizardView};
