mod policy;
mod rules;
mod variant;

pub use variant::{
    CategoryCutoffs, ChecklistGroup, FieldSpec, ScoreStep, ScoringVariant, VariantError,
    DEFAULT_VARIANT,
};

use super::domain::{Category, Evaluation};
use serde::{Deserialize, Serialize};

/// Score for one evaluation under `variant`. Recused evaluations score 0.
pub fn score(evaluation: &Evaluation, variant: &ScoringVariant) -> u32 {
    rules::score_evaluation(evaluation, variant).1
}

pub fn categorize(score: u32, cutoffs: &CategoryCutoffs) -> Category {
    policy::categorize_score(score, cutoffs)
}

/// Stateless scorer bound to one rules table.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    variant: ScoringVariant,
}

impl ScoringEngine {
    pub fn new(variant: ScoringVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> &ScoringVariant {
        &self.variant
    }

    pub fn score(&self, evaluation: &Evaluation) -> u32 {
        score(evaluation, &self.variant)
    }

    pub fn categorize(&self, score: u32) -> Category {
        categorize(score, &self.variant.cutoffs)
    }

    pub fn score_card(&self, evaluation: &Evaluation) -> ScoreCard {
        let (components, total) = rules::score_evaluation(evaluation, &self.variant);
        ScoreCard {
            total,
            category: self.categorize(total),
            recused: evaluation.recused,
            components,
        }
    }
}

/// Points contributed by a single checklist, rating, or priority field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub field: String,
    pub points: u32,
    pub notes: String,
}

/// Score, category, and the per-field trail that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub total: u32,
    pub category: Category,
    pub recused: bool,
    pub components: Vec<ScoreComponent>,
}
