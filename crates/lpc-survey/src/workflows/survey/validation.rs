use std::collections::{BTreeMap, BTreeSet};

use super::domain::Evaluation;
use super::scoring::ScoringVariant;

/// Field-keyed messages for every required field still missing.
pub type ValidationErrors = BTreeMap<String, String>;

/// Keys of required fields that are still unanswered. Empty when recused.
pub fn find_missing_fields(evaluation: &Evaluation, variant: &ScoringVariant) -> BTreeSet<String> {
    validation_errors(evaluation, variant).into_keys().collect()
}

pub fn is_complete(evaluation: &Evaluation, variant: &ScoringVariant) -> bool {
    find_missing_fields(evaluation, variant).is_empty()
}

pub fn validation_errors(evaluation: &Evaluation, variant: &ScoringVariant) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if evaluation.recused {
        return errors;
    }

    for group in &variant.checklist_groups {
        let empty = evaluation
            .selected(&group.key)
            .map_or(true, |selected| group.known_selections(selected).next().is_none());
        if empty {
            errors.insert(
                group.key.clone(),
                "Please select at least one of the following options".to_string(),
            );
        }
    }

    for field in &variant.rating_fields {
        if evaluation.rating(&field.key).is_none() {
            errors.insert(
                field.key.clone(),
                format!("Please select a rating for {}", field.label),
            );
        }
    }

    for field in &variant.priority_fields {
        if evaluation.priority(&field.key).is_none() {
            errors.insert(
                field.key.clone(),
                format!("Please select Yes or No for {}", field.label),
            );
        }
    }

    errors
}
