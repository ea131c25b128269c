use super::common::*;
use crate::workflows::survey::domain::{Answer, Category, Evaluation, Rating};
use crate::workflows::survey::scoring::{self, CategoryCutoffs, ScoringEngine, ScoringVariant};

#[test]
fn categorize_boundaries_for_priorities_variant() {
    let cutoffs = ScoringVariant::lpc_priorities().cutoffs;
    assert_eq!(scoring::categorize(22, &cutoffs), Category::High);
    assert_eq!(scoring::categorize(21, &cutoffs), Category::Medium);
    assert_eq!(scoring::categorize(16, &cutoffs), Category::Medium);
    assert_eq!(scoring::categorize(15, &cutoffs), Category::Low);
    assert_eq!(scoring::categorize(0, &cutoffs), Category::Low);
}

#[test]
fn categorize_boundaries_for_core_variant() {
    let cutoffs = ScoringVariant::lpc_core().cutoffs;
    assert_eq!(scoring::categorize(15, &cutoffs), Category::High);
    assert_eq!(scoring::categorize(14, &cutoffs), Category::Medium);
    assert_eq!(scoring::categorize(11, &cutoffs), Category::Medium);
    assert_eq!(scoring::categorize(10, &cutoffs), Category::Low);
}

#[test]
fn core_variant_scores_three_strategies_four_goals_and_high_ratings_as_eighteen() {
    let variant = ScoringVariant::lpc_core();
    let mut evaluation = Evaluation::default();
    select_indices(&mut evaluation, &variant, "brockportStrategies", &[0, 1, 2]);
    select_indices(&mut evaluation, &variant, "stateGoals", &[0, 1, 2, 3]);
    for field in &variant.rating_fields {
        evaluation.set_rating(&field.key, Some(Rating::High));
    }

    let engine = ScoringEngine::new(variant);
    let score = engine.score(&evaluation);
    assert_eq!(score, 18);
    assert_eq!(engine.categorize(score), Category::High);
    assert_eq!(engine.variant().max_score(), 18);
}

#[test]
fn priorities_variant_maxes_out_at_twenty_seven() {
    let variant = ScoringVariant::lpc_priorities();
    let mut evaluation = complete_evaluation(&variant);
    select_indices(&mut evaluation, &variant, "brockportStrategies", &[1, 2]);
    select_indices(&mut evaluation, &variant, "stateGoals", &[1, 2, 3, 4]);

    assert_eq!(scoring::score(&evaluation, &variant), 27);
    assert_eq!(variant.max_score(), 27);
}

#[test]
fn recused_evaluation_scores_zero_whatever_else_is_filled() {
    let variant = ScoringVariant::lpc_priorities();
    let mut evaluation = complete_evaluation(&variant);
    evaluation.recused = true;

    let engine = ScoringEngine::new(variant);
    assert_eq!(engine.score(&evaluation), 0);

    let card = engine.score_card(&evaluation);
    assert!(card.recused);
    assert!(card.components.is_empty());
    assert_eq!(card.category, Category::Low);
}

#[test]
fn sentinel_contributes_nothing_and_excludes_other_options() {
    let variant = ScoringVariant::lpc_priorities();
    let strategies = variant
        .checklist("brockportStrategies")
        .expect("strategies checklist")
        .clone();

    let mut evaluation = Evaluation::default();
    select_indices(&mut evaluation, &variant, "brockportStrategies", &[0, 1, 2]);
    evaluation
        .toggle_checklist(&strategies, strategies.sentinel, true)
        .expect("sentinel toggles");

    let selected = evaluation
        .selected("brockportStrategies")
        .expect("group recorded");
    assert_eq!(selected.len(), 1);
    assert!(selected.contains(&strategies.sentinel));
    assert_eq!(scoring::score(&evaluation, &variant), 0);

    evaluation
        .toggle_checklist(&strategies, 1, true)
        .expect("option toggles");
    let selected = evaluation
        .selected("brockportStrategies")
        .expect("group recorded");
    assert!(!selected.contains(&strategies.sentinel));
    assert_eq!(selected.len(), 1);
    assert_eq!(scoring::score(&evaluation, &variant), 1);
}

#[test]
fn checklist_points_never_decrease_with_more_selections() {
    for variant in [ScoringVariant::lpc_priorities(), ScoringVariant::lpc_core()] {
        for group in &variant.checklist_groups {
            let mut previous = 0;
            for count in 0..group.options.len() {
                let points = group.points_for(count);
                assert!(
                    points >= previous,
                    "{} {} dropped from {previous} to {points} at {count}",
                    variant.name,
                    group.key
                );
                previous = points;
            }
            assert_eq!(group.points_for(group.options.len() - 1), group.max_points());
        }
    }
}

#[test]
fn priority_answers_score_yes_three_and_no_one() {
    let variant = ScoringVariant::lpc_priorities();
    let mut evaluation = complete_evaluation(&variant);
    let all_yes = scoring::score(&evaluation, &variant);

    evaluation.set_priority("createsHousing", Some(Answer::No));
    assert_eq!(scoring::score(&evaluation, &variant), all_yes - 2);

    evaluation.set_priority("createsHousing", None);
    assert_eq!(scoring::score(&evaluation, &variant), all_yes - 3);
}

#[test]
fn score_card_breaks_down_each_field() {
    let variant = ScoringVariant::lpc_priorities();
    let mut evaluation = complete_evaluation(&variant);
    evaluation.set_rating("projectReadiness", Some(Rating::Low));

    let card = ScoringEngine::new(variant.clone()).score_card(&evaluation);
    let expected_fields = variant.checklist_groups.len()
        + variant.rating_fields.len()
        + variant.priority_fields.len();
    assert_eq!(card.components.len(), expected_fields);
    assert_eq!(
        card.total,
        card.components.iter().map(|component| component.points).sum::<u32>()
    );

    let readiness = card
        .components
        .iter()
        .find(|component| component.field == "projectReadiness")
        .expect("readiness component");
    assert_eq!(readiness.points, 1);
    assert_eq!(readiness.notes, "rated Low");
}

#[test]
fn custom_cutoffs_are_respected() {
    let cutoffs = CategoryCutoffs { high: 10, medium: 5 };
    assert_eq!(scoring::categorize(10, &cutoffs), Category::High);
    assert_eq!(scoring::categorize(5, &cutoffs), Category::Medium);
    assert_eq!(scoring::categorize(4, &cutoffs), Category::Low);
}

#[test]
fn variant_rules_load_from_json_and_reject_bad_tables() {
    let raw = serde_json::to_string(&ScoringVariant::lpc_core()).expect("variant serializes");
    let loaded = ScoringVariant::from_json(&raw).expect("round-tripped rules validate");
    assert_eq!(loaded, ScoringVariant::lpc_core());

    let mut broken = ScoringVariant::lpc_core();
    broken.cutoffs = CategoryCutoffs { high: 5, medium: 9 };
    let raw = serde_json::to_string(&broken).expect("variant serializes");
    assert!(ScoringVariant::from_json(&raw).is_err());

    assert!(ScoringVariant::named("lpc-unknown").is_none());
}

#[test]
fn unknown_checklist_indices_score_nothing() {
    let variant = ScoringVariant::lpc_core();
    let engine = ScoringEngine::new(variant.clone());
    let mut evaluation = complete_evaluation(&variant);
    let baseline = engine.score(&evaluation);

    evaluation
        .checklists
        .get_mut("stateGoals")
        .expect("group present")
        .extend([99, 100]);
    assert_eq!(engine.score(&evaluation), baseline);
}

#[test]
fn checklist_without_options_scores_zero_instead_of_panicking() {
    let mut variant = ScoringVariant::lpc_core();
    variant.checklist_groups[0].options.clear();
    let engine = ScoringEngine::new(variant.clone());

    let card = engine.score_card(&Evaluation::default());
    let component = card
        .components
        .iter()
        .find(|component| component.field == variant.checklist_groups[0].key)
        .expect("group scored");
    assert_eq!(component.points, 0);
    assert_eq!(component.notes, "0 of 0 statements selected");
}
