use super::super::domain::Evaluation;
use super::variant::ScoringVariant;
use super::ScoreComponent;

pub(crate) fn score_evaluation(
    evaluation: &Evaluation,
    variant: &ScoringVariant,
) -> (Vec<ScoreComponent>, u32) {
    if evaluation.recused {
        return (Vec::new(), 0);
    }

    let mut components = Vec::new();
    let mut total = 0;

    for group in &variant.checklist_groups {
        let selected = evaluation.selected(&group.key);
        let sentinel_checked = selected.map_or(false, |set| {
            group.known_selections(set).any(|index| index == group.sentinel)
        });

        let (points, notes) = if sentinel_checked {
            (0, format!("does not align with any {}", group.label))
        } else {
            let count = selected.map_or(0, |set| {
                group
                    .known_selections(set)
                    .filter(|&index| index != group.sentinel)
                    .count()
            });
            (
                group.points_for(count),
                format!("{count} of {} statements selected", group.statement_count()),
            )
        };

        components.push(ScoreComponent {
            field: group.key.clone(),
            points,
            notes,
        });
        total += points;
    }

    for field in &variant.rating_fields {
        let (points, notes) = match evaluation.rating(&field.key) {
            Some(rating) => (rating.points(), format!("rated {}", rating.label())),
            None => (0, "not rated".to_string()),
        };
        components.push(ScoreComponent {
            field: field.key.clone(),
            points,
            notes,
        });
        total += points;
    }

    for field in &variant.priority_fields {
        let (points, notes) = match evaluation.priority(&field.key) {
            Some(answer) => (answer.points(), format!("answered {answer:?}")),
            None => (0, "not answered".to_string()),
        };
        components.push(ScoreComponent {
            field: field.key.clone(),
            points,
            notes,
        });
        total += points;
    }

    (components, total)
}
