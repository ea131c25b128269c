use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_VARIANT: &str = "lpc-priorities";

/// Declarative rules table for one deployment of the survey.
///
/// Scoring and validation are pure functions of an evaluation and this table, so both
/// observed deployments share the same code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringVariant {
    pub name: String,
    pub checklist_groups: Vec<ChecklistGroup>,
    pub rating_fields: Vec<FieldSpec>,
    #[serde(default)]
    pub priority_fields: Vec<FieldSpec>,
    pub cutoffs: CategoryCutoffs,
}

/// Checklist of alignment statements with a trailing "does not align" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistGroup {
    pub key: String,
    pub label: String,
    pub options: Vec<String>,
    pub sentinel: usize,
    /// Ascending by `min_selected`; points never decrease along the table.
    pub steps: Vec<ScoreStep>,
}

impl ChecklistGroup {
    /// Points awarded for `count` non-sentinel selections.
    pub fn points_for(&self, count: usize) -> u32 {
        self.steps
            .iter()
            .rev()
            .find(|step| count >= step.min_selected)
            .map(|step| step.points)
            .unwrap_or(0)
    }

    pub fn max_points(&self) -> u32 {
        self.steps.iter().map(|step| step.points).max().unwrap_or(0)
    }

    /// Options other than the sentinel.
    pub fn statement_count(&self) -> usize {
        self.options.len().saturating_sub(1)
    }

    /// Selected indices that name an option of this group; anything else is ignored.
    pub fn known_selections<'a>(
        &'a self,
        selected: &'a BTreeSet<usize>,
    ) -> impl Iterator<Item = usize> + 'a {
        selected
            .iter()
            .copied()
            .filter(move |&index| index < self.options.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreStep {
    pub min_selected: usize,
    pub points: u32,
}

/// Named rating or priority question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// Minimum scores for the High and Medium categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCutoffs {
    pub high: u32,
    pub medium: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum VariantError {
    #[error("unknown survey variant '{0}'")]
    Unknown(String),
    #[error("failed to read variant rules: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed variant rules: {0}")]
    Json(#[from] serde_json::Error),
    #[error("variant field '{0}' is defined more than once")]
    DuplicateField(String),
    #[error("checklist '{group}' has no options")]
    EmptyChecklist { group: String },
    #[error("checklist '{group}' sentinel {sentinel} is outside its {options} options")]
    SentinelOutOfRange {
        group: String,
        sentinel: usize,
        options: usize,
    },
    #[error("checklist '{group}' step table must ascend in selections without losing points")]
    NonMonotonicSteps { group: String },
    #[error("medium cutoff {medium} must be below high cutoff {high}")]
    Cutoffs { high: u32, medium: u32 },
}

impl ScoringVariant {
    pub const NAMES: [&'static str; 2] = ["lpc-priorities", "lpc-core"];

    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lpc-priorities" => Some(Self::lpc_priorities()),
            "lpc-core" => Some(Self::lpc_core()),
            _ => None,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, VariantError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, VariantError> {
        let variant: ScoringVariant = serde_json::from_str(raw)?;
        variant.validate()?;
        Ok(variant)
    }

    /// Two checklists, four ratings, and three Yes/No priority questions.
    pub fn lpc_priorities() -> Self {
        Self {
            name: "lpc-priorities".to_string(),
            checklist_groups: vec![
                ChecklistGroup {
                    key: "brockportStrategies".to_string(),
                    label: "Brockport Strategies".to_string(),
                    options: strategy_statements(),
                    sentinel: 4,
                    steps: steps(&[(1, 1), (2, 2), (3, 3)]),
                },
                ChecklistGroup {
                    key: "stateGoals".to_string(),
                    label: "NY Forward Goals".to_string(),
                    options: state_goal_statements(7),
                    sentinel: 7,
                    steps: steps(&[(1, 1), (3, 2), (5, 3)]),
                },
            ],
            rating_fields: rating_fields(),
            priority_fields: vec![
                field(
                    "enhancesAccessibility",
                    "ADA Accessibility",
                    "This project enhances ADA accessibility to downtown businesses, buildings, or public spaces.",
                ),
                field(
                    "createsHousing",
                    "Housing Options",
                    "This project creates quality and/or diverse housing options in the village.",
                ),
                field(
                    "providesCommunityBenefits",
                    "Community Benefits",
                    "This project provides services or benefits to the broader Brockport community.",
                ),
            ],
            cutoffs: CategoryCutoffs {
                high: 22,
                medium: 16,
            },
        }
    }

    /// Smaller goals checklist and no priority questions.
    pub fn lpc_core() -> Self {
        Self {
            name: "lpc-core".to_string(),
            checklist_groups: vec![
                ChecklistGroup {
                    key: "brockportStrategies".to_string(),
                    label: "Brockport Strategies".to_string(),
                    options: strategy_statements(),
                    sentinel: 4,
                    steps: steps(&[(1, 1), (2, 2), (3, 3)]),
                },
                ChecklistGroup {
                    key: "stateGoals".to_string(),
                    label: "NY Forward Goals".to_string(),
                    options: state_goal_statements(6),
                    sentinel: 6,
                    steps: steps(&[(1, 1), (2, 2), (4, 3)]),
                },
            ],
            rating_fields: rating_fields(),
            priority_fields: Vec::new(),
            cutoffs: CategoryCutoffs {
                high: 15,
                medium: 11,
            },
        }
    }

    pub fn checklist(&self, key: &str) -> Option<&ChecklistGroup> {
        self.checklist_groups.iter().find(|group| group.key == key)
    }

    pub fn rating_field(&self, key: &str) -> Option<&FieldSpec> {
        self.rating_fields.iter().find(|field| field.key == key)
    }

    pub fn priority_field(&self, key: &str) -> Option<&FieldSpec> {
        self.priority_fields.iter().find(|field| field.key == key)
    }

    /// Highest score an evaluation can reach under this table.
    pub fn max_score(&self) -> u32 {
        let checklists: u32 = self
            .checklist_groups
            .iter()
            .map(ChecklistGroup::max_points)
            .sum();
        checklists + 3 * (self.rating_fields.len() + self.priority_fields.len()) as u32
    }

    pub fn validate(&self) -> Result<(), VariantError> {
        let mut keys = BTreeSet::new();
        let all_keys = self
            .checklist_groups
            .iter()
            .map(|group| &group.key)
            .chain(self.rating_fields.iter().map(|field| &field.key))
            .chain(self.priority_fields.iter().map(|field| &field.key));
        for key in all_keys {
            if !keys.insert(key.as_str()) {
                return Err(VariantError::DuplicateField(key.clone()));
            }
        }

        for group in &self.checklist_groups {
            if group.options.is_empty() {
                return Err(VariantError::EmptyChecklist {
                    group: group.key.clone(),
                });
            }
            if group.sentinel >= group.options.len() {
                return Err(VariantError::SentinelOutOfRange {
                    group: group.key.clone(),
                    sentinel: group.sentinel,
                    options: group.options.len(),
                });
            }
            let ascending = group.steps.windows(2).all(|pair| {
                pair[0].min_selected < pair[1].min_selected && pair[0].points <= pair[1].points
            });
            let starts_above_zero = group.steps.first().map_or(true, |step| step.min_selected > 0);
            if !ascending || !starts_above_zero {
                return Err(VariantError::NonMonotonicSteps {
                    group: group.key.clone(),
                });
            }
        }

        if self.cutoffs.medium >= self.cutoffs.high {
            return Err(VariantError::Cutoffs {
                high: self.cutoffs.high,
                medium: self.cutoffs.medium,
            });
        }

        Ok(())
    }
}

impl Default for ScoringVariant {
    fn default() -> Self {
        Self::lpc_priorities()
    }
}

fn steps(table: &[(usize, u32)]) -> Vec<ScoreStep> {
    table
        .iter()
        .map(|&(min_selected, points)| ScoreStep {
            min_selected,
            points,
        })
        .collect()
}

fn field(key: &str, label: &str, description: &str) -> FieldSpec {
    FieldSpec {
        key: key.to_string(),
        label: label.to_string(),
        description: description.to_string(),
    }
}

fn rating_fields() -> Vec<FieldSpec> {
    vec![
        field(
            "levelOfImpact",
            "Level of Impact",
            "This project will have a significant positive impact on downtown Brockport and could spur additional investment.",
        ),
        field(
            "projectReadiness",
            "Project Readiness",
            "This project is well-developed and can be ready to break ground in a timely manner.",
        ),
        field(
            "costEffectiveness",
            "Cost-Effectiveness",
            "This project is a good use of public funds and the budget is reasonable.",
        ),
        field(
            "benefitsToComm",
            "Benefits to the Community",
            "This project will result in benefits to the broader community, beyond just the project sponsor.",
        ),
    ]
}

fn strategy_statements() -> Vec<String> {
    [
        "This project leverages our identity as a canal community and the pilot Empire State Trail Town.",
        "This project improves accessibility, walkability, and multimodal access, positioning Brockport as the premier inclusive waterfront community along the Erie Canal.",
        "This project supports the development of diverse, affordable, and accessible housing options on Main Street and near the Erie Canal.",
        "This project reinforces Brockport's unique sense of place and Victorian character, creating an inviting downtown where people can connect and feel at home.",
        "This project does NOT align with any of the above strategies.",
    ]
    .iter()
    .map(|statement| statement.to_string())
    .collect()
}

/// The first `goals` state goals followed by the sentinel statement.
fn state_goal_statements(goals: usize) -> Vec<String> {
    const GOALS: [&str; 7] = [
        "This project creates an active downtown with a strong sense of place.",
        "This project provides amenities that support and enhance downtown living and quality of life.",
        "This project attracts new businesses that create a robust mix of shopping, entertainment, and service options for residents and visitors, and that provide job opportunities for a variety of skills and salaries.",
        "This project enhances public spaces for arts and cultural events that serve the existing members of the community but also draw in visitors from around the region.",
        "This project builds a diverse population, with residents and workers supported by complementary varied housing and employment opportunities.",
        "This project reduces greenhouse gas emissions and supports investments that are more resilient to future climate change impacts.",
        "This project grows the local property tax base.",
    ];

    GOALS
        .iter()
        .take(goals)
        .map(|goal| goal.to_string())
        .chain(std::iter::once(
            "This project does NOT align with any of the above goals.".to_string(),
        ))
        .collect()
}
