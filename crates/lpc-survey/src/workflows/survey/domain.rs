use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::scoring::ChecklistGroup;

/// Catalog identifier for a project on the slate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u32);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reviewer rating for a single criterion (Level of Impact, Project Readiness, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    Low,
    Medium,
    High,
}

impl Rating {
    pub const fn points(self) -> u32 {
        match self {
            Rating::Low => 1,
            Rating::Medium => 2,
            Rating::High => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Rating::Low => "Low",
            Rating::Medium => "Medium",
            Rating::High => "High",
        }
    }
}

/// Yes/No answer to a priority question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub const fn points(self) -> u32 {
        match self {
            Answer::Yes => 3,
            Answer::No => 1,
        }
    }
}

/// Qualitative bucket shown next to each project on the selection page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Low,
    Medium,
    High,
}

impl Category {
    pub const fn label(self) -> &'static str {
        match self {
            Category::Low => "Low",
            Category::Medium => "Medium",
            Category::High => "High",
        }
    }
}

/// One reviewer's answers for one project.
///
/// Rating and priority fields that are absent from their maps are unset. When `recused` is
/// true every other field is ignored by scoring and validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    #[serde(default)]
    pub checklists: BTreeMap<String, BTreeSet<usize>>,
    #[serde(default)]
    pub ratings: BTreeMap<String, Rating>,
    #[serde(default)]
    pub priorities: BTreeMap<String, Answer>,
    #[serde(default)]
    pub recused: bool,
}

impl Evaluation {
    pub fn selected(&self, group: &str) -> Option<&BTreeSet<usize>> {
        self.checklists.get(group)
    }

    pub fn rating(&self, field: &str) -> Option<Rating> {
        self.ratings.get(field).copied()
    }

    pub fn priority(&self, field: &str) -> Option<Answer> {
        self.priorities.get(field).copied()
    }

    /// Check or uncheck one option of a checklist group.
    ///
    /// The sentinel ("does not align") and the remaining options are mutually exclusive:
    /// checking the sentinel leaves it as the only selection, checking any other option
    /// drops the sentinel.
    pub fn toggle_checklist(
        &mut self,
        group: &ChecklistGroup,
        index: usize,
        checked: bool,
    ) -> Result<(), ChecklistIndexError> {
        if index >= group.options.len() {
            return Err(ChecklistIndexError {
                group: group.key.clone(),
                index,
                options: group.options.len(),
            });
        }

        let selected = self.checklists.entry(group.key.clone()).or_default();
        if index == group.sentinel {
            selected.clear();
            if checked {
                selected.insert(index);
            }
        } else if checked {
            selected.remove(&group.sentinel);
            selected.insert(index);
        } else {
            selected.remove(&index);
        }

        Ok(())
    }

    pub fn set_rating(&mut self, field: &str, value: Option<Rating>) {
        match value {
            Some(rating) => {
                self.ratings.insert(field.to_string(), rating);
            }
            None => {
                self.ratings.remove(field);
            }
        }
    }

    pub fn set_priority(&mut self, field: &str, value: Option<Answer>) {
        match value {
            Some(answer) => {
                self.priorities.insert(field.to_string(), answer);
            }
            None => {
                self.priorities.remove(field);
            }
        }
    }
}

/// Value accepted by `setEvaluationField`; `None` resets the field to unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Rating(Option<Rating>),
    Priority(Option<Answer>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("option {index} does not exist in checklist '{group}' ({options} options)")]
pub struct ChecklistIndexError {
    pub group: String,
    pub index: usize,
    pub options: usize,
}
