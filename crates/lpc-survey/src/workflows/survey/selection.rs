use std::borrow::Borrow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalog::ProjectCatalog;
use super::domain::{Evaluation, ProjectId};

pub const FUNDING_FLOOR: u64 = 6_000_000;
pub const FUNDING_CEILING: u64 = 8_000_000;

/// "Fund this project" flags plus the chosen option for multi-option projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(rename = "projectSelections")]
    pub selections: BTreeMap<ProjectId, bool>,
    #[serde(rename = "projectOptions")]
    pub options: BTreeMap<ProjectId, String>,
}

impl SelectionState {
    pub fn is_selected(&self, id: ProjectId) -> bool {
        self.selections.get(&id).copied().unwrap_or(false)
    }

    pub fn option(&self, id: ProjectId) -> Option<&str> {
        self.options.get(&id).map(String::as_str)
    }

    pub fn set_selected(&mut self, id: ProjectId, selected: bool) {
        self.selections.insert(id, selected);
    }

    /// Records `key` as the only option for `id`, replacing any earlier choice.
    pub fn set_option(&mut self, id: ProjectId, key: &str) {
        self.options.insert(id, key.to_string());
    }

    pub fn clear(&mut self, id: ProjectId) {
        self.selections.remove(&id);
        self.options.remove(&id);
    }
}

/// Sum of funding requests for selected, non-recused projects.
///
/// Multi-option projects count the recorded option's request and are left out when no
/// option is recorded. Selections on recused projects are ignored.
pub fn total(
    selection: &SelectionState,
    evaluations: &BTreeMap<ProjectId, Evaluation>,
    catalog: &ProjectCatalog,
) -> u64 {
    selection
        .selections
        .iter()
        .filter(|&(_, &selected)| selected)
        .filter(|&(id, _)| {
            !evaluations
                .get(id)
                .map_or(false, |evaluation| evaluation.recused)
        })
        .filter_map(|(id, _)| {
            let project = catalog.get(*id)?;
            if project.has_options() {
                let key = selection.option(*id)?;
                project.option(key).map(|option| option.funding_request)
            } else {
                Some(project.funding_request)
            }
        })
        .sum()
}

/// `$1,234,567` style rendering used in range messages.
pub fn format_dollars<A: Borrow<u64>>(amount: A) -> String {
    let digits = amount.borrow().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Inclusive funding window a submission total must land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRange {
    pub lower: u64,
    pub upper: u64,
}

impl Default for FundingRange {
    fn default() -> Self {
        Self {
            lower: FUNDING_FLOOR,
            upper: FUNDING_CEILING,
        }
    }
}

impl FundingRange {
    pub fn contains(&self, total: u64) -> bool {
        (self.lower..=self.upper).contains(&total)
    }

    pub fn classify(&self, total: u64) -> RangeStatus {
        if total == 0 {
            RangeStatus::Empty
        } else if total < self.lower {
            RangeStatus::Below {
                shortfall: self.lower - total,
            }
        } else if total > self.upper {
            RangeStatus::Above {
                excess: total - self.upper,
            }
        } else {
            RangeStatus::Within
        }
    }

    /// `Ok(())` when `total` may be submitted.
    pub fn check(&self, total: u64) -> Result<(), RangeError> {
        if self.contains(total) {
            Ok(())
        } else {
            Err(RangeError {
                total,
                lower: self.lower,
                upper: self.upper,
                status: self.classify(total),
            })
        }
    }
}

/// Position of a total relative to the funding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RangeStatus {
    Empty,
    Below { shortfall: u64 },
    Within,
    Above { excess: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error(
    "total request {} must be between {} and {}",
    format_dollars(.total),
    format_dollars(.lower),
    format_dollars(.upper)
)]
pub struct RangeError {
    pub total: u64,
    pub lower: u64,
    pub upper: u64,
    pub status: RangeStatus,
}
