use super::super::domain::Category;
use super::variant::CategoryCutoffs;

pub(crate) fn categorize_score(score: u32, cutoffs: &CategoryCutoffs) -> Category {
    if score >= cutoffs.high {
        Category::High
    } else if score >= cutoffs.medium {
        Category::Medium
    } else {
        Category::Low
    }
}
