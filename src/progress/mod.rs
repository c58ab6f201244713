//! Completion and grading statistics for a project's subtasks.

use serde::Serialize;

use crate::core::shared::models::{Subtask, SubtaskStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_subtasks: usize,
    pub completed_subtasks: usize,
    /// Whole percent, 0 to 100.
    pub progress_percentage: u32,
    /// Mean of the marks present, two decimals. 0 when nothing is graded.
    pub average_marks: f64,
    pub subtasks: Vec<Subtask>,
}

pub fn compute_progress(subtasks: &[Subtask]) -> ProgressSummary {
    let total = subtasks.len();
    let completed = subtasks
        .iter()
        .filter(|s| s.status == SubtaskStatus::Completed)
        .count();

    let marks: Vec<f64> = subtasks.iter().filter_map(|s| s.marks).collect();
    let average_marks = if marks.is_empty() {
        0.0
    } else {
        round2(mean(&marks))
    };

    ProgressSummary {
        total_subtasks: total,
        completed_subtasks: completed,
        progress_percentage: percentage(completed, total),
        average_marks,
        subtasks: subtasks.to_vec(),
    }
}

/// `round(100 * part / whole)` with halves rounded up, in integers.
fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u64;
    let whole = whole as u64;
    ((200 * part + whole) / (2 * whole)) as u32
}

/// Scales before summing so marks near `f64::MAX` cannot overflow to infinity.
fn mean(values: &[f64]) -> f64 {
    let count = values.len() as f64;
    values.iter().map(|v| v / count).sum::<f64>().min(f64::MAX)
}

fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        // Already a whole number at this magnitude.
        return value;
    }
    scaled.round() / 100.0
}
