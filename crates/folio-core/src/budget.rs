//! Copy-protection budget
//!
//! A reader may copy only a share of a book's text. The budget is derived
//! from three numbers: the book's total character count, the characters
//! copied so far, and the allowed percentage. With no known total there is
//! nothing to take a percentage of, so copying is refused.

use serde::Serialize;

/// Derived copy-protection state for one book
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyBudget {
    pub total_chars: Option<u64>,
    pub copied_chars: u64,
    pub allowance_percentage: f64,
}

impl CopyBudget {
    pub fn new(total_chars: Option<u64>, copied_chars: u64, allowance_percentage: f64) -> Self {
        Self {
            total_chars,
            copied_chars,
            allowance_percentage: allowance_percentage.clamp(0.0, 100.0),
        }
    }

    /// `copied / total * 100`, when the total is known and non-zero
    pub fn copied_percentage(&self) -> Option<f64> {
        match self.total_chars {
            Some(total) if total > 0 => Some(self.copied_chars as f64 / total as f64 * 100.0),
            _ => None,
        }
    }

    /// Characters the allowance covers in total
    pub fn allowed_chars(&self) -> Option<u64> {
        self.total_chars
            .map(|total| (total as f64 * self.allowance_percentage / 100.0).floor() as u64)
    }

    /// Characters still available to copy
    pub fn remaining_chars(&self) -> Option<u64> {
        self.allowed_chars()
            .map(|allowed| allowed.saturating_sub(self.copied_chars))
    }

    pub fn can_copy(&self, chars: u64) -> bool {
        self.remaining_chars()
            .is_some_and(|remaining| chars <= remaining)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_chars().map_or(true, |remaining| remaining == 0)
    }

    /// The budget after `chars` more characters have been copied
    pub fn after_copy(&self, chars: u64) -> Self {
        Self {
            copied_chars: self.copied_chars.saturating_add(chars),
            ..*self
        }
    }
}

/// Result of asking to copy a passage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CopyOutcome {
    /// Copy allowed; the counter was advanced
    Recorded(CopyBudget),
    /// Copy refused; nothing changed
    Denied(CopyBudget),
}

impl CopyOutcome {
    pub fn budget(&self) -> &CopyBudget {
        match self {
            CopyOutcome::Recorded(budget) | CopyOutcome::Denied(budget) => budget,
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, CopyOutcome::Recorded(_))
    }
}
