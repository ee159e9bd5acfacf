use std::collections::BTreeMap;
use std::fmt;

use crate::models::{ActionCategory, QueuedAction};

/// Number of actions submitted but not yet terminal, in total and per
/// category. Every category is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCounts {
    pub total: usize,
    pub per_category: BTreeMap<ActionCategory, usize>,
}

impl PendingCounts {
    pub fn from_actions<'a>(actions: impl IntoIterator<Item = &'a QueuedAction>) -> Self {
        let mut counts = Self::default();
        for action in actions {
            if action.status.is_terminal() {
                continue;
            }
            counts.total += 1;
            *counts.per_category.entry(action.category).or_insert(0) += 1;
        }
        counts
    }

    pub fn get(&self, category: ActionCategory) -> usize {
        self.per_category.get(&category).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl Default for PendingCounts {
    fn default() -> Self {
        Self {
            total: 0,
            per_category: ActionCategory::ALL.iter().map(|c| (*c, 0)).collect(),
        }
    }
}

impl fmt::Display for PendingCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pending", self.total)?;
        let parts: Vec<String> = self
            .per_category
            .iter()
            .map(|(category, n)| format!("{}: {}", category, n))
            .collect();
        write!(f, " ({})", parts.join(", "))
    }
}
