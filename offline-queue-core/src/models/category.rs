use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of action categories. The category selects transport
/// parameters such as the per-attempt timeout and payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Small,
    Large,
}

impl ActionCategory {
    /// All categories, in display order.
    pub const ALL: [ActionCategory; 2] = [ActionCategory::Small, ActionCategory::Large];

    /// Category name with the first letter capitalised, for list output.
    pub fn title(&self) -> &'static str {
        match self {
            ActionCategory::Small => "Small",
            ActionCategory::Large => "Large",
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCategory::Small => write!(f, "small"),
            ActionCategory::Large => write!(f, "large"),
        }
    }
}

impl FromStr for ActionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(ActionCategory::Small),
            "large" => Ok(ActionCategory::Large),
            _ => Err(format!(
                "Invalid action category '{}'. Valid options: small, large",
                s
            )),
        }
    }
}
