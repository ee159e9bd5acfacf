use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::category::ActionCategory;

/// Format used for the cached `display_time`.
const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Durable record of an action that reached the remote endpoint.
///
/// Serialized as `{ "id", "type", "syncedAt", "displayTime"? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub category: ActionCategory,
    /// Milliseconds since the Unix epoch.
    pub synced_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_time: Option<String>,
}

impl LogEntry {
    /// Creates an entry with a fresh id. The display time is rendered once,
    /// in local time, and frozen into the record.
    pub fn new(category: ActionCategory, synced_at: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category,
            synced_at,
            display_time: render_display_time(synced_at),
        }
    }

    /// Creates an entry stamped with the current time.
    pub fn now(category: ActionCategory) -> Self {
        Self::new(category, Utc::now().timestamp_millis())
    }

    /// The cached display time, or a fresh rendering for entries persisted
    /// without one.
    pub fn display_time(&self) -> String {
        self.display_time
            .clone()
            .or_else(|| render_display_time(self.synced_at))
            .unwrap_or_else(|| self.synced_at.to_string())
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6} {}", self.category.title(), self.display_time())
    }
}

fn render_display_time(millis: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format(DISPLAY_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_caches_display_time() {
        let entry = LogEntry::new(ActionCategory::Small, 1_700_000_000_000);

        assert_eq!(entry.category, ActionCategory::Small);
        assert_eq!(entry.synced_at, 1_700_000_000_000);
        assert!(entry.display_time.is_some());
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn test_entry_ids_are_independent() {
        let a = LogEntry::new(ActionCategory::Large, 1);
        let b = LogEntry::new(ActionCategory::Large, 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_deserializes_entry_without_display_time() {
        let json = r#"{"id":"1","type":"large","syncedAt":99999}"#;
        let entry: LogEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.id, "1");
        assert_eq!(entry.category, ActionCategory::Large);
        assert_eq!(entry.synced_at, 99999);
        assert!(entry.display_time.is_none());
        assert!(!entry.display_time().is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let entry = LogEntry {
            id: "abc".to_string(),
            category: ActionCategory::Small,
            synced_at: 12345,
            display_time: None,
        };
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["type"], "small");
        assert_eq!(value["syncedAt"], 12345);
        assert!(value.get("displayTime").is_none());
    }

    #[test]
    fn test_display_prefers_cached_time() {
        let entry = LogEntry {
            id: "x".to_string(),
            category: ActionCategory::Large,
            synced_at: 0,
            display_time: Some("frozen".to_string()),
        };
        let output = format!("{}", entry);
        assert!(output.starts_with("Large"));
        assert!(output.ends_with("frozen"));
    }
}
