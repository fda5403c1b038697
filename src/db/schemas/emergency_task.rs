//! EmergencyTask document schema
//!
//! Catalog tasks are seeded once (see engine::catalog) and never created by
//! users. Visibility and assignability are gated on `is_active`, which the
//! emergency controller flips globally.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, Timestamped};
use crate::db::schemas::task::{HistoryEntry, Note, Priority};

/// Collection name for emergency tasks
pub const EMERGENCY_TASK_COLLECTION: &str = "emergencyTasks";

/// Narrower status set than TaskStatus: no transferred/cancelled
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum EmergencyTaskStatus {
    #[default]
    Pending,
    Assigned,
    InProgress,
    Completed,
}

/// Emergency task document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyTaskDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub title: String,

    pub description: String,

    /// Plays the role of Task.priority
    pub criticality: Priority,

    #[serde(default)]
    pub status: EmergencyTaskStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<ObjectId>,

    pub department: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default)]
    pub required_skills: Vec<String>,

    /// Estimated duration in minutes
    pub estimated_time: i32,

    #[serde(default)]
    pub notes: Vec<Note>,

    /// Append-only audit log; one entry per changed field per update
    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    /// True only while emergency mode is active
    #[serde(default)]
    pub is_active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl IntoIndexes for EmergencyTaskDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "isActive": 1 },
                Some(
                    IndexOptions::builder()
                        .name("is_active_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "assignedTo": 1 },
                Some(
                    IndexOptions::builder()
                        .name("assigned_to_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl Timestamped for EmergencyTaskDoc {
    fn stamp_created(&mut self, now: DateTime) {
        self.created_at = Some(now);
    }

    fn stamp_updated(&mut self, now: DateTime) {
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&EmergencyTaskStatus::InProgress).unwrap(),
            "\"inProgress\""
        );
        // transferred is not part of the emergency status set
        assert!(serde_json::from_str::<EmergencyTaskStatus>("\"transferred\"").is_err());
    }

    #[test]
    fn test_seeded_task_starts_inactive() {
        let task = EmergencyTaskDoc {
            title: "t".into(),
            description: "d".into(),
            criticality: Priority::High,
            department: "family".into(),
            estimated_time: 120,
            ..Default::default()
        };
        assert!(!task.is_active);
        assert_eq!(task.status, EmergencyTaskStatus::Pending);
        assert!(task.assigned_to.is_none());
    }
}
