//! Task document schema
//!
//! A task carries three embedded logs: comments, notes, and the append-only
//! per-field history. History entries are only ever appended, never mutated
//! or reordered; the update path in routes::tasks appends one entry per
//! changed field.

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::mongo::{IntoIndexes, Timestamped};

/// Collection name for tasks
pub const TASK_COLLECTION: &str = "tasks";

/// Task lifecycle status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Assigned,
    InProgress,
    Completed,
    Transferred,
    Cancelled,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Completed => "completed",
            TaskStatus::Transferred => "transferred",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Task priority; doubles as EmergencyTask criticality
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Blocks,
    BlockedBy,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub task: ObjectId,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub text: String,
    pub author: ObjectId,
    pub created_at: DateTime,
}

/// One immutable audit record of a single field change
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub field: String,
    pub old_value: Bson,
    pub new_value: Bson,
    pub updated_by: ObjectId,
    pub updated_at: DateTime,
}

/// Uploaded attachment reference on a note
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NoteFile {
    /// Generated name under the upload directory
    pub stored_name: String,
    /// Client-provided name, used for Content-Disposition and MIME lookup
    pub original_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Stable id so notes can be deleted individually
    pub id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<NoteFile>,
    pub created_by: ObjectId,
    pub created_at: DateTime,
}

/// Task document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: Priority,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<ObjectId>,

    pub created_by: ObjectId,

    pub department: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Append-only audit log; one entry per changed field per update
    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    #[serde(default)]
    pub notes: Vec<Note>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl IntoIndexes for TaskDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "assignedTo": 1 },
                Some(
                    IndexOptions::builder()
                        .name("assigned_to_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "department": 1, "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("department_status_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "createdAt": -1 },
                Some(
                    IndexOptions::builder()
                        .name("created_at_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl Timestamped for TaskDoc {
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
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"inProgress\"");
        assert_eq!(serde_json::to_string(&TaskStatus::Pending).unwrap(), "\"pending\"");
        let parsed: TaskStatus = serde_json::from_str("\"transferred\"").unwrap();
        assert_eq!(parsed, TaskStatus::Transferred);
    }

    #[test]
    fn test_priority_wire_format() {
        assert_eq!(serde_json::to_string(&Priority::Critical).unwrap(), "\"critical\"");
        let parsed: Priority = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Priority::Medium);
    }

    #[test]
    fn test_dependency_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&DependencyKind::BlockedBy).unwrap(),
            "\"blocked_by\""
        );
    }

    #[test]
    fn test_new_task_has_empty_logs() {
        let task = TaskDoc {
            title: "Deliver food".into(),
            department: "family".into(),
            created_by: ObjectId::new(),
            ..Default::default()
        };
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.history.is_empty());
        assert!(task.comments.is_empty());
        assert!(task.notes.is_empty());
        assert!(task.assigned_to.is_none());
    }
}
