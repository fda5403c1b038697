//! AssessmentForm document schema
//!
//! A triggered+pending form is an outstanding manager request; submission
//! resolves it and overwrites the employee's User.status sub-record. Forms
//! are never deleted.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, Timestamped};

/// Collection name for assessment forms
pub const ASSESSMENT_FORM_COLLECTION: &str = "assessmentForms";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FormStatus {
    Pending,
    #[default]
    Submitted,
    Reviewed,
}

/// Assessment form document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentFormDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Employee this form describes
    pub employee: ObjectId,

    /// Who created the record: the employee on self-submission, the
    /// manager on a triggered broadcast
    pub submitted_by: ObjectId,

    /// 1-10; unset while a triggered form is still pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<i32>,

    #[serde(default)]
    pub physically_injured: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub injury_details: Option<String>,

    #[serde(default)]
    pub spouse_available: bool,

    /// 0-24; unset while a triggered form is still pending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_hours: Option<i32>,

    #[serde(default)]
    pub can_work_as_usual: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,

    /// Whether this instance was created by a manager broadcast
    #[serde(default)]
    pub triggered: bool,

    #[serde(default)]
    pub status: FormStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<ObjectId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,

    /// Set when a triggered form is resolved into submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl AssessmentFormDoc {
    /// A pending form created by a manager broadcast, awaiting submission
    pub fn triggered_pending(employee: ObjectId, manager: ObjectId) -> Self {
        Self {
            id: None,
            employee,
            submitted_by: manager,
            stress_level: None,
            physically_injured: false,
            injury_details: None,
            spouse_available: false,
            available_hours: None,
            can_work_as_usual: false,
            constraints: None,
            triggered: true,
            status: FormStatus::Pending,
            reviewed_by: None,
            review_notes: None,
            submitted_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl IntoIndexes for AssessmentFormDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "employee": 1, "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("employee_status_index".to_string())
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

impl Timestamped for AssessmentFormDoc {
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
    fn test_triggered_pending_shape() {
        let form = AssessmentFormDoc::triggered_pending(ObjectId::new(), ObjectId::new());
        assert!(form.triggered);
        assert_eq!(form.status, FormStatus::Pending);
        assert!(form.stress_level.is_none());
        assert!(form.submitted_at.is_none());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&FormStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&FormStatus::Submitted).unwrap(), "\"submitted\"");
    }
}
