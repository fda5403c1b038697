//! User document schema
//!
//! Stores credentials, contact info, and the self-reported status
//! sub-record that assessment submissions overwrite.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::db::mongo::{IntoIndexes, Timestamped};

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    /// Unique login identifier
    pub email: String,

    /// Argon2 password hash; never serialized into API responses
    pub password_hash: String,

    #[serde(default)]
    pub role: Role,

    pub department: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,

    /// Self-reported availability; always present with defaults
    #[serde(default)]
    pub status: UserStatus,

    #[serde(default)]
    pub preferences: Preferences,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

/// Self-reported availability snapshot, overwritten by form submissions
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<i32>,

    #[serde(default)]
    pub physically_injured: bool,

    #[serde(default)]
    pub spouse_available: bool,

    #[serde(default)]
    pub available_hours: i32,

    #[serde(default = "default_true")]
    pub can_work_as_usual: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime>,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self {
            stress_level: None,
            physically_injured: false,
            spouse_available: false,
            available_hours: 0,
            can_work_as_usual: true,
            current_location: None,
            last_updated: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: default_language(),
            notifications: true,
        }
    }
}

fn default_language() -> String {
    "he".to_string()
}

fn default_true() -> bool {
    true
}

/// Minimal user projection attached to resolved task references
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
}

impl UserDoc {
    /// Create a new user with default status and preferences
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        role: Role,
        department: String,
        phone_number: Option<String>,
    ) -> Self {
        Self {
            id: None,
            name,
            email,
            password_hash,
            role,
            department,
            phone_number,
            emergency_contact: None,
            status: UserStatus::default(),
            preferences: Preferences::default(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Minimal projection for embedding in task responses
    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: self.name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "role": 1 },
                Some(IndexOptions::builder().name("role_index".to_string()).build()),
            ),
        ]
    }
}

impl Timestamped for UserDoc {
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
    fn test_status_defaults() {
        let status = UserStatus::default();
        assert!(status.can_work_as_usual);
        assert!(!status.physically_injured);
        assert!(!status.spouse_available);
        assert_eq!(status.available_hours, 0);
        assert!(status.stress_level.is_none());
    }

    #[test]
    fn test_wire_field_names() {
        let user = UserDoc::new(
            "Dana".into(),
            "dana@example.com".into(),
            "$argon2...".into(),
            Role::Employee,
            "family".into(),
            None,
        );
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_some());
        assert!(json["status"].get("canWorkAsUsual").is_some());
        assert_eq!(json["preferences"]["language"], "he");
    }
}
