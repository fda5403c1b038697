//! EmergencyState singleton schema
//!
//! At most one logical record system-wide, maintained by upserting against
//! an empty filter. The `version` counter increments on every upsert so a
//! last writer can be detected; it does not prevent the documented
//! activate/deactivate race.

use bson::{doc, DateTime, Document};
use bson::oid::ObjectId;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, Timestamped};

/// Collection name for the emergency state singleton
pub const EMERGENCY_STATE_COLLECTION: &str = "emergencyState";

/// Global emergency on/off record
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyStateDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_by: Option<ObjectId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub affected_areas: Vec<String>,

    /// Incremented on every upsert for last-writer detection
    #[serde(default)]
    pub version: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl IntoIndexes for EmergencyStateDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![]
    }
}

impl Timestamped for EmergencyStateDoc {
    fn stamp_created(&mut self, now: DateTime) {
        self.created_at = Some(now);
    }

    fn stamp_updated(&mut self, now: DateTime) {
        self.updated_at = Some(now);
    }
}
