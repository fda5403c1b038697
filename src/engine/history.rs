//! Per-field audit history for task updates
//!
//! The update path is read-then-write: load the current document, diff the
//! requested partial update against it, append one history entry per field,
//! then apply the update. There is no optimistic concurrency token, so two
//! concurrent updates race and the later writer's entries reference a stale
//! old value. Accepted limitation; see DESIGN.md.

use bson::{oid::ObjectId, Bson, DateTime, Document};

use crate::db::schemas::HistoryEntry;

/// Fields the partial-update path refuses to touch. The embedded logs are
/// append-only and have their own operations; identity and provenance
/// fields are immutable.
pub const PROTECTED_FIELDS: &[&str] = &[
    "_id",
    "history",
    "notes",
    "comments",
    "createdBy",
    "createdAt",
    "updatedAt",
];

/// Whether a field may be modified through the partial-update path
pub fn is_updatable(field: &str) -> bool {
    !PROTECTED_FIELDS.contains(&field)
}

/// Build one history entry per updatable field present in the request,
/// recording the pre-update value (Null when the field was absent).
pub fn diff_fields(
    original: &Document,
    updates: &Document,
    updated_by: ObjectId,
    now: DateTime,
) -> Vec<HistoryEntry> {
    updates
        .iter()
        .filter(|(field, _)| is_updatable(field))
        .map(|(field, new_value)| HistoryEntry {
            field: field.clone(),
            old_value: original.get(field).cloned().unwrap_or(Bson::Null),
            new_value: new_value.clone(),
            updated_by,
            updated_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_one_entry_per_changed_field() {
        let original = doc! { "status": "pending", "priority": "medium" };
        let updates = doc! { "status": "assigned", "assignedTo": "abc" };

        let entries = diff_fields(&original, &updates, ObjectId::new(), DateTime::now());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].field, "status");
        assert_eq!(entries[0].old_value, Bson::String("pending".into()));
        assert_eq!(entries[0].new_value, Bson::String("assigned".into()));
        assert_eq!(entries[1].field, "assignedTo");
        assert_eq!(entries[1].old_value, Bson::Null);
    }

    #[test]
    fn test_empty_update_produces_no_entries() {
        let original = doc! { "status": "pending" };
        let entries = diff_fields(&original, &doc! {}, ObjectId::new(), DateTime::now());
        assert!(entries.is_empty());
    }

    #[test]
    fn test_protected_fields_skipped() {
        let original = doc! { "status": "pending", "history": [] };
        let updates = doc! {
            "history": ["forged"],
            "_id": "other",
            "createdBy": "other",
            "title": "New title",
        };

        let entries = diff_fields(&original, &updates, ObjectId::new(), DateTime::now());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field, "title");
    }

    #[test]
    fn test_entries_tagged_with_acting_user() {
        let actor = ObjectId::new();
        let entries = diff_fields(
            &doc! { "status": "pending" },
            &doc! { "status": "completed" },
            actor,
            DateTime::now(),
        );
        assert_eq!(entries[0].updated_by, actor);
    }
}
