//! Emergency mode and emergency-task endpoints
//!
//! The on/off state is a versioned singleton maintained by upserting
//! against an empty filter; concurrent activate/deactivate calls are
//! last-writer-wins with the version counter recording the winner.
//! Catalog tasks are only visible and assignable while active;
//! deactivation resets every catalog task to pending and unassigned.

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use crate::auth::{require_role, Role};
use crate::db::schemas::{
    EmergencyStateDoc, EmergencyTaskDoc, EmergencyTaskStatus, Note, Priority, UserDoc, UserRef,
    EMERGENCY_STATE_COLLECTION, EMERGENCY_TASK_COLLECTION, USER_COLLECTION,
};
use crate::db::MongoCollection;
use crate::engine::history::{diff_fields, is_updatable};
use crate::error::HomefrontError;
use crate::routes::tasks::{store_attachment, AddNoteRequest, HistoryView, NoteView};
use crate::routes::{
    authenticate, json_data, json_message, json_message_data, parse_json_body, parse_object_id,
    rfc3339, BoxBody,
};
use crate::server::AppState;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ActivateRequest {
    description: Option<String>,
    #[serde(default)]
    affected_areas: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest {
    employee_id: String,
}

/// Singleton state as returned by the API
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyStateView {
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub affected_areas: Vec<String>,
    pub version: i64,
}

impl EmergencyStateView {
    fn from_doc(state: &EmergencyStateDoc) -> Self {
        Self {
            is_active: state.is_active,
            activated_by: state.activated_by.map(|id| id.to_hex()),
            activated_at: rfc3339(state.activated_at),
            description: state.description.clone(),
            affected_areas: state.affected_areas.clone(),
            version: state.version,
        }
    }
}

/// Emergency task projection with a resolved assignee
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyTaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub criticality: Priority,
    pub status: EmergencyTaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserRef>,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub required_skills: Vec<String>,
    pub estimated_time: i32,
    pub notes: Vec<NoteView>,
    pub history: Vec<HistoryView>,
    pub is_active: bool,
}

impl EmergencyTaskView {
    fn from_doc(task: &EmergencyTaskDoc, users: &HashMap<ObjectId, UserRef>) -> Self {
        Self {
            id: task.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: task.title.clone(),
            description: task.description.clone(),
            criticality: task.criticality,
            status: task.status,
            assigned_to: task.assigned_to.and_then(|id| users.get(&id).cloned()),
            department: task.department.clone(),
            location: task.location.clone(),
            required_skills: task.required_skills.clone(),
            estimated_time: task.estimated_time,
            notes: task.notes.iter().map(NoteView::from_note).collect(),
            history: task.history.iter().map(HistoryView::from_entry).collect(),
            is_active: task.is_active,
        }
    }
}

/// Route emergency requests by method and remaining path
pub async fn handle(
    req: Request<Incoming>,
    state: &AppState,
    rest: &str,
) -> Result<Response<BoxBody>, HomefrontError> {
    let segments: Vec<&str> = rest.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();

    match (req.method().clone(), segments.as_slice()) {
        (Method::GET, ["status"]) => status(req, state).await,
        (Method::POST, ["activate"]) => activate(req, state).await,
        (Method::POST, ["deactivate"]) => deactivate(req, state).await,
        (Method::GET, ["tasks"]) => list_active_tasks(req, state).await,
        (Method::PUT | Method::PATCH, ["tasks", id]) => {
            let id = parse_object_id(id, "emergency task")?;
            update_task(req, state, id).await
        }
        (Method::POST, ["tasks", id, "assign"]) => {
            let id = parse_object_id(id, "emergency task")?;
            assign_task(req, state, id).await
        }
        (Method::POST, ["tasks", id, "notes"]) => {
            let id = parse_object_id(id, "emergency task")?;
            add_note(req, state, id).await
        }
        (Method::DELETE, ["tasks", id, "notes", note_id]) => {
            let id = parse_object_id(id, "emergency task")?;
            let note_id = parse_object_id(note_id, "note")?;
            delete_note(req, state, id, note_id).await
        }
        _ => Err(HomefrontError::NotFound("Route not found".into())),
    }
}

async fn state_collection(
    state: &AppState,
) -> Result<MongoCollection<EmergencyStateDoc>, HomefrontError> {
    state
        .mongo
        .collection::<EmergencyStateDoc>(EMERGENCY_STATE_COLLECTION)
        .await
}

async fn task_collection(
    state: &AppState,
) -> Result<MongoCollection<EmergencyTaskDoc>, HomefrontError> {
    state
        .mongo
        .collection::<EmergencyTaskDoc>(EMERGENCY_TASK_COLLECTION)
        .await
}

async fn status(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    authenticate(&req, state).await?;

    let states = state_collection(state).await?;
    let current = states.find_one(doc! {}).await?.unwrap_or_default();

    Ok(json_data(
        StatusCode::OK,
        &EmergencyStateView::from_doc(&current),
    ))
}

async fn activate(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Manager])?;
    let manager_id = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let body: ActivateRequest = parse_json_body(req).await.unwrap_or_default();
    let now = DateTime::now();

    let states = state_collection(state).await?;
    let updated = states
        .upsert_one(
            doc! {},
            doc! {
                "$set": {
                    "isActive": true,
                    "activatedBy": manager_id,
                    "activatedAt": now,
                    "description": body.description.map(Bson::String).unwrap_or(Bson::Null),
                    "affectedAreas": body.affected_areas,
                    "updatedAt": now,
                },
                "$setOnInsert": { "createdAt": now },
                "$inc": { "version": 1 },
            },
        )
        .await?
        .ok_or_else(|| HomefrontError::Database("Emergency state upsert returned nothing".into()))?;

    // Surface the whole catalog for the duration of the emergency
    let tasks = task_collection(state).await?;
    let result = tasks
        .update_many(doc! {}, doc! { "$set": { "isActive": true, "updatedAt": now } })
        .await?;

    info!(
        "Emergency activated by {} ({} catalog tasks surfaced, state v{})",
        user.email, result.modified_count, updated.version
    );

    Ok(json_message_data(
        StatusCode::OK,
        "Emergency mode activated",
        &EmergencyStateView::from_doc(&updated),
    ))
}

async fn deactivate(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Manager])?;

    let now = DateTime::now();

    let states = state_collection(state).await?;
    let updated = states
        .upsert_one(
            doc! {},
            doc! {
                "$set": { "isActive": false, "updatedAt": now },
                "$setOnInsert": { "createdAt": now },
                "$inc": { "version": 1 },
            },
        )
        .await?
        .ok_or_else(|| HomefrontError::Database("Emergency state upsert returned nothing".into()))?;

    // Reset the catalog: hidden, unassigned, back to pending
    let tasks = task_collection(state).await?;
    let result = tasks
        .update_many(
            doc! {},
            doc! {
                "$set": {
                    "isActive": false,
                    "assignedTo": Bson::Null,
                    "status": "pending",
                    "updatedAt": now,
                },
            },
        )
        .await?;

    info!(
        "Emergency deactivated by {} ({} catalog tasks reset, state v{})",
        user.email, result.modified_count, updated.version
    );

    Ok(json_message_data(
        StatusCode::OK,
        "Emergency mode deactivated",
        &EmergencyStateView::from_doc(&updated),
    ))
}

async fn resolve_assignees(
    state: &AppState,
    tasks: &[EmergencyTaskDoc],
) -> Result<HashMap<ObjectId, UserRef>, HomefrontError> {
    let mut ids: Vec<ObjectId> = tasks.iter().filter_map(|t| t.assigned_to).collect();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let docs = users.find_many(doc! { "_id": { "$in": ids } }).await?;

    Ok(docs
        .into_iter()
        .filter_map(|u| u.id.map(|id| (id, u.to_ref())))
        .collect())
}

async fn list_active_tasks(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    authenticate(&req, state).await?;

    let tasks = task_collection(state).await?;
    let docs = tasks
        .find_many_sorted(doc! { "isActive": true }, doc! { "criticality": 1 })
        .await?;

    let users = resolve_assignees(state, &docs).await?;
    let views: Vec<EmergencyTaskView> = docs
        .iter()
        .map(|t| EmergencyTaskView::from_doc(t, &users))
        .collect();

    Ok(json_data(StatusCode::OK, &views))
}

/// Load an active emergency task or report it missing. Inactive catalog
/// tasks are invisible to every task operation.
async fn load_active_task(
    tasks: &MongoCollection<EmergencyTaskDoc>,
    id: ObjectId,
) -> Result<EmergencyTaskDoc, HomefrontError> {
    tasks
        .find_one(doc! { "_id": id, "isActive": true })
        .await?
        .ok_or_else(|| HomefrontError::NotFound("Emergency task not found".into()))
}

/// Translate a partial-update body into a typed `$set` document for an
/// emergency task
pub fn sanitize_emergency_update(body: &Value) -> Result<Document, HomefrontError> {
    let object = body
        .as_object()
        .ok_or_else(|| HomefrontError::Validation("Update body must be a JSON object".into()))?;

    let mut updates = Document::new();

    for (field, value) in object {
        if !is_updatable(field) {
            continue;
        }

        let bson_value = match field.as_str() {
            "title" | "description" => match value {
                Value::String(s) if !s.trim().is_empty() => Bson::String(s.clone()),
                _ => {
                    return Err(HomefrontError::Validation(format!(
                        "{} must be a non-empty string",
                        field
                    )))
                }
            },
            "location" => match value {
                Value::Null => Bson::Null,
                Value::String(s) => Bson::String(s.clone()),
                _ => {
                    return Err(HomefrontError::Validation(
                        "location must be a string or null".into(),
                    ))
                }
            },
            "status" => {
                let status: EmergencyTaskStatus =
                    serde_json::from_value(value.clone()).map_err(|_| {
                        HomefrontError::Validation(format!("Invalid status: {}", value))
                    })?;
                bson::to_bson(&status)
                    .map_err(|e| HomefrontError::Database(format!("BSON encode failed: {}", e)))?
            }
            "criticality" => {
                let criticality: Priority =
                    serde_json::from_value(value.clone()).map_err(|_| {
                        HomefrontError::Validation(format!("Invalid criticality: {}", value))
                    })?;
                bson::to_bson(&criticality)
                    .map_err(|e| HomefrontError::Database(format!("BSON encode failed: {}", e)))?
            }
            "assignedTo" => match value {
                Value::Null => Bson::Null,
                Value::String(hex) => Bson::ObjectId(parse_object_id(hex, "employee")?),
                _ => {
                    return Err(HomefrontError::Validation(
                        "assignedTo must be an id or null".into(),
                    ))
                }
            },
            "estimatedTime" => match value.as_i64().and_then(|m| i32::try_from(m).ok()) {
                Some(minutes) if minutes > 0 => Bson::Int32(minutes),
                _ => {
                    return Err(HomefrontError::Validation(
                        "estimatedTime must be a positive number of minutes".into(),
                    ))
                }
            },
            "requiredSkills" => {
                let skills: Vec<String> = serde_json::from_value(value.clone()).map_err(|_| {
                    HomefrontError::Validation("requiredSkills must be a list of strings".into())
                })?;
                Bson::Array(skills.into_iter().map(Bson::String).collect())
            }
            other => {
                return Err(HomefrontError::Validation(format!(
                    "Field '{}' cannot be updated",
                    other
                )))
            }
        };

        updates.insert(field.clone(), bson_value);
    }

    Ok(updates)
}

async fn apply_emergency_update(
    tasks: &MongoCollection<EmergencyTaskDoc>,
    task: &EmergencyTaskDoc,
    task_id: ObjectId,
    updates: Document,
    actor: ObjectId,
) -> Result<(), HomefrontError> {
    let now = DateTime::now();
    let original = bson::to_document(task)
        .map_err(|e| HomefrontError::Database(format!("BSON encode failed: {}", e)))?;

    let entries = diff_fields(&original, &updates, actor, now);

    let mut set = updates;
    set.insert("updatedAt", now);

    let entries_bson = bson::to_bson(&entries)
        .map_err(|e| HomefrontError::Database(format!("BSON encode failed: {}", e)))?;

    let update = doc! {
        "$set": set,
        "$push": { "history": { "$each": entries_bson } },
    };

    tasks.update_one(doc! { "_id": task_id }, update).await?;
    Ok(())
}

async fn emergency_task_view(
    state: &AppState,
    tasks: &MongoCollection<EmergencyTaskDoc>,
    id: ObjectId,
) -> Result<EmergencyTaskView, HomefrontError> {
    let task = load_active_task(tasks, id).await?;
    let users = resolve_assignees(state, std::slice::from_ref(&task)).await?;
    Ok(EmergencyTaskView::from_doc(&task, &users))
}

async fn update_task(
    req: Request<Incoming>,
    state: &AppState,
    task_id: ObjectId,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    let actor = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let body: Value = parse_json_body(req).await?;
    let updates = sanitize_emergency_update(&body)?;

    let tasks = task_collection(state).await?;
    let task = load_active_task(&tasks, task_id).await?;

    if !updates.is_empty() {
        apply_emergency_update(&tasks, &task, task_id, updates, actor).await?;
    }

    let view = emergency_task_view(state, &tasks, task_id).await?;
    Ok(json_message_data(
        StatusCode::OK,
        "Emergency task updated successfully",
        &view,
    ))
}

async fn assign_task(
    req: Request<Incoming>,
    state: &AppState,
    task_id: ObjectId,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    let actor = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let body: AssignRequest = parse_json_body(req).await?;
    let employee_id = parse_object_id(&body.employee_id, "employee")?;

    let tasks = task_collection(state).await?;
    let task = load_active_task(&tasks, task_id).await?;

    // Unconditional, like regular task assignment
    let updates = doc! {
        "assignedTo": employee_id,
        "status": "assigned",
    };
    apply_emergency_update(&tasks, &task, task_id, updates, actor).await?;

    info!(
        "Emergency task {} assigned to {} by {}",
        task_id.to_hex(),
        employee_id.to_hex(),
        user.email
    );

    let view = emergency_task_view(state, &tasks, task_id).await?;
    Ok(json_message_data(
        StatusCode::OK,
        "Emergency task assigned successfully",
        &view,
    ))
}

async fn add_note(
    req: Request<Incoming>,
    state: &AppState,
    task_id: ObjectId,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    let actor = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let body: AddNoteRequest = parse_json_body(req).await?;

    let text = body.text.filter(|t| !t.trim().is_empty());
    if text.is_none() && body.file_data.is_none() {
        return Err(HomefrontError::Validation(
            "A note needs text or an attachment".into(),
        ));
    }

    // Existence check before the attachment is written, so a bad task id
    // never leaves an orphaned file on disk
    let tasks = task_collection(state).await?;
    load_active_task(&tasks, task_id).await?;

    let file = match (&body.file_data, &body.file_name) {
        (Some(data), Some(name)) => Some(store_attachment(state, name, data).await?),
        (Some(_), None) => {
            return Err(HomefrontError::Validation(
                "fileName is required with fileData".into(),
            ))
        }
        _ => None,
    };

    let note = Note {
        id: ObjectId::new(),
        text,
        file,
        created_by: actor,
        created_at: DateTime::now(),
    };

    let note_bson = bson::to_bson(&note)
        .map_err(|e| HomefrontError::Database(format!("BSON encode failed: {}", e)))?;
    let update = doc! {
        "$push": { "notes": note_bson },
        "$set": { "updatedAt": DateTime::now() },
    };
    tasks.update_one(doc! { "_id": task_id }, update).await?;

    Ok(json_message_data(
        StatusCode::CREATED,
        "Note added successfully",
        &NoteView::from_note(&note),
    ))
}

async fn delete_note(
    req: Request<Incoming>,
    state: &AppState,
    task_id: ObjectId,
    note_id: ObjectId,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    let actor = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let tasks = task_collection(state).await?;
    let task = load_active_task(&tasks, task_id).await?;

    let note = task
        .notes
        .iter()
        .find(|n| n.id == note_id)
        .ok_or_else(|| HomefrontError::NotFound("Note not found".into()))?;

    if note.created_by != actor {
        return Err(HomefrontError::Authorization(
            "Not authorized to delete this note".into(),
        ));
    }

    let update = doc! {
        "$pull": { "notes": { "id": note_id } },
        "$set": { "updatedAt": DateTime::now() },
    };
    tasks.update_one(doc! { "_id": task_id }, update).await?;

    Ok(json_message(StatusCode::OK, "Note deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_accepts_emergency_fields() {
        let body = json!({
            "status": "inProgress",
            "criticality": "critical",
            "location": "שכונה ד",
            "estimatedTime": 90,
        });
        let updates = sanitize_emergency_update(&body).unwrap();

        assert_eq!(updates.get_str("status").unwrap(), "inProgress");
        assert_eq!(updates.get_str("criticality").unwrap(), "critical");
        assert_eq!(updates.get_i32("estimatedTime").unwrap(), 90);
    }

    #[test]
    fn test_sanitize_rejects_task_only_statuses() {
        // transferred/cancelled exist for regular tasks only
        assert!(sanitize_emergency_update(&json!({ "status": "transferred" })).is_err());
        assert!(sanitize_emergency_update(&json!({ "status": "cancelled" })).is_err());
    }

    #[test]
    fn test_sanitize_rejects_is_active_flip() {
        // the global switch is the only way to change visibility
        assert!(sanitize_emergency_update(&json!({ "isActive": false })).is_err());
    }

    #[test]
    fn test_sanitize_skips_protected_fields() {
        let body = json!({ "history": [], "title": "ok" });
        let updates = sanitize_emergency_update(&body).unwrap();
        assert!(!updates.contains_key("history"));
        assert!(updates.contains_key("title"));
    }

    #[test]
    fn test_sanitize_rejects_oversized_estimated_time() {
        let body = json!({ "estimatedTime": i64::from(i32::MAX) + 1 });
        assert!(sanitize_emergency_update(&body).is_err());
    }

    #[test]
    fn test_note_request_carries_attachment_fields() {
        let body = json!({ "fileName": "report.pdf", "fileData": "aGVsbG8=" });
        let request: AddNoteRequest = serde_json::from_value(body).unwrap();
        assert!(request.text.is_none());
        assert_eq!(request.file_name.as_deref(), Some("report.pdf"));
        assert_eq!(request.file_data.as_deref(), Some("aGVsbG8="));
    }
}
