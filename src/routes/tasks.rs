//! Task CRUD, assignment, and note endpoints
//!
//! Employees only ever see their own tasks: the list handler rewrites the
//! filter server-side regardless of what the client asked for. Every
//! update and assignment appends one history entry per changed field,
//! recording the pre-update value.

use base64::Engine;
use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::auth::{require_role, Role};
use crate::db::schemas::{
    Comment, Dependency, HistoryEntry, Note, NoteFile, Priority, TaskDoc, TaskStatus, UserDoc,
    UserRef, UserStatus, TASK_COLLECTION, USER_COLLECTION,
};
use crate::db::MongoCollection;
use crate::engine::history::{diff_fields, is_updatable};
use crate::error::HomefrontError;
use crate::routes::{
    authenticate, json_data, json_message, json_message_data, parse_json_body, parse_object_id,
    query_param, rfc3339, BoxBody,
};
use crate::server::AppState;

/// Task projection with resolved user references and RFC 3339 dates
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserRef>,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,
    pub dependencies: Vec<Dependency>,
    pub comments: Vec<Comment>,
    pub history: Vec<HistoryView>,
    pub notes: Vec<NoteView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub updated_by: String,
    pub updated_at: Option<String>,
}

impl HistoryView {
    pub fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            field: entry.field.clone(),
            old_value: entry.old_value.clone().into_relaxed_extjson(),
            new_value: entry.new_value.clone().into_relaxed_extjson(),
            updated_by: entry.updated_by.to_hex(),
            updated_at: rfc3339(Some(entry.updated_at)),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<NoteFile>,
    pub created_by: String,
    pub created_at: Option<String>,
}

impl NoteView {
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: note.id.to_hex(),
            text: note.text.clone(),
            file: note.file.clone(),
            created_by: note.created_by.to_hex(),
            created_at: rfc3339(Some(note.created_at)),
        }
    }
}

impl TaskView {
    pub fn from_doc(task: &TaskDoc, users: &HashMap<ObjectId, UserRef>) -> Self {
        Self {
            id: task.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            assigned_to: task.assigned_to.and_then(|id| users.get(&id).cloned()),
            created_by: users.get(&task.created_by).cloned(),
            department: task.department.clone(),
            deadline: rfc3339(task.deadline),
            estimated_hours: task.estimated_hours,
            actual_hours: task.actual_hours,
            dependencies: task.dependencies.clone(),
            comments: task.comments.clone(),
            history: task.history.iter().map(HistoryView::from_entry).collect(),
            notes: task.notes.iter().map(NoteView::from_note).collect(),
            created_at: rfc3339(task.created_at),
            updated_at: rfc3339(task.updated_at),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    priority: Priority,
    assigned_to: Option<String>,
    department: String,
    deadline: Option<chrono::DateTime<chrono::Utc>>,
    estimated_hours: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest {
    employee_id: String,
}

/// Note body shared by the task and emergency-task note endpoints
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddNoteRequest {
    pub(crate) text: Option<String>,
    pub(crate) file_name: Option<String>,
    /// Base64-encoded attachment content
    pub(crate) file_data: Option<String>,
}

/// Route task requests by method and remaining path
pub async fn handle(
    req: Request<Incoming>,
    state: &AppState,
    rest: &str,
) -> Result<Response<BoxBody>, HomefrontError> {
    let segments: Vec<&str> = rest.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();

    match (req.method().clone(), segments.as_slice()) {
        (Method::GET, []) => list_tasks(req, state).await,
        (Method::POST, []) => create_task(req, state).await,
        (Method::GET, ["available-employees"]) => available_employees(req, state).await,
        (Method::PUT | Method::PATCH, [id]) => {
            let id = parse_object_id(id, "task")?;
            update_task(req, state, id).await
        }
        (Method::DELETE, [id]) => {
            let id = parse_object_id(id, "task")?;
            delete_task(req, state, id).await
        }
        (Method::POST, [id, "assign"]) => {
            let id = parse_object_id(id, "task")?;
            assign_task(req, state, id).await
        }
        (Method::POST, [id, "notes"]) => {
            let id = parse_object_id(id, "task")?;
            add_note(req, state, id).await
        }
        (Method::DELETE, [id, "notes", note_id]) => {
            let id = parse_object_id(id, "task")?;
            let note_id = parse_object_id(note_id, "note")?;
            delete_note(req, state, id, note_id).await
        }
        _ => Err(HomefrontError::NotFound("Route not found".into())),
    }
}

/// Resolve every user id referenced by the given tasks into a UserRef map
async fn resolve_user_refs(
    state: &AppState,
    tasks: &[TaskDoc],
) -> Result<HashMap<ObjectId, UserRef>, HomefrontError> {
    let mut ids: Vec<ObjectId> = Vec::new();
    for task in tasks {
        ids.push(task.created_by);
        if let Some(assignee) = task.assigned_to {
            ids.push(assignee);
        }
    }
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

async fn load_task(
    tasks: &MongoCollection<TaskDoc>,
    id: ObjectId,
) -> Result<TaskDoc, HomefrontError> {
    tasks
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| HomefrontError::NotFound("Task not found".into()))
}

async fn task_view(
    state: &AppState,
    tasks: &MongoCollection<TaskDoc>,
    id: ObjectId,
) -> Result<TaskView, HomefrontError> {
    let task = load_task(tasks, id).await?;
    let users = resolve_user_refs(state, std::slice::from_ref(&task)).await?;
    Ok(TaskView::from_doc(&task, &users))
}

async fn list_tasks(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;

    // Employees are re-scoped to their own assignments server-side;
    // managers may narrow by department, status, or assignee
    let filter = match user.role {
        Role::Manager => {
            let mut filter = doc! {};
            if let Some(department) = query_param(req.uri(), "department") {
                filter.insert("department", department);
            }
            if let Some(status) = query_param(req.uri(), "status") {
                serde_json::from_value::<TaskStatus>(serde_json::Value::String(status.clone()))
                    .map_err(|_| {
                        HomefrontError::Validation(format!("Invalid status filter: {}", status))
                    })?;
                filter.insert("status", status);
            }
            if let Some(assignee) = query_param(req.uri(), "assignedTo") {
                filter.insert("assignedTo", parse_object_id(&assignee, "employee")?);
            }
            filter
        }
        _ => doc! { "assignedTo": user.id },
    };

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let docs = tasks.find_many_sorted(filter, doc! { "createdAt": -1 }).await?;

    let users = resolve_user_refs(state, &docs).await?;
    let views: Vec<TaskView> = docs.iter().map(|t| TaskView::from_doc(t, &users)).collect();

    Ok(json_data(StatusCode::OK, &views))
}

async fn create_task(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Manager])?;
    let manager_id = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let body: CreateTaskRequest = parse_json_body(req).await?;

    if body.title.trim().is_empty() {
        return Err(HomefrontError::Validation("title is required".into()));
    }
    if body.department.trim().is_empty() {
        return Err(HomefrontError::Validation("department is required".into()));
    }

    let assigned_to = body
        .assigned_to
        .as_deref()
        .map(|hex| parse_object_id(hex, "employee"))
        .transpose()?;

    let task = TaskDoc {
        id: None,
        title: body.title,
        description: body.description,
        status: TaskStatus::Pending,
        priority: body.priority,
        assigned_to,
        created_by: manager_id,
        department: body.department,
        deadline: body.deadline.map(bson::DateTime::from_chrono),
        estimated_hours: body.estimated_hours,
        actual_hours: None,
        dependencies: Vec::new(),
        comments: Vec::new(),
        history: Vec::new(),
        notes: Vec::new(),
        created_at: None,
        updated_at: None,
    };

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let id = tasks.insert_one(task).await?;

    info!("Task {} created by {}", id.to_hex(), user.email);

    let view = task_view(state, &tasks, id).await?;
    Ok(json_message_data(
        StatusCode::CREATED,
        "Task created successfully",
        &view,
    ))
}

/// Translate a partial-update body into a typed BSON `$set` document.
/// Protected fields are skipped; unknown fields are rejected.
pub fn sanitize_task_update(body: &Value) -> Result<Document, HomefrontError> {
    let object = body
        .as_object()
        .ok_or_else(|| HomefrontError::Validation("Update body must be a JSON object".into()))?;

    let mut updates = Document::new();

    for (field, value) in object {
        if !is_updatable(field) {
            continue;
        }

        let bson_value = match field.as_str() {
            "title" | "description" | "department" => match value {
                Value::String(s) if !s.trim().is_empty() => Bson::String(s.clone()),
                _ => {
                    return Err(HomefrontError::Validation(format!(
                        "{} must be a non-empty string",
                        field
                    )))
                }
            },
            "status" => {
                let status: TaskStatus = serde_json::from_value(value.clone()).map_err(|_| {
                    HomefrontError::Validation(format!("Invalid status: {}", value))
                })?;
                to_bson(&status)?
            }
            "priority" => {
                let priority: Priority = serde_json::from_value(value.clone()).map_err(|_| {
                    HomefrontError::Validation(format!("Invalid priority: {}", value))
                })?;
                to_bson(&priority)?
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
            "deadline" => match value {
                Value::Null => Bson::Null,
                Value::String(s) => {
                    let parsed: chrono::DateTime<chrono::Utc> = s.parse().map_err(|_| {
                        HomefrontError::Validation("deadline must be an RFC 3339 timestamp".into())
                    })?;
                    Bson::DateTime(bson::DateTime::from_chrono(parsed))
                }
                _ => {
                    return Err(HomefrontError::Validation(
                        "deadline must be a timestamp or null".into(),
                    ))
                }
            },
            "estimatedHours" | "actualHours" => match value.as_f64() {
                Some(n) if n >= 0.0 => Bson::Double(n),
                _ => {
                    return Err(HomefrontError::Validation(format!(
                        "{} must be a non-negative number",
                        field
                    )))
                }
            },
            "dependencies" => {
                let deps: Vec<Dependency> =
                    serde_json::from_value(value.clone()).map_err(|_| {
                        HomefrontError::Validation("Invalid dependencies list".into())
                    })?;
                to_bson(&deps)?
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

fn to_bson<T: Serialize>(value: &T) -> Result<Bson, HomefrontError> {
    bson::to_bson(value).map_err(|e| HomefrontError::Database(format!("BSON encode failed: {}", e)))
}

/// Apply a sanitized update to a task, appending one history entry per
/// changed field with the pre-update value.
async fn apply_task_update(
    tasks: &MongoCollection<TaskDoc>,
    task: &TaskDoc,
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

    let update = doc! {
        "$set": set,
        "$push": { "history": { "$each": to_bson(&entries)? } },
    };

    tasks.update_one(doc! { "_id": task_id }, update).await?;
    Ok(())
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
    let updates = sanitize_task_update(&body)?;

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let task = load_task(&tasks, task_id).await?;

    if !updates.is_empty() {
        apply_task_update(&tasks, &task, task_id, updates, actor).await?;
    }

    let view = task_view(state, &tasks, task_id).await?;
    Ok(json_message_data(
        StatusCode::OK,
        "Task updated successfully",
        &view,
    ))
}

async fn delete_task(
    req: Request<Incoming>,
    state: &AppState,
    task_id: ObjectId,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Manager])?;

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;

    // Idempotent: deleting an already-deleted id still succeeds
    if let Some(task) = tasks.find_one(doc! { "_id": task_id }).await? {
        for note in &task.notes {
            if let Some(file) = &note.file {
                let path = std::path::Path::new(&state.args.upload_dir).join(&file.stored_name);
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to remove attachment {}: {}", file.stored_name, e);
                }
            }
        }
    }

    tasks.delete_one(doc! { "_id": task_id }).await?;

    info!("Task {} deleted by {}", task_id.to_hex(), user.email);
    Ok(json_message(StatusCode::OK, "Task deleted successfully"))
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

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let task = load_task(&tasks, task_id).await?;

    // Unconditional: no availability or existence check on the target,
    // and a previous assignee simply loses the task
    let updates = doc! {
        "assignedTo": employee_id,
        "status": to_bson(&TaskStatus::Assigned)?,
    };
    apply_task_update(&tasks, &task, task_id, updates, actor).await?;

    info!(
        "Task {} assigned to {} by {}",
        task_id.to_hex(),
        employee_id.to_hex(),
        user.email
    );

    let view = task_view(state, &tasks, task_id).await?;
    Ok(json_message_data(
        StatusCode::OK,
        "Task assigned successfully",
        &view,
    ))
}

/// Decode and persist an uploaded attachment, returning its file record
pub(crate) async fn store_attachment(
    state: &AppState,
    file_name: &str,
    file_data: &str,
) -> Result<NoteFile, HomefrontError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(file_data)
        .map_err(|_| HomefrontError::Validation("fileData must be valid base64".into()))?;

    if bytes.is_empty() {
        return Err(HomefrontError::Validation("Uploaded file is empty".into()));
    }

    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    let stored_name = format!("{}{}", uuid::Uuid::new_v4(), extension);

    tokio::fs::create_dir_all(&state.args.upload_dir).await?;
    let path = std::path::Path::new(&state.args.upload_dir).join(&stored_name);
    tokio::fs::write(&path, &bytes).await?;

    Ok(NoteFile {
        stored_name,
        original_name: file_name.to_string(),
    })
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
    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    load_task(&tasks, task_id).await?;

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

    let update = doc! {
        "$push": { "notes": to_bson(&note)? },
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

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let task = load_task(&tasks, task_id).await?;

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

    if let Some(file) = &note.file {
        let path = std::path::Path::new(&state.args.upload_dir).join(&file.stored_name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove attachment {}: {}", file.stored_name, e);
        }
    }

    let update = doc! {
        "$pull": { "notes": { "id": note_id } },
        "$set": { "updatedAt": DateTime::now() },
    };
    tasks.update_one(doc! { "_id": task_id }, update).await?;

    Ok(json_message(StatusCode::OK, "Note deleted successfully"))
}

/// Employee roster entry for the assignment picker
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableEmployee {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub status: UserStatus,
}

async fn available_employees(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    authenticate(&req, state).await?;

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let employees = users
        .find_many_sorted(
            doc! { "role": "employee", "status.canWorkAsUsual": true },
            doc! { "name": 1 },
        )
        .await?;

    let roster: Vec<AvailableEmployee> = employees
        .iter()
        .filter_map(|u| {
            u.id.map(|id| AvailableEmployee {
                id: id.to_hex(),
                name: u.name.clone(),
                email: u.email.clone(),
                department: u.department.clone(),
                status: u.status.clone(),
            })
        })
        .collect();

    Ok(json_data(StatusCode::OK, &roster))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_accepts_known_fields() {
        let body = json!({
            "title": "New title",
            "status": "inProgress",
            "priority": "high",
            "estimatedHours": 2.5,
        });
        let updates = sanitize_task_update(&body).unwrap();

        assert_eq!(updates.get_str("title").unwrap(), "New title");
        assert_eq!(updates.get_str("status").unwrap(), "inProgress");
        assert_eq!(updates.get_str("priority").unwrap(), "high");
        assert_eq!(updates.get_f64("estimatedHours").unwrap(), 2.5);
    }

    #[test]
    fn test_sanitize_skips_protected_fields() {
        let body = json!({
            "history": ["forged"],
            "createdBy": "64b1f0a0c2d3e4f5a6b7c8d9",
            "title": "ok",
        });
        let updates = sanitize_task_update(&body).unwrap();

        assert!(!updates.contains_key("history"));
        assert!(!updates.contains_key("createdBy"));
        assert!(updates.contains_key("title"));
    }

    #[test]
    fn test_sanitize_rejects_unknown_field() {
        let body = json!({ "favouriteColour": "blue" });
        assert!(sanitize_task_update(&body).is_err());
    }

    #[test]
    fn test_sanitize_rejects_bad_status() {
        let body = json!({ "status": "vanished" });
        assert!(sanitize_task_update(&body).is_err());
    }

    #[test]
    fn test_sanitize_assigned_to() {
        let body = json!({ "assignedTo": "64b1f0a0c2d3e4f5a6b7c8d9" });
        let updates = sanitize_task_update(&body).unwrap();
        assert!(matches!(updates.get("assignedTo"), Some(Bson::ObjectId(_))));

        let unassign = json!({ "assignedTo": null });
        let updates = sanitize_task_update(&unassign).unwrap();
        assert_eq!(updates.get("assignedTo"), Some(&Bson::Null));
    }

    #[test]
    fn test_sanitize_deadline_parsing() {
        let body = json!({ "deadline": "2026-09-01T12:00:00Z" });
        let updates = sanitize_task_update(&body).unwrap();
        assert!(matches!(updates.get("deadline"), Some(Bson::DateTime(_))));

        let bad = json!({ "deadline": "next tuesday" });
        assert!(sanitize_task_update(&bad).is_err());
    }

    #[test]
    fn test_create_request_requires_priority() {
        let missing = json!({ "title": "Deliver food", "department": "family" });
        assert!(serde_json::from_value::<CreateTaskRequest>(missing).is_err());

        let full = json!({
            "title": "Deliver food",
            "department": "family",
            "priority": "high",
        });
        let parsed: CreateTaskRequest = serde_json::from_value(full).unwrap();
        assert_eq!(parsed.priority, Priority::High);
    }

    #[test]
    fn test_sanitize_rejects_non_object() {
        assert!(sanitize_task_update(&json!("nope")).is_err());
        assert!(sanitize_task_update(&json!([1, 2])).is_err());
    }
}
