//! Assessment form endpoints
//!
//! Submission is resolve-or-create: an outstanding triggered form is
//! completed in place, otherwise a fresh submitted form is created. Either
//! way the employee's User.status sub-record is overwritten with the
//! reported values. Forms are never deleted.

use bson::{doc, oid::ObjectId, Bson, DateTime};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::auth::{require_role, Role};
use crate::db::schemas::{
    AssessmentFormDoc, FormStatus, UserDoc, ASSESSMENT_FORM_COLLECTION, USER_COLLECTION,
};
use crate::engine::validate_submission;
use crate::error::HomefrontError;
use crate::routes::{
    authenticate, json_data, json_message_data, parse_json_body, rfc3339, BoxBody,
};
use crate::server::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    stress_level: i32,
    #[serde(default)]
    physically_injured: bool,
    injury_details: Option<String>,
    #[serde(default)]
    spouse_available: bool,
    available_hours: i32,
    #[serde(default)]
    can_work_as_usual: bool,
    constraints: Option<String>,
    current_location: Option<String>,
}

/// Form projection for API responses
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub id: String,
    pub employee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<i32>,
    pub physically_injured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injury_details: Option<String>,
    pub spouse_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_hours: Option<i32>,
    pub can_work_as_usual: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    pub triggered: bool,
    pub status: FormStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl FormView {
    fn from_doc(form: &AssessmentFormDoc, names: &HashMap<ObjectId, String>) -> Self {
        Self {
            id: form.id.map(|id| id.to_hex()).unwrap_or_default(),
            employee: form.employee.to_hex(),
            employee_name: names.get(&form.employee).cloned(),
            stress_level: form.stress_level,
            physically_injured: form.physically_injured,
            injury_details: form.injury_details.clone(),
            spouse_available: form.spouse_available,
            available_hours: form.available_hours,
            can_work_as_usual: form.can_work_as_usual,
            constraints: form.constraints.clone(),
            triggered: form.triggered,
            status: form.status,
            submitted_at: rfc3339(form.submitted_at),
            created_at: rfc3339(form.created_at),
        }
    }
}

/// Route assessment requests by method and remaining path
pub async fn handle(
    req: Request<Incoming>,
    state: &AppState,
    rest: &str,
) -> Result<Response<BoxBody>, HomefrontError> {
    match (req.method(), rest.trim_end_matches('/')) {
        (&Method::POST, "/submit") => submit(req, state).await,
        (&Method::POST, "/trigger") => trigger(req, state).await,
        (&Method::GET, "/check-pending") => check_pending(req, state).await,
        (&Method::GET, "/forms") => list_forms(req, state).await,
        _ => Err(HomefrontError::NotFound("Route not found".into())),
    }
}

async fn submit(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Employee])?;
    let employee_id = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let body: SubmitRequest = parse_json_body(req).await?;
    validate_submission(body.stress_level, body.available_hours)?;

    let now = DateTime::now();
    let forms = state
        .mongo
        .collection::<AssessmentFormDoc>(ASSESSMENT_FORM_COLLECTION)
        .await?;

    // Complete the outstanding triggered form when there is one; a second
    // submission on the same day just creates another record
    let pending = forms
        .find_one(doc! {
            "employee": employee_id,
            "triggered": true,
            "status": "pending",
        })
        .await?;

    let submitted_fields = doc! {
        "submittedBy": employee_id,
        "stressLevel": body.stress_level,
        "physicallyInjured": body.physically_injured,
        "injuryDetails": body.injury_details.clone().map(Bson::String).unwrap_or(Bson::Null),
        "spouseAvailable": body.spouse_available,
        "availableHours": body.available_hours,
        "canWorkAsUsual": body.can_work_as_usual,
        "constraints": body.constraints.clone().map(Bson::String).unwrap_or(Bson::Null),
        "status": "submitted",
        "submittedAt": now,
        "updatedAt": now,
    };

    let form_id = match pending.and_then(|f| f.id) {
        Some(id) => {
            forms
                .update_one(doc! { "_id": id }, doc! { "$set": submitted_fields })
                .await?;
            id
        }
        None => {
            let form = AssessmentFormDoc {
                id: None,
                employee: employee_id,
                submitted_by: employee_id,
                stress_level: Some(body.stress_level),
                physically_injured: body.physically_injured,
                injury_details: body.injury_details.clone(),
                spouse_available: body.spouse_available,
                available_hours: Some(body.available_hours),
                can_work_as_usual: body.can_work_as_usual,
                constraints: body.constraints.clone(),
                triggered: false,
                status: FormStatus::Submitted,
                reviewed_by: None,
                review_notes: None,
                submitted_at: Some(now),
                created_at: None,
                updated_at: None,
            };
            forms.insert_one(form).await?
        }
    };

    // The submission overwrites the employee's availability snapshot
    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    users
        .update_one(
            doc! { "_id": employee_id },
            doc! {
                "$set": {
                    "status.stressLevel": body.stress_level,
                    "status.physicallyInjured": body.physically_injured,
                    "status.spouseAvailable": body.spouse_available,
                    "status.availableHours": body.available_hours,
                    "status.canWorkAsUsual": body.can_work_as_usual,
                    "status.currentLocation": body.current_location.clone().map(Bson::String).unwrap_or(Bson::Null),
                    "status.lastUpdated": now,
                    "updatedAt": now,
                },
            },
        )
        .await?;

    info!("Assessment form submitted by {}", user.email);

    let form = forms
        .find_one(doc! { "_id": form_id })
        .await?
        .ok_or_else(|| HomefrontError::Database("Submitted form vanished".into()))?;

    Ok(json_message_data(
        StatusCode::CREATED,
        "Assessment form submitted successfully",
        &FormView::from_doc(&form, &HashMap::new()),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerPayload {
    triggered_count: usize,
}

async fn trigger(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Manager])?;
    let manager_id = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let employees = users.find_many(doc! { "role": "employee" }).await?;

    // Deliberately not idempotent: re-triggering stacks another pending
    // form per employee
    let pending: Vec<AssessmentFormDoc> = employees
        .iter()
        .filter_map(|e| e.id)
        .map(|id| AssessmentFormDoc::triggered_pending(id, manager_id))
        .collect();

    let count = if pending.is_empty() {
        0
    } else {
        let forms = state
            .mongo
            .collection::<AssessmentFormDoc>(ASSESSMENT_FORM_COLLECTION)
            .await?;
        forms.insert_many(pending).await?
    };

    info!(
        "Assessment broadcast by {} created {} pending forms",
        user.email, count
    );

    Ok(json_message_data(
        StatusCode::CREATED,
        "Assessment forms triggered for all employees",
        &TriggerPayload {
            triggered_count: count,
        },
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PendingPayload {
    has_pending_form: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    form_id: Option<String>,
}

async fn check_pending(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Employee])?;
    let employee_id = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let forms = state
        .mongo
        .collection::<AssessmentFormDoc>(ASSESSMENT_FORM_COLLECTION)
        .await?;

    let pending = forms
        .find_one(doc! {
            "employee": employee_id,
            "triggered": true,
            "status": "pending",
        })
        .await?;

    Ok(json_data(
        StatusCode::OK,
        &PendingPayload {
            has_pending_form: pending.is_some(),
            form_id: pending.and_then(|f| f.id).map(|id| id.to_hex()),
        },
    ))
}

async fn list_forms(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Manager])?;

    let forms = state
        .mongo
        .collection::<AssessmentFormDoc>(ASSESSMENT_FORM_COLLECTION)
        .await?;
    let docs = forms
        .find_many_sorted(doc! {}, doc! { "createdAt": -1 })
        .await?;

    let mut employee_ids: Vec<ObjectId> = docs.iter().map(|f| f.employee).collect();
    employee_ids.sort_unstable();
    employee_ids.dedup();

    let names: HashMap<ObjectId, String> = if employee_ids.is_empty() {
        HashMap::new()
    } else {
        let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
        users
            .find_many(doc! { "_id": { "$in": employee_ids } })
            .await?
            .into_iter()
            .filter_map(|u| u.id.map(|id| (id, u.name)))
            .collect()
    };

    let views: Vec<FormView> = docs.iter().map(|f| FormView::from_doc(f, &names)).collect();
    Ok(json_data(StatusCode::OK, &views))
}
