//! Dashboard endpoints
//!
//! Both views recompute from the store on every request. "Today" is the
//! server's local day; the manager view keeps only each employee's latest
//! form when several were submitted today.

use bson::{doc, oid::ObjectId};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::collections::HashMap;

use crate::auth::{require_role, Role};
use crate::db::schemas::{
    AssessmentFormDoc, EmergencyStateDoc, EmergencyTaskDoc, EmergencyTaskStatus, TaskDoc,
    TaskStatus, UserDoc, UserStatus, ASSESSMENT_FORM_COLLECTION, EMERGENCY_STATE_COLLECTION,
    EMERGENCY_TASK_COLLECTION, TASK_COLLECTION, USER_COLLECTION,
};
use crate::engine::dashboard::{
    critical_cases, latest_form_per_employee, ratio, start_of_local_day, task_status_buckets,
    CriticalCase,
};
use crate::error::HomefrontError;
use crate::routes::{authenticate, json_data, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManagerTaskStats {
    total: usize,
    active: usize,
    completed: usize,
    pending: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeStats {
    total: usize,
    available: usize,
    unavailable: usize,
    responded_today: usize,
    response_rate: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManagerDashboard {
    task_stats: ManagerTaskStats,
    employees: EmployeeStats,
    critical_cases: Vec<CriticalCase>,
    emergency_active: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignedCounts {
    total: usize,
    active: usize,
    completed: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeDashboard {
    department: String,
    status: UserStatus,
    tasks: AssignedCounts,
    emergency_tasks: AssignedCounts,
    form_submitted_today: bool,
    has_pending_form: bool,
    emergency_active: bool,
}

/// Route dashboard requests by method and remaining path
pub async fn handle(
    req: Request<Incoming>,
    state: &AppState,
    rest: &str,
) -> Result<Response<BoxBody>, HomefrontError> {
    match (req.method(), rest.trim_end_matches('/')) {
        (&Method::GET, "/manager") => manager_view(req, state).await,
        (&Method::GET, "/employee") => employee_view(req, state).await,
        _ => Err(HomefrontError::NotFound("Route not found".into())),
    }
}

async fn emergency_active(state: &AppState) -> Result<bool, HomefrontError> {
    let states = state
        .mongo
        .collection::<EmergencyStateDoc>(EMERGENCY_STATE_COLLECTION)
        .await?;
    Ok(states
        .find_one(doc! {})
        .await?
        .map(|s| s.is_active)
        .unwrap_or(false))
}

async fn todays_submitted_forms(
    state: &AppState,
) -> Result<Vec<AssessmentFormDoc>, HomefrontError> {
    let day_start = start_of_local_day(chrono::Local::now());
    let forms = state
        .mongo
        .collection::<AssessmentFormDoc>(ASSESSMENT_FORM_COLLECTION)
        .await?;
    forms
        .find_many(doc! {
            "status": "submitted",
            "submittedAt": { "$gte": day_start },
        })
        .await
}

async fn manager_view(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Manager])?;

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let all_tasks = tasks.find_many(doc! {}).await?;
    let stats = task_status_buckets(&all_tasks);

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let employees = users.find_many(doc! { "role": "employee" }).await?;
    let available = employees
        .iter()
        .filter(|e| e.status.can_work_as_usual)
        .count();
    let names: HashMap<ObjectId, String> = employees
        .iter()
        .filter_map(|e| e.id.map(|id| (id, e.name.clone())))
        .collect();

    let todays_forms = todays_submitted_forms(state).await?;
    let latest = latest_form_per_employee(&todays_forms);
    let cases = critical_cases(&latest, &names);

    let dashboard = ManagerDashboard {
        task_stats: ManagerTaskStats {
            total: all_tasks.len(),
            active: stats.active,
            completed: stats.completed,
            pending: stats.pending,
        },
        employees: EmployeeStats {
            total: employees.len(),
            available,
            unavailable: employees.len() - available,
            responded_today: latest.len(),
            response_rate: ratio(latest.len(), employees.len()),
        },
        critical_cases: cases,
        emergency_active: emergency_active(state).await?,
    };

    Ok(json_data(StatusCode::OK, &dashboard))
}

async fn employee_view(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    require_role(user.role, &[Role::Employee])?;
    let employee_id = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    let tasks = state.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
    let my_tasks = tasks.find_many(doc! { "assignedTo": employee_id }).await?;
    let completed = my_tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();

    let emergency_tasks = state
        .mongo
        .collection::<EmergencyTaskDoc>(EMERGENCY_TASK_COLLECTION)
        .await?;
    let my_emergency = emergency_tasks
        .find_many(doc! { "assignedTo": employee_id, "isActive": true })
        .await?;
    let emergency_completed = my_emergency
        .iter()
        .filter(|t| t.status == EmergencyTaskStatus::Completed)
        .count();

    // Derived on read, never stored: did this employee submit today?
    let day_start = start_of_local_day(chrono::Local::now());
    let forms = state
        .mongo
        .collection::<AssessmentFormDoc>(ASSESSMENT_FORM_COLLECTION)
        .await?;
    let submitted_today = forms
        .count(doc! {
            "employee": employee_id,
            "status": "submitted",
            "submittedAt": { "$gte": day_start },
        })
        .await?
        > 0;

    let has_pending_form = forms
        .find_one(doc! {
            "employee": employee_id,
            "triggered": true,
            "status": "pending",
        })
        .await?
        .is_some();

    let dashboard = EmployeeDashboard {
        department: user.department.clone(),
        status: user.status.clone(),
        tasks: AssignedCounts {
            total: my_tasks.len(),
            active: my_tasks.len() - completed,
            completed,
        },
        emergency_tasks: AssignedCounts {
            total: my_emergency.len(),
            active: my_emergency.len() - emergency_completed,
            completed: emergency_completed,
        },
        form_submitted_today: submitted_today,
        has_pending_form,
        emergency_active: emergency_active(state).await?,
    };

    Ok(json_data(StatusCode::OK, &dashboard))
}
