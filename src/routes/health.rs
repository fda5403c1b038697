//! Health and version endpoints, unauthenticated

use bson::doc;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;

use crate::error::HomefrontError;
use crate::routes::{json_data, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthPayload {
    status: &'static str,
    database: &'static str,
    version: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionPayload {
    version: &'static str,
    commit: &'static str,
    built_at: &'static str,
}

/// Liveness probe; also pings the store
pub async fn health(
    _req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let database = match state
        .mongo
        .inner()
        .database(state.mongo.db_name())
        .run_command(doc! { "ping": 1 })
        .await
    {
        Ok(_) => "connected",
        Err(_) => "unreachable",
    };

    let payload = HealthPayload {
        status: "ok",
        database,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    Ok(json_data(StatusCode::OK, &payload))
}

/// Build information baked in at compile time
pub async fn version(
    _req: Request<Incoming>,
    _state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let payload = VersionPayload {
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GIT_COMMIT_SHORT"),
        built_at: env!("BUILD_TIMESTAMP"),
    };

    Ok(json_data(StatusCode::OK, &payload))
}
