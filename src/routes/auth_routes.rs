//! Registration, login, and current-user endpoints
//!
//! Responses carry a sanitized user view; the password hash never leaves
//! the users collection.

use bson::doc;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::Role;
use crate::db::schemas::{
    EmergencyContact, Preferences, UserDoc, UserStatus, USER_COLLECTION,
};
use crate::error::HomefrontError;
use crate::routes::{authenticate, json_data, json_message_data, parse_json_body, BoxBody};
use crate::server::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    role: Role,
    department: String,
    phone_number: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// User projection returned by auth endpoints; no credential material
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    pub status: UserStatus,
    pub preferences: Preferences,
}

impl UserView {
    pub fn from_doc(user: &UserDoc) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            department: user.department.clone(),
            phone_number: user.phone_number.clone(),
            emergency_contact: user.emergency_contact.clone(),
            status: user.status.clone(),
            preferences: user.preferences.clone(),
        }
    }
}

#[derive(Serialize)]
struct AuthPayload {
    token: String,
    user: UserView,
}

/// Route auth requests by method and remaining path
pub async fn handle(
    req: Request<Incoming>,
    state: &AppState,
    rest: &str,
) -> Result<Response<BoxBody>, HomefrontError> {
    match (req.method(), rest) {
        (&Method::POST, "/register") => register(req, state).await,
        (&Method::POST, "/login") => login(req, state).await,
        (&Method::GET, "/me") => me(req, state).await,
        _ => Err(HomefrontError::NotFound("Route not found".into())),
    }
}

async fn register(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let body: RegisterRequest = parse_json_body(req).await?;

    if body.name.trim().is_empty() || body.department.trim().is_empty() {
        return Err(HomefrontError::Validation(
            "name and department are required".into(),
        ));
    }
    if body.email.trim().is_empty() || !body.email.contains('@') {
        return Err(HomefrontError::Validation("A valid email is required".into()));
    }
    if body.password.len() < 6 {
        return Err(HomefrontError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;

    if users.find_one(doc! { "email": &body.email }).await?.is_some() {
        return Err(HomefrontError::Validation("User already exists".into()));
    }

    let password_hash = hash_password(&body.password)?;
    let mut user = UserDoc::new(
        body.name,
        body.email,
        password_hash,
        body.role,
        body.department,
        body.phone_number,
    );

    let id = users.insert_one(user.clone()).await?;
    user.id = Some(id);

    info!("Registered user {} ({})", user.email, user.role);

    let token = state.jwt.generate_token(&id.to_hex(), user.role)?;
    let payload = AuthPayload {
        token,
        user: UserView::from_doc(&user),
    };

    Ok(json_message_data(
        StatusCode::CREATED,
        "User registered successfully",
        &payload,
    ))
}

async fn login(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let body: LoginRequest = parse_json_body(req).await?;

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    let user = users
        .find_one(doc! { "email": &body.email })
        .await?
        .ok_or_else(|| HomefrontError::Authentication("Invalid email or password".into()))?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(HomefrontError::Authentication(
            "Invalid email or password".into(),
        ));
    }

    let user_id = user
        .id
        .ok_or_else(|| HomefrontError::Database("User record missing id".into()))?;

    info!("User {} logged in", user.email);

    let token = state.jwt.generate_token(&user_id.to_hex(), user.role)?;
    let payload = AuthPayload {
        token,
        user: UserView::from_doc(&user),
    };

    Ok(json_data(StatusCode::OK, &payload))
}

async fn me(
    req: Request<Incoming>,
    state: &AppState,
) -> Result<Response<BoxBody>, HomefrontError> {
    let user = authenticate(&req, state).await?;
    Ok(json_data(StatusCode::OK, &UserView::from_doc(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_view_has_no_password_hash() {
        let user = UserDoc::new(
            "Dana".into(),
            "dana@example.com".into(),
            "$argon2id$...".into(),
            Role::Employee,
            "family".into(),
            None,
        );
        let json = serde_json::to_value(UserView::from_doc(&user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "dana@example.com");
        assert_eq!(json["role"], "employee");
    }
}
