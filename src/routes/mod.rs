//! HTTP route handlers
//!
//! Every handler speaks the uniform envelope `{success, message?, data?,
//! error?}` and returns a typed error that the server boundary maps to a
//! status code. Authentication resolves the bearer token to a live User
//! record; the token's role claim is never trusted on its own.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::auth::jwt::extract_token_from_header;
use crate::db::schemas::{UserDoc, USER_COLLECTION};
use crate::error::HomefrontError;
use crate::server::AppState;

pub mod assessment;
pub mod auth_routes;
pub mod dashboard;
pub mod emergency;
pub mod files;
pub mod health;
pub mod tasks;

/// Boxed response body type used by all handlers
pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Request bodies larger than this are rejected. Generous because note
/// attachments arrive base64-encoded in the JSON body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build a boxed body from bytes
pub fn full_body(bytes: Bytes) -> BoxBody {
    Full::new(bytes).map_err(|never| match never {}).boxed()
}

fn envelope_response(status: StatusCode, envelope: Value) -> Response<BoxBody> {
    let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| b"{}".to_vec());

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(full_body(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(full_body(Bytes::new())))
}

/// Success envelope with a data payload
pub fn json_data<T: Serialize>(status: StatusCode, data: &T) -> Response<BoxBody> {
    let payload = serde_json::to_value(data).unwrap_or(Value::Null);
    envelope_response(status, json!({ "success": true, "data": payload }))
}

/// Success envelope with a message and a data payload
pub fn json_message_data<T: Serialize>(
    status: StatusCode,
    message: &str,
    data: &T,
) -> Response<BoxBody> {
    let payload = serde_json::to_value(data).unwrap_or(Value::Null);
    envelope_response(
        status,
        json!({ "success": true, "message": message, "data": payload }),
    )
}

/// Success envelope with only a message
pub fn json_message(status: StatusCode, message: &str) -> Response<BoxBody> {
    envelope_response(status, json!({ "success": true, "message": message }))
}

/// Map a typed error to its status code and failure envelope. Store
/// failures hide their detail unless dev_mode is on.
pub fn error_response(err: &HomefrontError, dev_mode: bool) -> Response<BoxBody> {
    let status = err.status_code();

    let envelope = if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!("internal error: {}", err);
        if dev_mode {
            json!({ "success": false, "message": "Internal server error", "error": err.to_string() })
        } else {
            json!({ "success": false, "message": "Internal server error" })
        }
    } else {
        json!({ "success": false, "message": err.to_string() })
    };

    envelope_response(status, envelope)
}

/// Plain 404 for unmatched paths
pub fn not_found() -> Response<BoxBody> {
    envelope_response(
        StatusCode::NOT_FOUND,
        json!({ "success": false, "message": "Route not found" }),
    )
}

/// Whether the declared Content-Length already exceeds the body limit
fn declares_oversized_body<B>(req: &Request<B>) -> bool {
    req.headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| len > MAX_BODY_BYTES as u64)
}

/// Collect and deserialize a JSON request body. Oversized requests are
/// rejected on the declared length before any buffering; the post-collect
/// check covers chunked bodies with no declared length.
pub async fn parse_json_body<T: DeserializeOwned>(
    req: Request<Incoming>,
) -> Result<T, HomefrontError> {
    if declares_oversized_body(&req) {
        return Err(HomefrontError::Validation("Request body too large".into()));
    }

    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| HomefrontError::Http(format!("Failed to read request body: {}", e)))?
        .to_bytes();

    if body.len() > MAX_BODY_BYTES {
        return Err(HomefrontError::Validation("Request body too large".into()));
    }

    serde_json::from_slice(&body)
        .map_err(|e| HomefrontError::Validation(format!("Invalid JSON body: {}", e)))
}

/// Resolve the bearer token to a live User record
pub async fn authenticate(
    req: &Request<Incoming>,
    state: &AppState,
) -> Result<UserDoc, HomefrontError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_token_from_header(header)
        .ok_or_else(|| HomefrontError::Authentication("Not authorized, no token".into()))?;

    let result = state.jwt.verify_token(token);
    let claims = result
        .claims
        .ok_or_else(|| HomefrontError::Authentication("Not authorized, token failed".into()))?;

    let user_id = bson::oid::ObjectId::parse_str(&claims.sub)
        .map_err(|_| HomefrontError::Authentication("Not authorized, token failed".into()))?;

    let users = state.mongo.collection::<UserDoc>(USER_COLLECTION).await?;
    users
        .find_one(bson::doc! { "_id": user_id })
        .await?
        .ok_or_else(|| HomefrontError::Authentication("User no longer exists".into()))
}

/// Format an optional BSON timestamp as RFC 3339 for API responses
pub fn rfc3339(dt: Option<bson::DateTime>) -> Option<String> {
    dt.and_then(|d| d.try_to_rfc3339_string().ok())
}

/// Parse a path segment as an ObjectId, mapping failure to a 400
pub fn parse_object_id(segment: &str, what: &str) -> Result<bson::oid::ObjectId, HomefrontError> {
    bson::oid::ObjectId::parse_str(segment)
        .map_err(|_| HomefrontError::Validation(format!("Invalid {} id", what)))
}

/// Extract a query-string parameter, percent-decoded
pub fn query_param(uri: &hyper::Uri, key: &str) -> Option<String> {
    uri.query()?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| percent_decode(v))
    })
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("hello+world"), "hello world");
        assert_eq!(percent_decode("%D7%93%D7%95%D7%97.pdf"), "דוח.pdf");
        assert_eq!(percent_decode("plain"), "plain");
        // malformed escapes pass through
        assert_eq!(percent_decode("50%"), "50%");
    }

    #[test]
    fn test_query_param() {
        let uri: hyper::Uri = "/files/abc.pdf?name=report%20q1.pdf&x=1".parse().unwrap();
        assert_eq!(query_param(&uri, "name"), Some("report q1.pdf".to_string()));
        assert_eq!(query_param(&uri, "x"), Some("1".to_string()));
        assert_eq!(query_param(&uri, "missing"), None);
    }

    #[test]
    fn test_declared_body_size_limit() {
        let oversized = Request::builder()
            .header(CONTENT_LENGTH, (MAX_BODY_BYTES + 1).to_string())
            .body(())
            .unwrap();
        assert!(declares_oversized_body(&oversized));

        let fine = Request::builder()
            .header(CONTENT_LENGTH, "512")
            .body(())
            .unwrap();
        assert!(!declares_oversized_body(&fine));

        // chunked requests carry no length; the post-collect check applies
        let chunked = Request::builder().body(()).unwrap();
        assert!(!declares_oversized_body(&chunked));
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("64b1f0a0c2d3e4f5a6b7c8d9", "task").is_ok());
        assert!(parse_object_id("nope", "task").is_err());
    }
}
