//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each connection is
//! served on its own task; routing is a prefix match that hands the
//! remaining path to the matching route module.

use hyper::body::Incoming;
use hyper::header::HeaderValue;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::MongoClient;
use crate::error::HomefrontError;
use crate::routes::{self, full_body, BoxBody};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: MongoClient,
    pub jwt: JwtValidator,
}

impl AppState {
    pub fn new(args: Args, mongo: MongoClient) -> Self {
        let jwt = JwtValidator::new(&args.jwt_secret(), args.jwt_expiry_seconds);
        Self { args, mongo, jwt }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), HomefrontError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Homefront listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - error details exposed in responses");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("{} {} from {}", method, path, addr);

    if method == Method::OPTIONS {
        return Ok(preflight_response());
    }

    let response = match route(&state, req, &path).await {
        Ok(response) => response,
        Err(e) => routes::error_response(&e, state.args.dev_mode),
    };

    Ok(with_cors(response))
}

/// Match the path prefix when it is followed by a segment boundary
fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

async fn route(
    state: &AppState,
    req: Request<Incoming>,
    path: &str,
) -> Result<Response<BoxBody>, HomefrontError> {
    if path == "/health" || path == "/healthz" {
        return routes::health::health(req, state).await;
    }
    if path == "/version" {
        return routes::health::version(req, state).await;
    }

    if let Some(rest) = strip_prefix(path, "/auth") {
        return routes::auth_routes::handle(req, state, rest).await;
    }
    if let Some(rest) = strip_prefix(path, "/tasks") {
        return routes::tasks::handle(req, state, rest).await;
    }
    if let Some(rest) = strip_prefix(path, "/emergency") {
        return routes::emergency::handle(req, state, rest).await;
    }
    if let Some(rest) = strip_prefix(path, "/assessment") {
        return routes::assessment::handle(req, state, rest).await;
    }
    if let Some(rest) = strip_prefix(path, "/dashboard") {
        return routes::dashboard::handle(req, state, rest).await;
    }
    if let Some(rest) = strip_prefix(path, "/files") {
        return routes::files::handle(req, state, rest).await;
    }

    Err(HomefrontError::NotFound("Route not found".into()))
}

fn with_cors(mut response: Response<BoxBody>) -> Response<BoxBody> {
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Authorization, Content-Type"),
    );
    response
}

/// CORS preflight response
fn preflight_response() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "Authorization, Content-Type")
        .header(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        )
        .body(full_body(bytes::Bytes::new()))
        .unwrap_or_else(|_| Response::new(full_body(bytes::Bytes::new())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix_segment_boundary() {
        assert_eq!(strip_prefix("/tasks", "/tasks"), Some(""));
        assert_eq!(strip_prefix("/tasks/abc", "/tasks"), Some("/abc"));
        assert_eq!(strip_prefix("/tasksfoo", "/tasks"), None);
        assert_eq!(strip_prefix("/auth/login", "/auth"), Some("/login"));
    }
}
