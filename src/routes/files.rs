//! Attachment download endpoint
//!
//! Serves files written by the note-upload path to authenticated
//! callers. Stored names are server-generated UUIDs, so anything
//! containing a path separator is rejected before touching the
//! filesystem. The optional `name` query parameter restores the
//! client's original filename in the Content-Disposition header.

use bytes::Bytes;
use hyper::body::Incoming;
use hyper::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use std::path::Path;

use crate::error::HomefrontError;
use crate::routes::{authenticate, full_body, query_param, BoxBody};
use crate::server::AppState;

/// Content types served inline by extension; everything else downloads
/// as a generic binary
pub fn content_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("txt") => "text/plain; charset=utf-8",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        _ => "application/octet-stream",
    }
}

/// Reject anything that could escape the upload directory
pub fn is_safe_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.starts_with('.')
}

/// Route file requests; `rest` is the path after `/files`
pub async fn handle(
    req: Request<Incoming>,
    state: &AppState,
    rest: &str,
) -> Result<Response<BoxBody>, HomefrontError> {
    if req.method() != Method::GET {
        return Err(HomefrontError::NotFound("Route not found".into()));
    }

    authenticate(&req, state).await?;

    let stored_name = rest.trim_matches('/');
    if !is_safe_stored_name(stored_name) {
        return Err(HomefrontError::Validation("Invalid file name".into()));
    }

    let path = Path::new(&state.args.upload_dir).join(stored_name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HomefrontError::NotFound("File not found".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let display_name = query_param(req.uri(), "name")
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| stored_name.to_string());

    // RFC 5987 encoding so non-ASCII original names survive the header
    let encoded_name: String = display_name
        .bytes()
        .flat_map(|b| {
            if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_') {
                vec![b as char]
            } else {
                format!("%{:02X}", b).chars().collect()
            }
        })
        .collect();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type_for(&display_name))
        .header(
            CONTENT_DISPOSITION,
            format!("inline; filename*=UTF-8''{}", encoded_name),
        )
        .body(full_body(Bytes::from(bytes)))
        .map_err(|e| HomefrontError::Http(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("report.pdf"), "application/pdf");
        assert_eq!(content_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("sheet.xlsx"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet");
        assert_eq!(content_type_for("unknown.bin"), "application/octet-stream");
        assert_eq!(content_type_for("no-extension"), "application/octet-stream");
    }

    #[test]
    fn test_stored_name_safety() {
        assert!(is_safe_stored_name("550e8400-e29b-41d4-a716-446655440000.pdf"));
        assert!(!is_safe_stored_name("../../etc/passwd"));
        assert!(!is_safe_stored_name("a/b.pdf"));
        assert!(!is_safe_stored_name("a\\b.pdf"));
        assert!(!is_safe_stored_name(".hidden"));
        assert!(!is_safe_stored_name(""));
    }
}
