//! `POST /refresh` (§4.11): refreshes every file provider whose
//! `file_name()` matches the requested filename, forward-slash normalized.
//! The first failure short-circuits and returns 500.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::providers::ProviderRegistry;

#[derive(Deserialize)]
pub struct RefreshRequest {
    filename: Option<String>,
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Routed for every method (§4.11: non-POST is a 400, not axum's default
/// 405) so the method check happens inside the handler, before the body is
/// even parsed as JSON.
pub async fn handle(method: Method, State(registry): State<ProviderRegistry>, body: Bytes) -> impl IntoResponse {
    if method != Method::POST {
        return StatusCode::BAD_REQUEST;
    }
    let Ok(body) = serde_json::from_slice::<RefreshRequest>(&body) else {
        return StatusCode::BAD_REQUEST;
    };
    let Some(filename) = body.filename else {
        return StatusCode::BAD_REQUEST;
    };
    if filename.is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    let wanted = normalize(&filename);

    let matching = registry
        .file_providers()
        .into_iter()
        .filter(|p| normalize(p.file_name()) == wanted)
        .collect::<Vec<_>>();

    for provider in matching {
        if let Err(e) = provider.refresh().await {
            tracing::error!(file = %provider.file_name(), error = %e, "on-demand refresh failed");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    }

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_converts_backslashes_to_forward_slashes() {
        assert_eq!(normalize(r"a\b\c"), "a/b/c");
        assert_eq!(normalize("/a/b"), "/a/b");
    }
}
