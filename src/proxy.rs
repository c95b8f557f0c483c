//! The proxy rewriter: a per-request S0–S6 state machine (§4.10).
//!
//! Every state transitions to a 400 with the Hasura error envelope on
//! failure; only S6 produces an outbound request. Destination URL
//! resolution keeps only the directive's scheme and host — the inbound
//! path and query always survive into the outbound request.

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::str::FromStr;
use url::Url;

use crate::error::ProxyError;
use crate::providers::ProviderRegistry;
use crate::template;

const FORWARD_TO_HEADER: &str = "x-hasura-forward-to";
const SECRET_PROVIDER_HEADER: &str = "x-hasura-secret-provider";
const SECRET_HEADER_HEADER: &str = "x-hasura-secret-header";

const CORE_DIRECTIVE_HEADERS: [&str; 3] = [FORWARD_TO_HEADER, SECRET_PROVIDER_HEADER, SECRET_HEADER_HEADER];

#[derive(Clone)]
pub struct ProxyState {
    pub registry: ProviderRegistry,
    pub forwarding_client: reqwest::Client,
}

#[derive(Serialize)]
struct HasuraErrorExtensions {
    code: &'static str,
}

#[derive(Serialize)]
struct HasuraError {
    message: String,
    extensions: HasuraErrorExtensions,
}

fn hasura_error_response(err: ProxyError) -> Response {
    tracing::error!(code = err.error_code(), error = %err, "proxy request failed");
    let body = HasuraError {
        message: err.to_string(),
        extensions: HasuraErrorExtensions { code: "hasura-error" },
    };
    (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
}

struct Directives {
    destination_url: String,
    provider_name: String,
    header_template: String,
}

/// S0: parse the three core directive headers. Missing headers accumulate
/// by *name* (§9: a prior revision appended values, a documented bug).
fn parse_directives(headers: &HeaderMap) -> Result<Directives, ProxyError> {
    let mut missing = Vec::new();
    let read = |name: &str, label: &str, missing: &mut Vec<String>| -> String {
        match headers.get(name).and_then(|v| v.to_str().ok()) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => {
                missing.push(label.to_string());
                String::new()
            }
        }
    };

    let destination_url = read(FORWARD_TO_HEADER, "X-Hasura-Forward-To", &mut missing);
    let provider_name = read(SECRET_PROVIDER_HEADER, "X-Hasura-Secret-Provider", &mut missing);
    let header_template = read(SECRET_HEADER_HEADER, "X-Hasura-Secret-Header", &mut missing);

    if !missing.is_empty() {
        return Err(ProxyError::HeaderMissing(missing.join(", ")));
    }

    Ok(Directives {
        destination_url,
        provider_name,
        header_template,
    })
}

/// S1: parse the destination URL, keeping only scheme and host.
fn parse_destination(raw: &str) -> Result<Url, ProxyError> {
    let url = Url::parse(raw).map_err(|e| ProxyError::UrlInvalid(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ProxyError::UrlInvalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map(|h| h.is_empty()).unwrap_or(true) {
        return Err(ProxyError::UrlInvalid("destination url has no host".to_string()));
    }
    Ok(url)
}

/// S6: combine the destination's scheme+host with the inbound path+query.
fn outbound_url(destination: &Url, inbound_path_and_query: &str) -> String {
    let host = destination.host_str().unwrap_or_default();
    match destination.port() {
        Some(port) => format!("{}://{}:{}{}", destination.scheme(), host, port, inbound_path_and_query),
        None => format!("{}://{}{}", destination.scheme(), host, inbound_path_and_query),
    }
}

pub async fn handle(State(state): State<ProxyState>, request: axum::extract::Request) -> Response {
    match handle_inner(state, request).await {
        Ok(response) => response,
        Err(err) => hasura_error_response(err),
    }
}

async fn handle_inner(state: ProxyState, request: axum::extract::Request) -> Result<Response, ProxyError> {
    let method = request.method().clone();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let mut headers = request.headers().clone();
    let body_bytes = to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| ProxyError::UrlInvalid(format!("unable to buffer request body: {e}")))?;

    // S0
    let directives = parse_directives(&headers)?;
    // S1
    let destination = parse_destination(&directives.destination_url)?;
    // S2
    let provider = state
        .registry
        .get_http(&directives.provider_name)
        .ok_or_else(|| ProxyError::ProviderUnknown(directives.provider_name.clone()))?;
    // S3
    let fetcher = provider.secret_fetcher(&headers)?;
    // S4
    let secret = fetcher.fetch_secret().await?;
    // S5
    let (header_name, header_value) = template::header_from_template(&directives.header_template, &secret)
        .map_err(ProxyError::TemplateMalformed)?;

    // S6: strip directive headers, provider-specific headers, inject composed header.
    for name in CORE_DIRECTIVE_HEADERS {
        headers.remove(name);
    }
    provider.delete_config_headers(&mut headers);
    let name = HeaderName::from_str(&header_name).map_err(|e| ProxyError::TemplateMalformed(e.to_string()))?;
    let value = HeaderValue::from_str(&header_value).map_err(|e| ProxyError::TemplateMalformed(e.to_string()))?;
    headers.insert(name, value);

    let target = outbound_url(&destination, &path_and_query);
    tracing::debug!(%target, "forwarding request to backend");

    let upstream_response = state
        .forwarding_client
        .request(method, &target)
        .headers(headers)
        .body(body_bytes)
        .send()
        .await
        .map_err(|e| ProxyError::Provider(crate::error::ProviderError::unable_to_fetch("proxy.forward", e)))?;

    let status = upstream_response.status();
    let response_headers = upstream_response.headers().clone();
    let response_bytes = upstream_response
        .bytes()
        .await
        .map_err(|e| ProxyError::Provider(crate::error::ProviderError::unable_to_fetch("proxy.read_response", e)))?;

    let mut response = Response::builder().status(status);
    for (name, value) in response_headers.iter() {
        response = response.header(name, value);
    }
    Ok(response.body(Body::from(response_bytes)).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_url_preserves_path_and_query() {
        let destination = Url::parse("http://backend:8080").unwrap();
        assert_eq!(
            outbound_url(&destination, "/api/x?a=1"),
            "http://backend:8080/api/x?a=1"
        );
    }

    #[test]
    fn outbound_url_without_explicit_port() {
        let destination = Url::parse("https://backend").unwrap();
        assert_eq!(outbound_url(&destination, "/p"), "https://backend/p");
    }

    #[test]
    fn parse_directives_lists_missing_header_names() {
        let err = parse_directives(&HeaderMap::new()).unwrap_err();
        match err {
            ProxyError::HeaderMissing(msg) => {
                assert!(msg.contains("X-Hasura-Forward-To"));
                assert!(msg.contains("X-Hasura-Secret-Provider"));
                assert!(msg.contains("X-Hasura-Secret-Header"));
            }
            other => panic!("expected HeaderMissing, got {other:?}"),
        }
    }

    #[test]
    fn parse_destination_rejects_unsupported_scheme() {
        assert!(parse_destination("ftp://backend").is_err());
    }

    #[test]
    fn parse_destination_accepts_http_and_https() {
        assert!(parse_destination("http://backend:80").is_ok());
        assert!(parse_destination("https://backend").is_ok());
    }
}
