//! RFC 7523 JWT-bearer token exchange.
//!
//! POSTs a fixed, five-field `application/x-www-form-urlencoded` body to
//! the configured OAuth URL and extracts `access_token` from the JSON
//! response. The `Accept: application/x-www-form-url-encoded` header is
//! a literal typo in the wire format this proxy talks to upstream and is
//! retained verbatim for compatibility (§4.4).

use crate::error::OAuthError;
use crate::http_client::RetryingHttpClient;
use std::collections::HashMap;
use url::Url;

const GRANT_TYPE: &str = "client_credentials";
const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Exchange a signed JWT client assertion for an access token.
pub async fn exchange(
    http: &dyn RetryingHttpClient,
    oauth_url: &Url,
    client_id: &str,
    jwt: &str,
    resource: &str,
) -> Result<String, OAuthError> {
    let mut form = HashMap::new();
    form.insert("grant_type", GRANT_TYPE);
    form.insert("client_assertion_type", CLIENT_ASSERTION_TYPE);
    form.insert("client_id", client_id);
    form.insert("client_assertion", jwt);
    form.insert("resource", resource);

    let response = http
        .post_form(
            oauth_url.clone(),
            &form,
            &[
                ("Content-Type", "application/x-www-form-urlencoded"),
                ("Accept", "application/x-www-form-url-encoded"),
            ],
        )
        .await?;

    if response.status != 200 {
        return Err(OAuthError::StatusError {
            status: response.status,
            body: response.body,
        });
    }

    let parsed: serde_json::Value = serde_json::from_str(&response.body)
        .map_err(|e| OAuthError::MalformedResponse(e.to_string()))?;

    match parsed.get("access_token") {
        Some(serde_json::Value::String(token)) => Ok(token.clone()),
        Some(_) => Err(OAuthError::MalformedResponse(
            "access_token is present but not a string".to_string(),
        )),
        None => Err(OAuthError::MalformedResponse(
            "access_token not found in oauth response".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpResult, MockRetryingHttpClient};

    #[tokio::test]
    async fn happy_path_extracts_access_token() {
        let mock = MockRetryingHttpClient::with_form_response(HttpResult {
            status: 200,
            body: r#"{"access_token":"A1"}"#.to_string(),
        });
        let url = Url::parse("https://oauth.example.com/token").unwrap();
        let token = exchange(&mock, &url, "client-1", "jwt-token", "backend-1")
            .await
            .unwrap();
        assert_eq!(token, "A1");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn non_200_is_status_error() {
        let mock = MockRetryingHttpClient::with_form_response(HttpResult {
            status: 500,
            body: "boom".to_string(),
        });
        let url = Url::parse("https://oauth.example.com/token").unwrap();
        let err = exchange(&mock, &url, "client-1", "jwt-token", "backend-1")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::StatusError { status: 500, .. }));
    }

    #[tokio::test]
    async fn missing_access_token_is_malformed() {
        let mock = MockRetryingHttpClient::with_form_response(HttpResult {
            status: 200,
            body: r#"{"nope":true}"#.to_string(),
        });
        let url = Url::parse("https://oauth.example.com/token").unwrap();
        let err = exchange(&mock, &url, "client-1", "jwt-token", "backend-1")
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::MalformedResponse(_)));
    }
}
