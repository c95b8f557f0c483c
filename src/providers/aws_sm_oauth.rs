//! `proxy_awssm_oauth`: the end-to-end OAuth2 JWT-bearer pipeline (§4.6).
//!
//! `cache miss` → fetch private key → fetch certificate → mint JWT →
//! exchange for an access token → cache → return. Every leg's failure is
//! wrapped as [`ProviderError::unable_to_fetch`] at a distinct stage name
//! so callers can tell which leg failed without parsing a message.

use async_trait::async_trait;
use http::HeaderMap;
use serde_json::Map;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::cache::TtlLru;
use crate::clients::SecretStoreClient;
use crate::clock::Clock;
use crate::error::ProviderError;
use crate::http_client::RetryingHttpClient;
use crate::jwt;
use crate::oauth;
use crate::providers::{composite_key, delete_headers, HttpProvider, SecretFetcher};

const CERTIFICATE_ID_HEADER: &str = "x-hasura-certificate-id";
const OAUTH_CLIENT_ID_HEADER: &str = "x-hasura-oauth-client-id";
const BACKEND_ID_HEADER: &str = "x-hasura-backend-id";
const PRIVATE_KEY_ID_HEADER: &str = "x-hasura-private-key-id";

pub struct AwsSmOAuthProvider {
    secrets_manager: Arc<dyn SecretStoreClient>,
    certificates_manager: Arc<dyn SecretStoreClient>,
    http: Arc<dyn RetryingHttpClient>,
    token_cache: Arc<TtlLru<String, String>>,
    oauth_url: Url,
    jwt_claims: Map<String, serde_json::Value>,
    jwt_duration: Duration,
    clock: Arc<dyn Clock>,
}

impl AwsSmOAuthProvider {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        secrets_manager: Arc<dyn SecretStoreClient>,
        certificates_manager: Arc<dyn SecretStoreClient>,
        http: Arc<dyn RetryingHttpClient>,
        token_cache_ttl: Duration,
        token_cache_size: usize,
        oauth_url: Url,
        jwt_claims: Map<String, serde_json::Value>,
        jwt_duration: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secrets_manager,
            certificates_manager,
            http,
            token_cache: Arc::new(TtlLru::new(token_cache_size.max(1), token_cache_ttl)),
            oauth_url,
            jwt_claims,
            jwt_duration,
            clock,
        }
    }
}

impl HttpProvider for AwsSmOAuthProvider {
    fn secret_fetcher(&self, headers: &HeaderMap) -> Result<Box<dyn SecretFetcher>, ProviderError> {
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

        let certificate_secret_id = read(CERTIFICATE_ID_HEADER, "X-Hasura-Certificate-Id", &mut missing);
        let oauth_client_id = read(OAUTH_CLIENT_ID_HEADER, "X-Hasura-Oauth-Client-Id", &mut missing);
        let backend_api_id = read(BACKEND_ID_HEADER, "X-Hasura-Backend-Id", &mut missing);
        let private_key_secret_id = read(PRIVATE_KEY_ID_HEADER, "X-Hasura-Private-Key-Id", &mut missing);

        if !missing.is_empty() {
            return Err(ProviderError::HeaderMissing(missing.join(", ")));
        }

        Ok(Box::new(Fetcher {
            certificate_secret_id,
            oauth_client_id,
            backend_api_id,
            private_key_secret_id,
            secrets_manager: self.secrets_manager.clone(),
            certificates_manager: self.certificates_manager.clone(),
            http: self.http.clone(),
            token_cache: self.token_cache.clone(),
            oauth_url: self.oauth_url.clone(),
            jwt_claims: self.jwt_claims.clone(),
            jwt_duration: self.jwt_duration,
            clock: self.clock.clone(),
        }))
    }

    fn delete_config_headers(&self, headers: &mut HeaderMap) {
        delete_headers(
            headers,
            &[
                CERTIFICATE_ID_HEADER,
                OAUTH_CLIENT_ID_HEADER,
                BACKEND_ID_HEADER,
                PRIVATE_KEY_ID_HEADER,
            ],
        );
    }
}

struct Fetcher {
    certificate_secret_id: String,
    oauth_client_id: String,
    backend_api_id: String,
    private_key_secret_id: String,
    secrets_manager: Arc<dyn SecretStoreClient>,
    certificates_manager: Arc<dyn SecretStoreClient>,
    http: Arc<dyn RetryingHttpClient>,
    token_cache: Arc<TtlLru<String, String>>,
    oauth_url: Url,
    jwt_claims: Map<String, serde_json::Value>,
    jwt_duration: Duration,
    clock: Arc<dyn Clock>,
}

impl Fetcher {
    fn cache_key(&self) -> String {
        composite_key(&[
            &self.certificate_secret_id,
            &self.backend_api_id,
            &self.oauth_client_id,
            &self.private_key_secret_id,
        ])
    }
}

#[async_trait]
impl SecretFetcher for Fetcher {
    async fn fetch_secret(&self) -> Result<String, ProviderError> {
        let key = self.cache_key();
        if let Some(cached) = self.token_cache.get(&key) {
            return Ok(cached);
        }

        let private_key = self
            .secrets_manager
            .get_secret_value(&self.private_key_secret_id)
            .await
            .map_err(|e| ProviderError::unable_to_fetch("aws_sm_oauth.fetch_private_key", e))?;

        let certificate = self
            .certificates_manager
            .get_secret_value(&self.certificate_secret_id)
            .await
            .map_err(|e| ProviderError::unable_to_fetch("aws_sm_oauth.fetch_certificate", e))?;

        let jwt_token = jwt::mint(
            &private_key,
            Some(&certificate),
            &self.jwt_claims,
            self.jwt_duration,
            self.clock.as_ref(),
            &self.oauth_client_id,
        )
        .map_err(|e| ProviderError::unable_to_fetch("aws_sm_oauth.mint_jwt", e))?;

        let access_token = oauth::exchange(
            self.http.as_ref(),
            &self.oauth_url,
            &self.oauth_client_id,
            &jwt_token,
            &self.backend_api_id,
        )
        .await
        .map_err(|e| ProviderError::unable_to_fetch("aws_sm_oauth.oauth_exchange", e))?;

        self.token_cache.put(key, access_token.clone());
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockSecretStore;
    use crate::clock::FixedClock;
    use crate::http_client::{HttpResult, MockRetryingHttpClient};
    use http::HeaderValue;
    use serde_json::json;

    const TEST_PRIVATE_KEY: &str = include_str!("../../tests/fixtures/test_rsa_key.pem");
    const TEST_CERT: &str = include_str!("../../tests/fixtures/test_cert.pem");

    fn headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(CERTIFICATE_ID_HEADER, HeaderValue::from_static("c1"));
        h.insert(OAUTH_CLIENT_ID_HEADER, HeaderValue::from_static("o1"));
        h.insert(BACKEND_ID_HEADER, HeaderValue::from_static("b1"));
        h.insert(PRIVATE_KEY_ID_HEADER, HeaderValue::from_static("k1"));
        h
    }

    fn provider(http: Arc<dyn RetryingHttpClient>) -> AwsSmOAuthProvider {
        let secrets = Arc::new(
            MockSecretStore::new()
                .with("k1", TEST_PRIVATE_KEY)
                .with("c1", TEST_CERT),
        );
        AwsSmOAuthProvider::new(
            secrets.clone(),
            secrets,
            http,
            Duration::from_secs(300),
            10,
            Url::parse("https://oauth.example.com/token").unwrap(),
            json!({"scope": "read"}).as_object().unwrap().clone(),
            Duration::from_secs(300),
            Arc::new(FixedClock::new(1_700_000_000)),
        )
    }

    #[tokio::test]
    async fn missing_headers_lists_all_absent_names() {
        let mock_http = Arc::new(MockRetryingHttpClient::with_form_response(HttpResult {
            status: 200,
            body: r#"{"access_token":"A1"}"#.to_string(),
        }));
        let provider = provider(mock_http);
        let err = provider.secret_fetcher(&HeaderMap::new()).unwrap_err();
        match err {
            ProviderError::HeaderMissing(msg) => {
                assert!(msg.contains("X-Hasura-Certificate-Id"));
                assert!(msg.contains("X-Hasura-Oauth-Client-Id"));
                assert!(msg.contains("X-Hasura-Backend-Id"));
                assert!(msg.contains("X-Hasura-Private-Key-Id"));
            }
            other => panic!("expected HeaderMissing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn end_to_end_pipeline_returns_access_token() {
        let mock_http = Arc::new(MockRetryingHttpClient::with_form_response(HttpResult {
            status: 200,
            body: r#"{"access_token":"A1"}"#.to_string(),
        }));
        let provider = provider(mock_http);
        let fetcher = provider.secret_fetcher(&headers()).unwrap();
        assert_eq!(fetcher.fetch_secret().await.unwrap(), "A1");
    }

    #[tokio::test]
    async fn second_request_with_same_directives_hits_cache_not_oauth() {
        let mock_http = Arc::new(MockRetryingHttpClient::with_form_response(HttpResult {
            status: 200,
            body: r#"{"access_token":"A1"}"#.to_string(),
        }));
        let provider = provider(mock_http.clone());

        let fetcher1 = provider.secret_fetcher(&headers()).unwrap();
        assert_eq!(fetcher1.fetch_secret().await.unwrap(), "A1");

        let fetcher2 = provider.secret_fetcher(&headers()).unwrap();
        assert_eq!(fetcher2.fetch_secret().await.unwrap(), "A1");

        assert_eq!(mock_http.calls(), 1);
    }

    #[tokio::test]
    async fn delete_config_headers_strips_all_four() {
        let mock_http = Arc::new(MockRetryingHttpClient::with_form_response(HttpResult {
            status: 200,
            body: r#"{"access_token":"A1"}"#.to_string(),
        }));
        let provider = provider(mock_http);
        let mut h = headers();
        provider.delete_config_headers(&mut h);
        assert!(h.is_empty());
    }
}
