//! `proxy_aws_secrets_manager`: per-request AWS Secrets Manager fetch (§4.7).

use async_trait::async_trait;
use http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlLru;
use crate::clients::SecretStoreClient;
use crate::error::ProviderError;
use crate::providers::{delete_headers, HttpProvider, SecretFetcher};

const SECRET_ID_HEADER: &str = "x-hasura-secret-id";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct AwsSecretsManagerProvider {
    client: Arc<dyn SecretStoreClient>,
    cache: Arc<TtlLru<String, String>>,
}

impl AwsSecretsManagerProvider {
    pub fn new(client: Arc<dyn SecretStoreClient>, cache_ttl: Option<Duration>, cache_size: usize) -> Self {
        Self {
            client,
            cache: Arc::new(TtlLru::new(cache_size.max(1), cache_ttl.unwrap_or(DEFAULT_CACHE_TTL))),
        }
    }
}

impl HttpProvider for AwsSecretsManagerProvider {
    fn secret_fetcher(&self, headers: &HeaderMap) -> Result<Box<dyn SecretFetcher>, ProviderError> {
        let secret_id = headers
            .get(SECRET_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ProviderError::HeaderMissing("X-Hasura-Secret-Id".to_string()))?
            .to_string();

        Ok(Box::new(Fetcher {
            secret_id,
            client: self.client.clone(),
            cache: self.cache.clone(),
        }))
    }

    fn delete_config_headers(&self, headers: &mut HeaderMap) {
        delete_headers(headers, &[SECRET_ID_HEADER]);
    }
}

struct Fetcher {
    secret_id: String,
    client: Arc<dyn SecretStoreClient>,
    cache: Arc<TtlLru<String, String>>,
}

#[async_trait]
impl SecretFetcher for Fetcher {
    async fn fetch_secret(&self) -> Result<String, ProviderError> {
        if let Some(cached) = self.cache.get(&self.secret_id) {
            return Ok(cached);
        }
        let value = self.client.get_secret_value(&self.secret_id).await?;
        self.cache.put(self.secret_id.clone(), value.clone());
        Ok(value)
    }
}
