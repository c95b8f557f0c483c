//! `azure_key_vault`: per-request Azure Key Vault fetch, mirroring
//! [`crate::providers::aws_secrets_manager`] with the Azure directive
//! header and client.

use async_trait::async_trait;
use http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlLru;
use crate::clients::SecretStoreClient;
use crate::error::ProviderError;
use crate::providers::{delete_headers, HttpProvider, SecretFetcher};

const SECRET_NAME_HEADER: &str = "x-hasura-secret-name";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct AzureKeyVaultProvider {
    client: Arc<dyn SecretStoreClient>,
    cache: Arc<TtlLru<String, String>>,
}

impl AzureKeyVaultProvider {
    pub fn new(client: Arc<dyn SecretStoreClient>, cache_ttl: Option<Duration>, cache_size: usize) -> Self {
        Self {
            client,
            cache: Arc::new(TtlLru::new(cache_size.max(1), cache_ttl.unwrap_or(DEFAULT_CACHE_TTL))),
        }
    }
}

impl HttpProvider for AzureKeyVaultProvider {
    fn secret_fetcher(&self, headers: &HeaderMap) -> Result<Box<dyn SecretFetcher>, ProviderError> {
        let secret_name = headers
            .get(SECRET_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ProviderError::HeaderMissing("X-Hasura-Secret-Name".to_string()))?
            .to_string();

        Ok(Box::new(Fetcher {
            secret_name,
            client: self.client.clone(),
            cache: self.cache.clone(),
        }))
    }

    fn delete_config_headers(&self, headers: &mut HeaderMap) {
        delete_headers(headers, &[SECRET_NAME_HEADER]);
    }
}

struct Fetcher {
    secret_name: String,
    client: Arc<dyn SecretStoreClient>,
    cache: Arc<TtlLru<String, String>>,
}

#[async_trait]
impl SecretFetcher for Fetcher {
    async fn fetch_secret(&self) -> Result<String, ProviderError> {
        if let Some(cached) = self.cache.get(&self.secret_name) {
            return Ok(cached);
        }
        let value = self.client.get_secret_value(&self.secret_name).await?;
        self.cache.put(self.secret_name.clone(), value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockSecretStore;
    use http::HeaderValue;

    fn headers_with_name(name: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SECRET_NAME_HEADER, HeaderValue::from_str(name).unwrap());
        headers
    }

    #[tokio::test]
    async fn missing_header_is_header_missing() {
        let provider = AzureKeyVaultProvider::new(Arc::new(MockSecretStore::new()), None, 10);
        let err = provider.secret_fetcher(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ProviderError::HeaderMissing(_)));
    }

    #[tokio::test]
    async fn fetches_and_caches_by_secret_name() {
        let store = Arc::new(MockSecretStore::new().with("db-password", "hunter2"));
        let provider = AzureKeyVaultProvider::new(store.clone(), Some(Duration::from_secs(60)), 10);

        let fetcher = provider.secret_fetcher(&headers_with_name("db-password")).unwrap();
        assert_eq!(fetcher.fetch_secret().await.unwrap(), "hunter2");

        let fetcher2 = provider.secret_fetcher(&headers_with_name("db-password")).unwrap();
        assert_eq!(fetcher2.fetch_secret().await.unwrap(), "hunter2");
        assert_eq!(store.call_count(), 1);
    }
}
