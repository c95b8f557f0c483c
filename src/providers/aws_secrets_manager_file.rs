//! `file_aws_secrets_manager`: a [`FileRefreshLoop`] sourced from AWS
//! Secrets Manager by a fixed `secret_id`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::SecretStoreClient;
use crate::error::ProviderError;
use crate::providers::file_loop::{FileRefreshLoop, PostProcess};
use crate::providers::SecretFetcher;

struct FixedIdSource {
    client: Arc<dyn SecretStoreClient>,
    secret_id: String,
}

#[async_trait]
impl SecretFetcher for FixedIdSource {
    async fn fetch_secret(&self) -> Result<String, ProviderError> {
        self.client.get_secret_value(&self.secret_id).await
    }
}

pub fn build(
    client: Arc<dyn SecretStoreClient>,
    secret_id: String,
    file_name: String,
    refresh_interval: Duration,
    post_process: PostProcess,
) -> Arc<FileRefreshLoop> {
    let source = Box::new(FixedIdSource { client, secret_id });
    Arc::new(FileRefreshLoop::new(file_name, refresh_interval, source, post_process))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockSecretStore;
    use crate::providers::FileProvider;

    #[tokio::test]
    async fn refresh_writes_secret_for_configured_id() {
        let store = Arc::new(MockSecretStore::new().with("s1", "secret-v1"));
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        let provider = build(
            store,
            "s1".to_string(),
            path.clone(),
            Duration::from_secs(60),
            PostProcess::None,
        );
        provider.refresh().await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "secret-v1");
    }
}
