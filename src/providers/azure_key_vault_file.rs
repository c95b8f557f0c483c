//! `file_azure_key_vault`: a [`FileRefreshLoop`] sourced from Azure Key
//! Vault by a fixed `secret_name`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::SecretStoreClient;
use crate::error::ProviderError;
use crate::providers::file_loop::{FileRefreshLoop, PostProcess};
use crate::providers::SecretFetcher;

struct FixedNameSource {
    client: Arc<dyn SecretStoreClient>,
    secret_name: String,
}

#[async_trait]
impl SecretFetcher for FixedNameSource {
    async fn fetch_secret(&self) -> Result<String, ProviderError> {
        self.client.get_secret_value(&self.secret_name).await
    }
}

pub fn build(
    client: Arc<dyn SecretStoreClient>,
    secret_name: String,
    file_name: String,
    refresh_interval: Duration,
    post_process: PostProcess,
) -> Arc<FileRefreshLoop> {
    let source = Box::new(FixedNameSource { client, secret_name });
    Arc::new(FileRefreshLoop::new(file_name, refresh_interval, source, post_process))
}
