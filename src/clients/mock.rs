//! Shared in-memory [`SecretStoreClient`] test double, used by provider
//! unit tests across `aws_secrets_manager`, `aws_sm_oauth`, and
//! `azure_key_vault` so none of them needs real cloud credentials.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::SecretStoreClient;
use crate::error::ProviderError;

pub struct MockSecretStore {
    values: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl MockSecretStore {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(self, id: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(id.to_string(), value.to_string());
        self
    }

    pub fn set(&self, id: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(id.to_string(), value.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStoreClient for MockSecretStore {
    async fn get_secret_value(&self, id: &str) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(id.to_string());
        self.values.lock().unwrap().get(id).cloned().ok_or_else(|| {
            ProviderError::unable_to_fetch(
                "secret_store.get_secret_value",
                std::io::Error::new(std::io::ErrorKind::NotFound, id.to_string()),
            )
        })
    }
}
