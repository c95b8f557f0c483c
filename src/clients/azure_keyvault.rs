//! Azure Key Vault `GetSecret` contract.

use async_trait::async_trait;
use azure_identity::DefaultAzureCredential;
use azure_security_keyvault_secrets::SecretClient;
use std::sync::Arc;

use crate::clients::SecretStoreClient;
use crate::error::ProviderError;

pub struct AzureKeyVaultClient {
    client: SecretClient,
}

impl AzureKeyVaultClient {
    pub fn new(vault_url: &str) -> Result<Self, ProviderError> {
        let credential = DefaultAzureCredential::new().map_err(|e| {
            ProviderError::unable_to_fetch(
                "azure_key_vault.resolve_credentials",
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;
        let client = SecretClient::new(vault_url, Arc::new(credential), None).map_err(|e| {
            ProviderError::unable_to_fetch(
                "azure_key_vault.new_client",
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;
        Ok(Self { client })
    }

    pub fn from_client(client: SecretClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStoreClient for AzureKeyVaultClient {
    async fn get_secret_value(&self, id: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .get_secret(id, "", None)
            .await
            .map_err(|e| ProviderError::unable_to_fetch("azure_key_vault.get_secret", e))?;

        let secret = response
            .into_body()
            .await
            .map_err(|e| ProviderError::unable_to_fetch("azure_key_vault.get_secret", e))?;

        secret.value.ok_or_else(|| {
            ProviderError::unable_to_fetch(
                "azure_key_vault.get_secret",
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("secret '{id}' has no value"),
                ),
            )
        })
    }
}
