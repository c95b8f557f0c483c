//! AWS Secrets Manager `GetSecretValue` contract.

use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;

use crate::clients::SecretStoreClient;
use crate::error::ProviderError;

pub struct AwsSecretsManagerClient {
    client: Client,
}

impl AwsSecretsManagerClient {
    pub async fn new(region: &str) -> Self {
        let shared_config = aws_config::from_env()
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: Client::new(&shared_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStoreClient for AwsSecretsManagerClient {
    async fn get_secret_value(&self, id: &str) -> Result<String, ProviderError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(id)
            .send()
            .await
            .map_err(|e| ProviderError::unable_to_fetch("aws_secrets_manager.get_secret_value", e))?;

        output
            .secret_string()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ProviderError::unable_to_fetch(
                    "aws_secrets_manager.get_secret_value",
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("secret '{id}' has no SecretString payload"),
                    ),
                )
            })
    }
}
