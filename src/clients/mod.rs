//! Thin wire-contract clients to the upstream secret stores.
//!
//! spec.md treats "the specific SDK wire calls to AWS/Azure endpoints" as
//! out of scope for the core pipeline — only the request/response
//! contract matters. Each client here is a one-method trait (so the
//! pipeline and its tests depend on the contract, not the SDK) backed by
//! the real SDK crate the pack uses for that store.

pub mod aws_rds_iam;
pub mod aws_secretsmanager;
pub mod azure_keyvault;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;

use crate::error::ProviderError;

/// A fetched-value store keyed by an upstream secret identifier. Both
/// AWS Secrets Manager and Azure Key Vault reduce to this shape.
#[async_trait]
pub trait SecretStoreClient: Send + Sync {
    async fn get_secret_value(&self, id: &str) -> Result<String, ProviderError>;
}
