//! Provider capability traits and the registry that holds them.
//!
//! A provider is either request-driven ([`HttpProvider`], serving the
//! proxy) or loop-driven ([`FileProvider`], serving the file
//! materializer). Neither trait requires the other; [`ProviderHandle`]
//! is the 2-variant capability tag a config-driven registry actually
//! needs (§9 "Capability polymorphism" — a tagged variant, not a
//! combined interface every provider must implement a stub for).

pub mod aws_iam_rds_file;
pub mod aws_secrets_manager;
pub mod aws_secrets_manager_file;
pub mod aws_sm_oauth;
pub mod azure_key_vault;
pub mod azure_key_vault_file;
pub mod file_loop;

pub use aws_secrets_manager::AwsSecretsManagerProvider;
pub use aws_sm_oauth::AwsSmOAuthProvider;
pub use azure_key_vault::AzureKeyVaultProvider;

use async_trait::async_trait;
use http::HeaderMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ProviderError;

/// Ephemeral, per-request secret source. Created by
/// [`HttpProvider::secret_fetcher`] and dropped with the request.
#[async_trait]
pub trait SecretFetcher: Send + Sync {
    async fn fetch_secret(&self) -> Result<String, ProviderError>;
}

/// Request-driven capability: resolve inbound headers into a fetcher,
/// and know which headers are its own configuration (so they can be
/// stripped before forwarding).
#[async_trait]
pub trait HttpProvider: Send + Sync {
    /// Parse provider-specific directive headers and return a fetcher,
    /// or a [`ProviderError::HeaderMissing`] naming every absent header.
    fn secret_fetcher(&self, headers: &HeaderMap) -> Result<Box<dyn SecretFetcher>, ProviderError>;

    /// Remove this provider's configuration headers from an outbound
    /// header set.
    fn delete_config_headers(&self, headers: &mut HeaderMap);
}

/// Loop-driven capability: periodic fetch-transform-write, plus an
/// on-demand one-shot refresh.
#[async_trait]
pub trait FileProvider: Send + Sync {
    /// Long-running refresh loop: create the file, then fetch-write-sleep
    /// forever. Errors are logged and the loop continues.
    async fn start(self: Arc<Self>);

    /// One-shot fetch-and-write. Returns the first error encountered
    /// instead of looping.
    async fn refresh(&self) -> Result<(), ProviderError>;

    /// Absolute path this provider writes.
    fn file_name(&self) -> &str;
}

/// A named provider, tagged by which capability it offers. Config
/// dispatch (`crate::config::dispatch`) decides the tag per `type`.
pub enum ProviderHandle {
    Http(Arc<dyn HttpProvider>),
    File(Arc<dyn FileProvider>),
}

/// Immutable after construction; shared read-only across the sidecar's
/// refresh-loop tasks and proxy request tasks (§5).
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Arc<HashMap<String, ProviderHandle>>,
}

impl ProviderRegistry {
    pub fn new(providers: HashMap<String, ProviderHandle>) -> Self {
        Self {
            providers: Arc::new(providers),
        }
    }

    pub fn get_http(&self, name: &str) -> Option<Arc<dyn HttpProvider>> {
        match self.providers.get(name) {
            Some(ProviderHandle::Http(p)) => Some(p.clone()),
            _ => None,
        }
    }

    pub fn file_providers(&self) -> Vec<Arc<dyn FileProvider>> {
        self.providers
            .values()
            .filter_map(|h| match h {
                ProviderHandle::File(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Common header-stripping helper: delete every header name in `names`.
pub(crate) fn delete_headers(headers: &mut HeaderMap, names: &[&str]) {
    for name in names {
        headers.remove(*name);
    }
}

/// Build the composite cache key the way `providers::aws_sm_oauth`
/// documents in §4.5/§9: a deterministic concatenation, not a struct, so
/// two requests whose identifying directives match share a token.
pub(crate) fn composite_key(parts: &[&str]) -> String {
    parts.join("|")
}
