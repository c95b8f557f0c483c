//! Secret-refresh proxy and file-materializer.
//!
//! Sits between application workloads and upstream secret stores (AWS
//! Secrets Manager, Azure Key Vault, the AWS RDS IAM token issuer, and an
//! OAuth2 JWT-bearer token server) and offers two delivery modes:
//!
//! - **HTTP proxy mode**: inbound requests carry directives in headers;
//!   the proxy resolves a provider, fetches or mints a secret, injects it
//!   into an outbound header via a template, and forwards the request.
//! - **File materializer mode**: background loops periodically fetch a
//!   secret, optionally transform it, and atomically write it to a file.
//!
//! This crate does not store secrets durably, does not rotate upstream
//! credentials, does not terminate TLS, and does not authenticate its own
//! callers — it trusts the workload inside its network boundary.
//!
//! # Architecture
//!
//! - [`template`]: `##key##` / `##key.path##` substitution engine
//! - [`transform`]: JSON key rename/projection engine
//! - [`jwt`]: RS256 JWT minting with a certificate-fingerprint `kid`
//! - [`oauth`]: RFC 7523 JWT-bearer token exchange
//! - [`cache`]: a size-bounded, per-entry-TTL LRU used by token and secret caches
//! - [`http_client`]: a retrying HTTP client for outbound upstream calls
//! - [`providers`]: the `HttpProvider`/`FileProvider` capability traits and registry
//! - [`proxy`]: the per-request rewriter state machine
//! - [`refresh`]: the on-demand refresh HTTP endpoint
//! - [`orchestrator`]: init-container vs. sidecar deployment orchestration
//! - [`config`]: YAML ingestion and provider construction

pub mod cache;
pub mod clients;
pub mod clock;
pub mod config;
pub mod error;
pub mod http_client;
pub mod jwt;
pub mod oauth;
pub mod orchestrator;
pub mod proxy;
pub mod providers;
pub mod refresh;
pub mod telemetry;
pub mod template;
pub mod transform;

pub use error::{ConfigError, JwtError, OAuthError, ProviderError, ProxyError};
pub use orchestrator::{run, ExitOutcome};
