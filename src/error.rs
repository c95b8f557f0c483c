//! Error hierarchy.
//!
//! Every failure kind named in the design is a sentinel variant, not a
//! string, so callers can pattern-match on kind rather than parse
//! messages. Each top-level error exposes `error_code()` for telemetry
//! and `is_retryable()` so the retrying HTTP client and the refresh loop
//! can decide whether to keep going without re-deriving that knowledge
//! from the message text.

use std::time::Duration;
use thiserror::Error;

/// Fatal at startup: a provider definition is missing a required field,
/// has the wrong type, or names an unrecognized `type`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field '{field}' for provider '{provider}'")]
    MissingField { provider: String, field: String },

    #[error("field '{field}' for provider '{provider}' has the wrong type, expected {expected}")]
    WrongType {
        provider: String,
        field: String,
        expected: &'static str,
    },

    #[error("provider type '{type_name}' is not recognized")]
    UnknownProviderType { type_name: String },

    #[error("provider '{provider}' configures both 'template' and 'transform'; they are mutually exclusive")]
    ConflictingTemplateAndTransform { provider: String },

    #[error("unable to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse config file as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("top-level config value is not a mapping")]
    NotAMapping,
}

/// Per-request error surfaced by a [`crate::providers::HttpProvider`] or
/// a [`crate::providers::FileProvider`].
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("required header(s) not found: {0}")]
    HeaderMissing(String),

    #[error("unable to fetch secret at stage '{stage}': {source}")]
    UnableToFetch {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to write secret file {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    OAuth(#[from] OAuthError),
}

impl ProviderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::HeaderMissing(_) => "HEADER_MISSING",
            Self::UnableToFetch { .. } => "UPSTREAM_FETCH_FAILED",
            Self::WriteFailed { .. } => "WRITE_FAILED",
            Self::Jwt(_) => "UPSTREAM_FETCH_FAILED",
            Self::OAuth(_) => "UPSTREAM_FETCH_FAILED",
        }
    }

    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Wrap any boxable error as an `unable_to_fetch` failure at `stage`,
    /// per §4.6's "each leg propagates its error wrapped with a stable
    /// sentinel" rule.
    pub fn unable_to_fetch<E>(stage: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::UnableToFetch {
            stage,
            source: Box::new(source),
        }
    }
}

/// Per-request error surfaced by the proxy rewriter; always mapped to a
/// 400 with the Hasura error envelope.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("required header(s) not found: {0}")]
    HeaderMissing(String),

    #[error("invalid destination url: {0}")]
    UrlInvalid(String),

    #[error("provider '{0}' is not registered")]
    ProviderUnknown(String),

    #[error("header template is malformed: {0}")]
    TemplateMalformed(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ProxyError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::HeaderMissing(_) => "HEADER_MISSING",
            Self::UrlInvalid(_) => "URL_INVALID",
            Self::ProviderUnknown(_) => "PROVIDER_UNKNOWN",
            Self::TemplateMalformed(_) => "TEMPLATE_MALFORMED",
            Self::Provider(e) => e.error_code(),
        }
    }
}

/// JWT minting error. Treated as `unable_to_fetch` from the pipeline's
/// point of view (§4.3/§4.6).
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("unable to parse RSA private key: {0}")]
    ParseError(String),

    #[error("unable to parse certificate: {0}")]
    CertificateParseError(String),

    #[error("unable to generate a jti: {0}")]
    UuidError(String),

    #[error("unable to sign jwt: {0}")]
    SignError(String),
}

/// OAuth2 JWT-bearer exchange error.
#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("oauth endpoint returned status {status}: {body}")]
    StatusError { status: u16, body: String },

    #[error("oauth response malformed: {0}")]
    MalformedResponse(String),

    #[error("oauth request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl OAuthError {
    /// OAuth failures are always wrapped to retry budget already spent by
    /// the retrying client; the error itself carries no further retry
    /// signal once it reaches the provider pipeline.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout() || e.is_connect())
    }
}

/// `Duration`-bearing marker used by a handful of upstream timeouts; kept
/// here rather than scattering `Duration::from_secs(30)` literals across
/// the pipeline.
pub const UPSTREAM_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
