//! Top-level config shape (§6).

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentType {
    InitContainer,
    Sidecar,
}

pub struct AppConfig {
    pub deployment_type: DeploymentType,
    pub log_level: String,
    pub refresh_endpoint: String,
    /// Every top-level key other than `type`, `log_config`, and
    /// `refresh_config` is a provider definition, keyed by its name in
    /// the registry.
    pub providers: HashMap<String, serde_yaml::Value>,
}
