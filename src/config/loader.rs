//! Reads and splits the YAML config file (§6, out of scope per spec.md
//! §1 beyond this boundary: "YAML configuration file reading ... only the
//! request/response contract matters" — this module is that boundary).

use std::collections::HashMap;
use std::path::Path;

use crate::config::model::{AppConfig, DeploymentType};
use crate::error::ConfigError;

const RESERVED_KEYS: [&str; 3] = ["type", "log_config", "refresh_config"];

pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&raw)
}

pub fn parse(raw: &str) -> Result<AppConfig, ConfigError> {
    let value: serde_yaml::Value = serde_yaml::from_str(raw)?;
    let mapping = value.as_mapping().ok_or(ConfigError::NotAMapping)?;

    let deployment_type = match mapping
        .get("type")
        .and_then(serde_yaml::Value::as_str)
        .unwrap_or("sidecar")
    {
        "initcontainer" => DeploymentType::InitContainer,
        _ => DeploymentType::Sidecar,
    };

    let log_level = mapping
        .get("log_config")
        .and_then(|v| v.get("level"))
        .and_then(serde_yaml::Value::as_str)
        .unwrap_or("info")
        .to_string();

    let refresh_endpoint = mapping
        .get("refresh_config")
        .and_then(|v| v.get("endpoint"))
        .and_then(serde_yaml::Value::as_str)
        .unwrap_or("/refresh")
        .to_string();

    let mut providers = HashMap::new();
    for (key, val) in mapping.iter() {
        let Some(key) = key.as_str() else { continue };
        if RESERVED_KEYS.contains(&key) {
            continue;
        }
        providers.insert(key.to_string(), val.clone());
    }

    Ok(AppConfig {
        deployment_type,
        log_level,
        refresh_endpoint,
        providers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_sidecar_and_info_level() {
        let config = parse("aws:\n  type: proxy_aws_secrets_manager\n  region: us-east-1\n").unwrap();
        assert_eq!(config.deployment_type, DeploymentType::Sidecar);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.refresh_endpoint, "/refresh");
        assert!(config.providers.contains_key("aws"));
    }

    #[test]
    fn reserved_keys_are_excluded_from_providers() {
        let config = parse(
            "type: initcontainer\nlog_config:\n  level: debug\nrefresh_config:\n  endpoint: /r\naws:\n  type: x\n",
        )
        .unwrap();
        assert_eq!(config.deployment_type, DeploymentType::InitContainer);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.refresh_endpoint, "/r");
        assert_eq!(config.providers.len(), 1);
        assert!(config.providers.contains_key("aws"));
    }

    #[test]
    fn non_mapping_top_level_is_rejected() {
        assert!(matches!(parse("- a\n- b\n"), Err(ConfigError::NotAMapping)));
    }
}
