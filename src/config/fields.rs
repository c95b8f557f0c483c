//! Declarative field extraction from a raw YAML provider mapping.
//!
//! §9 "Config parsing" calls for validating each provider's config through
//! a field list rather than scattering ad-hoc `if found { … } else error`
//! checks; these helpers are that field list's building block, each one
//! producing a typed value or a named [`ConfigError`].

use serde_yaml::Value;
use std::time::Duration;

use crate::error::ConfigError;

pub fn require_str(map: &Value, provider: &str, field: &str) -> Result<String, ConfigError> {
    map.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| match map.get(field) {
            Some(_) => ConfigError::WrongType {
                provider: provider.to_string(),
                field: field.to_string(),
                expected: "string",
            },
            None => ConfigError::MissingField {
                provider: provider.to_string(),
                field: field.to_string(),
            },
        })
}

pub fn optional_str(map: &Value, field: &str) -> Option<String> {
    map.get(field).and_then(Value::as_str).map(str::to_string)
}

pub fn require_u64(map: &Value, provider: &str, field: &str) -> Result<u64, ConfigError> {
    map.get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| match map.get(field) {
            Some(_) => ConfigError::WrongType {
                provider: provider.to_string(),
                field: field.to_string(),
                expected: "integer",
            },
            None => ConfigError::MissingField {
                provider: provider.to_string(),
                field: field.to_string(),
            },
        })
}

pub fn optional_u64(map: &Value, field: &str, default: u64) -> u64 {
    map.get(field).and_then(Value::as_u64).unwrap_or(default)
}

pub fn require_duration_secs(map: &Value, provider: &str, field: &str) -> Result<Duration, ConfigError> {
    require_u64(map, provider, field).map(Duration::from_secs)
}

pub fn optional_duration_secs(map: &Value, field: &str, default_secs: u64) -> Duration {
    Duration::from_secs(optional_u64(map, field, default_secs))
}

pub fn require_mapping<'a>(map: &'a Value, provider: &str, field: &str) -> Result<&'a Value, ConfigError> {
    match map.get(field) {
        Some(v) if v.is_mapping() => Ok(v),
        Some(_) => Err(ConfigError::WrongType {
            provider: provider.to_string(),
            field: field.to_string(),
            expected: "mapping",
        }),
        None => Err(ConfigError::MissingField {
            provider: provider.to_string(),
            field: field.to_string(),
        }),
    }
}
