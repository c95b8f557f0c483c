//! JSON key rename/projection engine.
//!
//! Non-JSON secrets pass through unchanged. In [`TransformMode::KeepAll`]
//! every mapped key is renamed (moved, not copied) and every unmapped key
//! is preserved; in [`TransformMode::TransformedOnly`] only mapped keys
//! survive. A mapping's `from` is looked up exactly first, then
//! case-insensitively against the remaining input keys.
//!
//! The transform engine and the template engine are mutually exclusive
//! per file-provider configuration — that conflict is rejected at config
//! load time ([`crate::error::ConfigError::ConflictingTemplateAndTransform`]),
//! not here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    KeepAll,
    TransformedOnly,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyMapping {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransformConfig {
    pub mode: TransformMode,
    pub key_mappings: Vec<KeyMapping>,
}

/// Apply `mappings` to the JSON object `secret_json` under `mode`.
/// Returns `secret_json` unchanged if it does not parse as a JSON object.
pub fn apply(secret_json: &str, config: &TransformConfig) -> String {
    let Ok(Value::Object(input)) = serde_json::from_str::<Value>(secret_json) else {
        return secret_json.to_string();
    };

    let mut output = match config.mode {
        TransformMode::KeepAll => input.clone(),
        TransformMode::TransformedOnly => Map::new(),
    };

    for mapping in &config.key_mappings {
        match find_key(&input, &mapping.from) {
            Some(actual_key) => {
                let value = input[&actual_key].clone();
                if matches!(config.mode, TransformMode::KeepAll) {
                    output.remove(&actual_key);
                }
                output.insert(mapping.to.clone(), value);
            }
            None => {
                tracing::warn!(from = %mapping.from, to = %mapping.to, "transform: source key not found");
            }
        }
    }

    Value::Object(output).to_string()
}

fn find_key(input: &Map<String, Value>, from: &str) -> Option<String> {
    if input.contains_key(from) {
        return Some(from.to_string());
    }
    input
        .keys()
        .find(|k| k.eq_ignore_ascii_case(from))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(from: &str, to: &str) -> KeyMapping {
        KeyMapping {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn non_json_passes_through() {
        let config = TransformConfig {
            mode: TransformMode::KeepAll,
            key_mappings: vec![mapping("a", "b")],
        };
        assert_eq!(apply("not json", &config), "not json");
    }

    #[test]
    fn keep_all_renames_and_preserves_others() {
        let config = TransformConfig {
            mode: TransformMode::KeepAll,
            key_mappings: vec![mapping("username", "user"), mapping("password", "pass")],
        };
        let out = apply(
            r#"{"username":"admin","password":"p","host":"h"}"#,
            &config,
        );
        let parsed: Value = serde_json::from_str(&out).unwrap();
        let obj = parsed.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["user"], "admin");
        assert_eq!(obj["pass"], "p");
        assert_eq!(obj["host"], "h");
        assert!(!obj.contains_key("username"));
    }

    #[test]
    fn transformed_only_projects() {
        let config = TransformConfig {
            mode: TransformMode::TransformedOnly,
            key_mappings: vec![mapping("username", "user"), mapping("password", "pass")],
        };
        let out = apply(
            r#"{"username":"admin","password":"p","host":"h"}"#,
            &config,
        );
        let parsed: Value = serde_json::from_str(&out).unwrap();
        let obj = parsed.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["user"], "admin");
        assert_eq!(obj["pass"], "p");
    }

    #[test]
    fn case_insensitive_fallback_lookup() {
        let config = TransformConfig {
            mode: TransformMode::KeepAll,
            key_mappings: vec![mapping("UserName", "user")],
        };
        let out = apply(r#"{"username":"admin"}"#, &config);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["user"], "admin");
    }

    #[test]
    fn missing_key_is_logged_and_skipped() {
        let config = TransformConfig {
            mode: TransformMode::KeepAll,
            key_mappings: vec![mapping("missing", "x")],
        };
        let out = apply(r#"{"a":"b"}"#, &config);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["a"], "b");
        assert!(parsed.get("x").is_none());
    }
}
