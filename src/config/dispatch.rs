//! Provider-type → constructor dispatch (§9 "Config parsing").
//!
//! Each arm reads its own field list via [`crate::config::fields`] and
//! builds the concrete provider, tagging it into a [`ProviderHandle`].
//! `build_registry` is the single place that knows every `type` string.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_yaml::Value;

use crate::clients::aws_rds_iam::RdsIamSigner;
use crate::clients::aws_secretsmanager::AwsSecretsManagerClient;
use crate::clients::azure_keyvault::AzureKeyVaultClient;
use crate::clients::SecretStoreClient;
use crate::clock::{Clock, SystemClock};
use crate::config::fields::{optional_duration_secs, optional_str, require_duration_secs, require_mapping, require_str};
use crate::error::ConfigError;
use crate::http_client::{ReqwestRetryingClient, RetryConfig, RetryingHttpClient};
use crate::providers::file_loop::PostProcess;
use crate::providers::{aws_iam_rds_file, aws_secrets_manager_file, azure_key_vault_file};
use crate::providers::{AwsSecretsManagerProvider, AzureKeyVaultProvider, AwsSmOAuthProvider, ProviderHandle, ProviderRegistry};
use crate::transform::{KeyMapping, TransformConfig, TransformMode};

const DEFAULT_SECRET_CACHE_SIZE: usize = 1000;

fn post_process(provider_name: &str, map: &Value) -> Result<PostProcess, ConfigError> {
    let template = optional_str(map, "template");
    let transform = map.get("transform");

    match (template, transform) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingTemplateAndTransform {
            provider: provider_name.to_string(),
        }),
        (Some(t), None) => Ok(PostProcess::Template(t)),
        (None, Some(_)) => Ok(PostProcess::Transform(parse_transform(
            provider_name,
            require_mapping(map, provider_name, "transform")?,
        )?)),
        (None, None) => Ok(PostProcess::None),
    }
}

fn parse_transform(provider_name: &str, value: &Value) -> Result<TransformConfig, ConfigError> {
    let mode_str = value
        .get("mode")
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::MissingField {
            provider: provider_name.to_string(),
            field: "transform.mode".to_string(),
        })?;
    let mode = match mode_str {
        "keep_all" => TransformMode::KeepAll,
        "transformed_only" => TransformMode::TransformedOnly,
        _ => {
            return Err(ConfigError::WrongType {
                provider: provider_name.to_string(),
                field: "transform.mode".to_string(),
                expected: "'keep_all' or 'transformed_only'",
            })
        }
    };

    let key_mappings = value
        .get("key_mappings")
        .and_then(Value::as_sequence)
        .map(|seq| {
            seq.iter()
                .filter_map(|m| {
                    let from = m.get("from")?.as_str()?.to_string();
                    let to = m.get("to")?.as_str()?.to_string();
                    Some(KeyMapping { from, to })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(TransformConfig { mode, key_mappings })
}

pub async fn build_registry(providers: &HashMap<String, Value>) -> Result<ProviderRegistry, ConfigError> {
    let mut built = HashMap::new();
    for (name, raw) in providers {
        let handle = build_one(name, raw).await?;
        built.insert(name.clone(), handle);
    }
    Ok(ProviderRegistry::new(built))
}

async fn build_one(name: &str, raw: &Value) -> Result<ProviderHandle, ConfigError> {
    let type_name = require_str(raw, name, "type")?;
    match type_name.as_str() {
        "proxy_aws_secrets_manager" => {
            let region = require_str(raw, name, "region")?;
            let client: Arc<dyn SecretStoreClient> = Arc::new(AwsSecretsManagerClient::new(&region).await);
            let cache_ttl = optional_duration_secs(raw, "cache_ttl", 300);
            Ok(ProviderHandle::Http(Arc::new(AwsSecretsManagerProvider::new(
                client,
                Some(cache_ttl),
                DEFAULT_SECRET_CACHE_SIZE,
            ))))
        }

        "azure_key_vault" => {
            let vault_url = require_str(raw, name, "vault_url")?;
            let client: Arc<dyn SecretStoreClient> = Arc::new(
                AzureKeyVaultClient::new(&vault_url).map_err(|_| ConfigError::MissingField {
                    provider: name.to_string(),
                    field: "vault_url".to_string(),
                })?,
            );
            let cache_ttl = optional_duration_secs(raw, "cache_ttl", 300);
            Ok(ProviderHandle::Http(Arc::new(AzureKeyVaultProvider::new(
                client,
                Some(cache_ttl),
                DEFAULT_SECRET_CACHE_SIZE,
            ))))
        }

        "proxy_awssm_oauth" => {
            let certificate_region = require_str(raw, name, "certificate_region")?;
            let client: Arc<dyn SecretStoreClient> = Arc::new(AwsSecretsManagerClient::new(&certificate_region).await);
            let oauth_url = url::Url::parse(&require_str(raw, name, "oauth_url")?)
                .map_err(|_| ConfigError::WrongType {
                    provider: name.to_string(),
                    field: "oauth_url".to_string(),
                    expected: "url",
                })?;
            let jwt_claims_raw = require_str(raw, name, "jwt_claims_map")?;
            let jwt_claims: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&jwt_claims_raw)
                .map_err(|_| ConfigError::WrongType {
                    provider: name.to_string(),
                    field: "jwt_claims_map".to_string(),
                    expected: "JSON object string",
                })?;
            let jwt_duration = require_duration_secs(raw, name, "jwt_duration")?;
            let token_cache_ttl = optional_duration_secs(raw, "token_cache_ttl", 300);
            let token_cache_size = raw.get("token_cache_size").and_then(Value::as_u64).unwrap_or(1000) as usize;

            let retry_config = RetryConfig {
                max_attempts: raw.get("http_retry_attempts").and_then(Value::as_u64).unwrap_or(3) as u32,
                min_wait: Duration::from_millis(
                    raw.get("http_retry_min_wait").and_then(Value::as_u64).unwrap_or(0) * 1000,
                ),
                max_wait: Duration::from_millis(
                    raw.get("http_retry_max_wait").and_then(Value::as_u64).unwrap_or(5) * 1000,
                ),
            };
            let http: Arc<dyn RetryingHttpClient> = Arc::new(ReqwestRetryingClient::new(retry_config));
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);

            Ok(ProviderHandle::Http(Arc::new(AwsSmOAuthProvider::new(
                client.clone(),
                client,
                http,
                token_cache_ttl,
                token_cache_size,
                oauth_url,
                jwt_claims,
                jwt_duration,
                clock,
            ))))
        }

        "file_aws_secrets_manager" => {
            let region = require_str(raw, name, "region")?;
            let secret_id = require_str(raw, name, "secret_id")?;
            let path = require_str(raw, name, "path")?;
            let refresh = require_duration_secs(raw, name, "refresh")?;
            let client: Arc<dyn SecretStoreClient> = Arc::new(AwsSecretsManagerClient::new(&region).await);
            let processing = post_process(name, raw)?;
            Ok(ProviderHandle::File(aws_secrets_manager_file::build(
                client, secret_id, path, refresh, processing,
            )))
        }

        "file_azure_key_vault" => {
            let vault_url = require_str(raw, name, "vault_url")?;
            let secret_name = require_str(raw, name, "secret_name")?;
            let path = require_str(raw, name, "path")?;
            let refresh = require_duration_secs(raw, name, "refresh")?;
            let client: Arc<dyn SecretStoreClient> = Arc::new(
                AzureKeyVaultClient::new(&vault_url).map_err(|_| ConfigError::MissingField {
                    provider: name.to_string(),
                    field: "vault_url".to_string(),
                })?,
            );
            let processing = post_process(name, raw)?;
            Ok(ProviderHandle::File(azure_key_vault_file::build(
                client,
                secret_name,
                path,
                refresh,
                processing,
            )))
        }

        "file_aws_iam_auth_rds" => {
            let region = require_str(raw, name, "region")?;
            let db_name = require_str(raw, name, "db_name")?;
            let db_user = require_str(raw, name, "db_user")?;
            let db_host = require_str(raw, name, "db_host")?;
            let db_port = raw.get("db_port").and_then(Value::as_u64).ok_or_else(|| ConfigError::MissingField {
                provider: name.to_string(),
                field: "db_port".to_string(),
            })? as u16;
            let path = require_str(raw, name, "path")?;
            let signer = Arc::new(RdsIamSigner::new(&region).await.map_err(|_| ConfigError::MissingField {
                provider: name.to_string(),
                field: "region".to_string(),
            })?);
            Ok(ProviderHandle::File(aws_iam_rds_file::build(
                signer, db_host, db_port, db_user, db_name, path,
            )))
        }

        other => Err(ConfigError::UnknownProviderType {
            type_name: other.to_string(),
        }),
    }
}
