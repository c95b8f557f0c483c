//! AWS RDS IAM auth-token presigning (§4.9).
//!
//! An "IAM auth token" for RDS is a SigV4-presigned
//! `https://{host}:{port}/?Action=connect&DBUser={user}` URL with the
//! `https://` scheme stripped — the DB driver uses it as a password. This
//! module builds that presigned URL directly via `aws-sigv4`, the same
//! crate the official AWS SDK uses internally, rather than going through
//! an RDS client (there is no "GenerateAuthToken" SDK call — this
//! presigning is the actual contract).

use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, PercentEncodingMode, SignableBody, SignableRequest, SigningSettings,
};
use aws_sigv4::sign::v4;
use std::time::{Duration, SystemTime};

use crate::error::ProviderError;

/// Auth tokens are valid for 15 minutes; the refresh loop mints a new one
/// every tick anyway (§4.9's fixed 300s interval), well inside that
/// window.
const TOKEN_TTL: Duration = Duration::from_secs(900);

pub struct RdsIamSigner {
    credentials: Credentials,
    region: String,
}

impl RdsIamSigner {
    pub async fn new(region: &str) -> Result<Self, ProviderError> {
        let shared_config = aws_config::from_env()
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        let credentials = shared_config
            .credentials_provider()
            .ok_or_else(|| {
                ProviderError::unable_to_fetch(
                    "aws_iam_auth_rds.resolve_credentials",
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no credentials provider configured"),
                )
            })?
            .provide_credentials()
            .await
            .map_err(|e| ProviderError::unable_to_fetch("aws_iam_auth_rds.resolve_credentials", e))?;

        Ok(Self {
            credentials,
            region: region.to_string(),
        })
    }

    /// Build the auth token for `host:port` and `db_user`.
    pub fn generate_token(&self, host: &str, port: u16, db_user: &str) -> Result<String, ProviderError> {
        let encoded_user: String = url::form_urlencoded::byte_serialize(db_user.as_bytes()).collect();
        let url = format!("https://{host}:{port}/?Action=connect&DBUser={encoded_user}");

        let identity = self.credentials.clone().into();
        let mut signing_settings = SigningSettings::default();
        signing_settings.percent_encoding_mode = PercentEncodingMode::Double;
        signing_settings.expires_in = Some(TOKEN_TTL);

        let signing_params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name("rds-db")
            .time(SystemTime::now())
            .settings(signing_settings)
            .build()
            .map_err(|e| {
                ProviderError::unable_to_fetch(
                    "aws_iam_auth_rds.sign",
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                )
            })?
            .into();

        let signable_request = SignableRequest::new(
            "GET",
            url.as_str(),
            std::iter::empty(),
            SignableBody::Bytes(&[]),
        )
        .map_err(|e| {
            ProviderError::unable_to_fetch(
                "aws_iam_auth_rds.sign",
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;

        let (instructions, _signature) = sign(signable_request, &signing_params)
            .map_err(|e| {
                ProviderError::unable_to_fetch(
                    "aws_iam_auth_rds.sign",
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                )
            })?
            .into_parts();

        let mut request = http::Request::builder()
            .uri(&url)
            .body(())
            .expect("static GET request always builds");
        instructions.apply_to_request_http1x(&mut request);

        let presigned = request.uri().to_string();
        // Strip the scheme: the token the DB driver uses as a password is
        // the bare "host:port/?..." form.
        Ok(presigned
            .strip_prefix("https://")
            .unwrap_or(&presigned)
            .to_string())
    }
}
