//! `file_aws_iam_auth_rds`: an IAM-signed RDS auth token written to a file
//! on a fixed 300-second interval (§4.9). Behind the `rds-probe` feature,
//! each tick also opens the resulting DSN and issues a liveness ping —
//! the core pipeline has no hard dependency on a Postgres driver.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::aws_rds_iam::RdsIamSigner;
use crate::error::ProviderError;
use crate::providers::file_loop::{FileRefreshLoop, PostProcess};
use crate::providers::SecretFetcher;

const REFRESH_INTERVAL: Duration = Duration::from_secs(300);

pub struct RdsIamSource {
    signer: Arc<RdsIamSigner>,
    db_host: String,
    db_port: u16,
    db_user: String,
    #[allow(dead_code)]
    db_name: String,
}

#[async_trait]
impl SecretFetcher for RdsIamSource {
    async fn fetch_secret(&self) -> Result<String, ProviderError> {
        let token = self.signer.generate_token(&self.db_host, self.db_port, &self.db_user)?;

        #[cfg(feature = "rds-probe")]
        {
            probe(&self.db_host, self.db_port, &self.db_user, &token, &self.db_name).await?;
        }

        Ok(token)
    }
}

#[cfg(feature = "rds-probe")]
async fn probe(host: &str, port: u16, user: &str, password: &str, dbname: &str) -> Result<(), ProviderError> {
    let dsn = format!("host={host} port={port} user={user} password={password} dbname={dbname}");
    let (client, connection) = tokio_postgres::connect(&dsn, tokio_postgres::NoTls)
        .await
        .map_err(|e| ProviderError::unable_to_fetch("aws_iam_auth_rds.probe_connect", e))?;

    let handle = tokio::spawn(async move {
        let _ = connection.await;
    });

    client
        .simple_query("SELECT 1")
        .await
        .map_err(|e| ProviderError::unable_to_fetch("aws_iam_auth_rds.probe_ping", e))?;

    handle.abort();
    Ok(())
}

pub fn build(
    signer: Arc<RdsIamSigner>,
    db_host: String,
    db_port: u16,
    db_user: String,
    db_name: String,
    file_name: String,
) -> Arc<FileRefreshLoop> {
    let source = Box::new(RdsIamSource {
        signer,
        db_host,
        db_port,
        db_user,
        db_name,
    });
    Arc::new(FileRefreshLoop::new(file_name, REFRESH_INTERVAL, source, PostProcess::None))
}
