//! Deployment orchestrator (§4.12): decides init-container vs sidecar and
//! drives startup from a single entry point, per §9's "initialize both
//! [the registry and the HTTP mux] once from a single `Serve(config)`
//! entry point" design note.

use axum::routing::any;
use axum::Router;
use std::net::SocketAddr;

use crate::config::dispatch;
use crate::config::model::{AppConfig, DeploymentType};
use crate::error::ConfigError;
use crate::proxy::{self, ProxyState};
use crate::refresh;

const SIDECAR_ADDR: &str = "0.0.0.0:5353";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failure,
}

impl ExitOutcome {
    pub fn process_exit_code(self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Failure => 1,
        }
    }
}

/// Single entry point (§9 "Global process state"): construct the
/// provider registry and the HTTP mux from `config`, then either run the
/// init-container's one-shot refresh or serve the sidecar forever.
pub async fn run(config: AppConfig) -> Result<ExitOutcome, ConfigError> {
    let registry = dispatch::build_registry(&config.providers).await?;

    match config.deployment_type {
        DeploymentType::InitContainer => Ok(run_init_container(registry).await),
        DeploymentType::Sidecar => {
            run_sidecar(registry, &config.refresh_endpoint).await;
            Ok(ExitOutcome::Success)
        }
    }
}

async fn run_init_container(registry: crate::providers::ProviderRegistry) -> ExitOutcome {
    for provider in registry.file_providers() {
        if let Err(e) = provider.refresh().await {
            tracing::error!(file = %provider.file_name(), error = %e, "init-container refresh failed");
            return ExitOutcome::Failure;
        }
    }
    ExitOutcome::Success
}

async fn run_sidecar(registry: crate::providers::ProviderRegistry, refresh_endpoint: &str) {
    for provider in registry.file_providers() {
        tokio::spawn(async move {
            provider.start().await;
        });
    }

    let proxy_state = ProxyState {
        registry: registry.clone(),
        forwarding_client: reqwest::Client::new(),
    };

    let health_router = Router::new().route("/healthz", any(healthz));
    let refresh_router = Router::new()
        .route(refresh_endpoint, any(refresh::handle))
        .with_state(registry);
    let proxy_router = Router::new().fallback(any(proxy::handle)).with_state(proxy_state);

    let app = health_router.merge(refresh_router).merge(proxy_router);

    let addr: SocketAddr = SIDECAR_ADDR.parse().expect("static address always parses");
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind sidecar listener");
    axum::serve(listener, app).await.expect("sidecar server exited unexpectedly");
}

async fn healthz() -> axum::http::StatusCode {
    axum::http::StatusCode::OK
}
