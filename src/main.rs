use secret_refresh_proxy::config::loader;
use secret_refresh_proxy::{orchestrator, telemetry};
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let config_path = std::env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./config.yaml"));

    let config = match loader::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("unable to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    telemetry::init_subscriber(&config.log_level);

    match orchestrator::run(config).await {
        Ok(outcome) => std::process::exit(outcome.process_exit_code()),
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            std::process::exit(1);
        }
    }
}
