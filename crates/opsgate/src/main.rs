use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use opsgate::infra::CloudInfra;
use opsgate::policy::PolicyDocument;
use opsgate::server::Server;
use opsgate::PolicyEngine;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";

fn policy_path() -> PathBuf {
    match std::env::var_os("OPSGATE_POLICY") {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("policies/ops_policy.json"),
    }
}

fn bind_addr() -> Result<SocketAddr, String> {
    let raw = std::env::var("OPSGATE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    raw.parse()
        .map_err(|_| format!("invalid OPSGATE_ADDR: {raw}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = policy_path();
    let document = match PolicyDocument::load(&path) {
        Ok(document) => document,
        Err(error) => {
            tracing::error!(path = %path.display(), %error, "failed to load policy");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        policy = %document.policy_name,
        version = %document.version,
        "loaded policy document"
    );

    let engine = match PolicyEngine::new(document) {
        Ok(engine) => engine,
        Err(error) => {
            tracing::error!(%error, "failed to start policy engine");
            return ExitCode::FAILURE;
        }
    };

    let addr = match bind_addr() {
        Ok(addr) => addr,
        Err(error) => {
            tracing::error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let infra = Arc::new(CloudInfra::new());
    let mut server = match Server::new(engine, infra, addr).await {
        Ok(server) => server,
        Err(error) => {
            tracing::error!(%error, "failed to start server");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(addr = %server.addr(), "opsgate listening");

    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to wait for shutdown signal");
    }
    tracing::info!("shutting down");
    if let Err(error) = server.shutdown() {
        tracing::warn!(%error, "shutdown signal not delivered");
    }
    ExitCode::SUCCESS
}
