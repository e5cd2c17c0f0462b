use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};

use crate::engine::PolicyEngine;
use crate::infra::CloudInfra;

pub mod audit;
pub mod error;
pub mod infrastructure;
pub mod openapi;
pub mod policy;
pub mod tools;

pub struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Server {
    pub async fn new(
        engine: PolicyEngine,
        infra: Arc<CloudInfra>,
        bind: SocketAddr,
    ) -> Result<Self, String> {
        let state = Arc::new(ServerState { engine, infra });
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        let app = router(state).layer(cors);
        let listener = TcpListener::bind(bind)
            .await
            .map_err(|error| error.to_string())?;
        let addr = listener.local_addr().map_err(|error| error.to_string())?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Ok(Server {
            addr,
            shutdown: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(&mut self) -> Result<(), String> {
        if let Some(sender) = self.shutdown.take() {
            sender
                .send(())
                .map_err(|_| "failed to send server shutdown signal".to_string())
        } else {
            Ok(())
        }
    }

}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/policy/status", get(policy::status))
        .route("/policy/mode", post(policy::set_mode))
        .route("/policy/emergency", get(policy::emergency_status))
        .route("/policy/emergency/grant", post(policy::grant))
        .route("/policy/emergency/extend", post(policy::extend))
        .route("/policy/emergency/revoke", post(policy::revoke))
        .route(
            "/policy/scope",
            post(policy::set_scope).delete(policy::clear_scope),
        )
        .route("/tools/execute", post(tools::execute))
        .route("/tools/simulate", post(tools::simulate))
        .route("/tools/catalog", get(tools::tool_catalog))
        .route("/infrastructure/status", get(infrastructure::status))
        .route("/infrastructure/incident", post(infrastructure::inject_incident))
        .route("/audit/history", get(audit::history))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

pub(crate) struct ServerState {
    pub(crate) engine: PolicyEngine,
    pub(crate) infra: Arc<CloudInfra>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::test_engine;
    use serde_json::{json, Value};

    async fn start() -> Server {
        let addr: SocketAddr = "127.0.0.1:0".parse().expect("addr");
        Server::new(test_engine(), Arc::new(CloudInfra::new()), addr)
            .await
            .expect("start")
    }

    #[tokio::test]
    async fn start_binds_random_port() {
        let mut server = start().await;
        assert_ne!(server.addr().port(), 0);
        server.shutdown().expect("shutdown");
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start().await;
        server.shutdown().expect("first shutdown");
        server.shutdown().expect("second shutdown");
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let server = start().await;
        let body = reqwest::get(format!("http://{}/health", server.addr()))
            .await
            .expect("request")
            .text()
            .await
            .expect("body");
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn policy_status_reports_available_modes() {
        let server = start().await;
        let status: Value = reqwest::get(format!("http://{}/policy/status", server.addr()))
            .await
            .expect("request")
            .json()
            .await
            .expect("body");
        assert_eq!(status["current_mode"], json!("NORMAL"));
        assert_eq!(status["available_modes"], json!(["EMERGENCY", "NORMAL"]));
    }

    #[tokio::test]
    async fn blocked_tool_returns_policy_violation_envelope() {
        let server = start().await;
        let client = reqwest::Client::new();
        let response: Value = client
            .post(format!("http://{}/tools/execute", server.addr()))
            .json(&json!({
                "tool_name": "restart_service",
                "arguments": {"service_name": "web-server"}
            }))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("body");
        assert_eq!(response["success"], json!(false));
        assert_eq!(response["policy_violation"], json!(true));
        assert!(response["blocked_reason"].as_str().is_some());
    }

    #[tokio::test]
    async fn grant_then_execute_restart_succeeds() {
        let server = start().await;
        let client = reqwest::Client::new();
        let base = format!("http://{}", server.addr());

        let grant: Value = client
            .post(format!("{base}/policy/emergency/grant"))
            .json(&json!({"duration_seconds": 300, "reason": "outage"}))
            .send()
            .await
            .expect("grant request")
            .json()
            .await
            .expect("grant body");
        assert_eq!(grant["active"], json!(true));
        assert_eq!(grant["current_mode"], json!("EMERGENCY"));

        client
            .post(format!("{base}/policy/scope"))
            .json(&json!({
                "affected_services": ["web-server"],
                "incident_type": "outage",
                "reason": "web tier down"
            }))
            .send()
            .await
            .expect("scope request")
            .error_for_status()
            .expect("scope status");

        let execute: Value = client
            .post(format!("{base}/tools/execute"))
            .json(&json!({
                "tool_name": "restart_service",
                "arguments": {"service_name": "web-server"}
            }))
            .send()
            .await
            .expect("execute request")
            .json()
            .await
            .expect("execute body");
        assert_eq!(execute["success"], json!(true));
        assert_eq!(execute["policy_violation"], json!(false));
    }

    #[tokio::test]
    async fn unknown_mode_returns_bad_request() {
        let server = start().await;
        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/policy/mode", server.addr()))
            .json(&json!({"mode": "PANIC"}))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.expect("body");
        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["error"]["code"], json!("bad_request"));
    }

    #[tokio::test]
    async fn history_records_rejected_call() {
        let server = start().await;
        let client = reqwest::Client::new();
        let base = format!("http://{}", server.addr());

        client
            .post(format!("{base}/tools/execute"))
            .json(&json!({
                "tool_name": "delete_database",
                "arguments": {"service_name": "database"}
            }))
            .send()
            .await
            .expect("execute request");

        let history: Value = client
            .get(format!("{base}/audit/history?limit=5"))
            .send()
            .await
            .expect("history request")
            .json()
            .await
            .expect("history body");
        assert_eq!(history["count"], json!(1));
        let records = history["records"].as_array().expect("records");
        assert_eq!(records[0]["tool"], json!("delete_database"));
        assert_eq!(records[0]["outcome"], json!("BLOCKED_GLOBAL"));
    }
}
