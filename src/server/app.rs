//! The built-in handler application.
//!
//! Binds the configured address and serves the resolved runtime state until
//! a shutdown signal arrives. Real applications live behind the activation
//! seam; this is the handler object the launcher itself constructs, and the
//! place where OS-level bind failures surface with their raw error codes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::discovery::SettingsRef;
use crate::error::{Result, ServerError};

/// Resolved runtime shared with the status endpoints.
#[derive(Debug)]
struct RuntimeState {
    config: Config,
    settings: SettingsRef,
}

/// The built-in server application.
pub struct App {
    state: Arc<RuntimeState>,
}

impl App {
    /// Create the application from the resolved runtime.
    #[must_use]
    pub fn new(config: Config, settings: SettingsRef) -> Self {
        Self {
            state: Arc::new(RuntimeState { config, settings }),
        }
    }

    /// Build the router with the status endpoints.
    fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(status))
            .route("/health", get(health))
            .with_state(Arc::clone(&self.state))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Run the server until a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the configured address cannot be
    /// bound, preserving the raw OS error code for operator-facing
    /// translation, or [`ServerError::Serve`] if the
    /// serving loop fails.
    pub async fn run(self) -> Result<()> {
        let address = self.state.config.bind().to_string();

        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|err| ServerError::Bind {
                address: address.clone(),
                code: err.raw_os_error(),
                reason: err.to_string(),
            })?;

        tracing::info!(%address, workers = self.state.config.workers(), "listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| ServerError::Serve(err.to_string()))?;

        tracing::info!("server shut down gracefully");
        Ok(())
    }
}

/// Resolved runtime: the active settings source and effective configuration.
async fn status(State(state): State<Arc<RuntimeState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "settings": {
            "kind": state.settings.kind.as_str(),
            "module": &state.settings.module_name,
            "search_paths": &state.settings.search_paths,
        },
        "config": &state.config,
    }))
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "healthy" })))
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::discovery::SettingsKind;
    use crate::error::Error;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn module_settings() -> SettingsRef {
        SettingsRef {
            kind: SettingsKind::Module,
            module_name: "myproj.settings".to_string(),
            search_paths: Vec::new(),
        }
    }

    #[test]
    fn test_health_endpoint() {
        tokio_test::block_on(async {
            let app = App::new(Config::defaults(), module_settings());
            let response = app
                .router()
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        });
    }

    #[tokio::test]
    async fn test_status_endpoint_reports_runtime() {
        let app = App::new(Config::defaults(), module_settings());
        let response = app
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["settings"]["module"], "myproj.settings");
        assert_eq!(json["settings"]["kind"], "module");
        assert_eq!(json["config"]["bind"], "127.0.0.1:8000");
        assert_eq!(json["config"]["workers"], 1);
    }

    #[tokio::test]
    async fn test_bind_conflict_surfaces_os_error_code() {
        let held = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = held.local_addr().unwrap();

        let mut options = Options::new();
        options.insert(
            "bind".to_string(),
            Some(toml::Value::String(addr.to_string())),
        );
        let config = Config::merge(None, &options).unwrap();

        let app = App::new(config, module_settings());
        let err = app.run().await.unwrap_err();
        match err {
            Error::Server(ServerError::Bind { address, code, .. }) => {
                assert_eq!(address, addr.to_string());
                assert!(code.is_some());
                #[cfg(target_os = "linux")]
                assert_eq!(code, Some(98));
            }
            other => panic!("expected bind error, got {other:?}"),
        }
    }
}
