//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth_routes::auth_routes;
use super::config::HttpServerConfig;
use super::file_routes::file_routes;
use super::state::AppState;

/// HTTP Server for the file vault API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over explicitly constructed state
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: Arc<AppState>) -> Router {
        let router = Router::new()
            .route("/health", get(health_handler))
            .merge(auth_routes(state.clone()))
            .merge(file_routes(state))
            .layer(TraceLayer::new_for_http());

        // No configured origins: same-origin only, no CORS layer
        if config.cors_origins.is_empty() {
            return router;
        }

        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        router.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid listen address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "filevault listening");

        axum::serve(listener, self.router).await
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        AuthService, CredentialVerifier, InMemorySessionRepository, InMemoryUserRepository,
        PasswordPolicy, SessionConfig,
    };
    use crate::file_storage::{FileGateway, InMemoryFileStore};
    use crate::http_server::state::CookieSettings;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            AuthService::new(
                InMemoryUserRepository::new(),
                InMemorySessionRepository::new(),
                CredentialVerifier::default(),
                SessionConfig::default(),
                PasswordPolicy::default(),
            ),
            FileGateway::new(InMemoryFileStore::new()),
            CookieSettings { max_age_secs: 60, secure: false },
        ))
    }

    #[test]
    fn test_server_with_custom_port() {
        let server = HttpServer::new(HttpServerConfig::with_port(8080), state());
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_cors() {
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..Default::default()
        };
        let _router = HttpServer::new(config, state()).router();
    }
}
