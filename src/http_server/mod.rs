//! # HTTP Server Module
//!
//! JSON API over axum.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/register`, `/api/login`, `/api/logout`, `/api/user` - Accounts and sessions
//! - `/api/files/*` - Upload, list, preview, download and delete own files

pub mod auth_routes;
pub mod config;
pub mod file_routes;
pub mod server;
pub mod state;

pub use config::HttpServerConfig;
pub use server::HttpServer;
pub use state::{AppState, CookieSettings};
