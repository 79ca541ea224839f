//! Configuration file
//!
//! A JSON document; every field has a default, so `{}` is a valid config.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::{
    AuthService, CredentialVerifier, InMemorySessionRepository, InMemoryUserRepository,
    KdfParams, PasswordPolicy, SessionConfig,
};
use crate::file_storage::{
    FileGateway, InMemoryFileStore, DEFAULT_MAX_FILES_PER_UPLOAD, DEFAULT_MAX_UPLOAD_BYTES,
};
use crate::http_server::{AppState, CookieSettings, HttpServerConfig};

use super::errors::{CliError, CliResult};

/// Longest accepted session lifetime (ten years)
const MAX_SESSION_TTL_HOURS: i64 = 10 * 366 * 24;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listener, CORS and cookie settings
    #[serde(default)]
    pub http: HttpServerConfig,

    /// Session lifetime in hours (default 168, one week)
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Per-file upload limit in bytes (default 100 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Files accepted in one upload request (default 10)
    #[serde(default = "default_max_files_per_upload")]
    pub max_files_per_upload: usize,

    /// scrypt cost parameters
    #[serde(default)]
    pub scrypt: KdfParams,

    /// Minimum password length accepted at registration
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

fn default_session_ttl_hours() -> i64 {
    168
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_max_files_per_upload() -> usize {
    DEFAULT_MAX_FILES_PER_UPLOAD
}

fn default_min_password_length() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpServerConfig::default(),
            session_ttl_hours: default_session_ttl_hours(),
            max_upload_bytes: default_max_upload_bytes(),
            max_files_per_upload: default_max_files_per_upload(),
            scrypt: KdfParams::default(),
            min_password_length: default_min_password_length(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.session_ttl_hours <= 0 || self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(CliError::config_error(format!(
                "session_ttl_hours must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            )));
        }

        if self.max_upload_bytes == 0 {
            return Err(CliError::config_error("max_upload_bytes must be > 0"));
        }

        if self.max_files_per_upload == 0 {
            return Err(CliError::config_error("max_files_per_upload must be > 0"));
        }

        if self.min_password_length == 0 {
            return Err(CliError::config_error("min_password_length must be > 0"));
        }

        self.scrypt.validate().map_err(|_| {
            CliError::config_error(format!(
                "Invalid scrypt parameters: log_n={} r={} p={}",
                self.scrypt.log_n, self.scrypt.r, self.scrypt.p
            ))
        })?;

        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }

    pub fn verifier(&self) -> CredentialVerifier {
        CredentialVerifier::new(self.scrypt)
    }

    /// Construct the services the HTTP handlers share
    pub fn build_state(&self) -> Arc<AppState> {
        let auth = AuthService::new(
            InMemoryUserRepository::new(),
            InMemorySessionRepository::new(),
            self.verifier(),
            SessionConfig {
                ttl: self.session_ttl(),
            },
            PasswordPolicy {
                min_length: self.min_password_length,
            },
        );
        let files = FileGateway::with_limit(InMemoryFileStore::new(), self.max_upload_bytes)
            .with_max_files(self.max_files_per_upload);
        let cookies = CookieSettings {
            max_age_secs: self.session_ttl().num_seconds(),
            secure: self.http.secure_cookies,
        };

        Arc::new(AppState::new(auth, files, cookies))
    }
}
