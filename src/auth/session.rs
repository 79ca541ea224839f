//! # Session Management
//!
//! Cookie sessions mapping an opaque token to a user id.
//!
//! ## Invariants
//! - Only the SHA-256 of a session token is stored
//! - Sessions expire at stated time
//! - Logout invalidates immediately

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::{constant_time_str_eq, generate_token, hash_token};
use super::errors::{AuthError, AuthResult};

/// Session model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: Uuid,

    /// User this session belongs to
    pub user_id: Uuid,

    /// Hashed session token (raw token given to client)
    #[serde(skip_serializing)]
    pub token_hash: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Session manager configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session lifetime
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::days(7),
        }
    }
}

/// Session manager handles session creation and validation
pub struct SessionManager<R: SessionRepository> {
    config: SessionConfig,
    repository: R,
}

impl<R: SessionRepository> SessionManager<R> {
    pub fn new(config: SessionConfig, repository: R) -> Self {
        Self { config, repository }
    }

    /// Create a new session for a user
    ///
    /// Returns the raw token (not hashed) to give to the client.
    pub fn create_session(&self, user_id: Uuid) -> AuthResult<(Session, String)> {
        let token = generate_token();

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            token_hash: hash_token(&token),
            created_at: now,
            expires_at: now + self.config.ttl,
        };

        self.repository.create(&session)?;

        Ok((session, token))
    }

    /// Resolve a raw token to its live session
    pub fn validate(&self, token: &str) -> AuthResult<Session> {
        let session = self
            .repository
            .find_by_token_hash(&hash_token(token))?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_expired(Utc::now()) {
            self.repository.delete(session.id)?;
            return Err(AuthError::SessionInvalid);
        }

        Ok(session)
    }

    /// Destroy the session behind a raw token (logout)
    ///
    /// Unknown tokens are ignored; logging out twice is not an error.
    pub fn destroy(&self, token: &str) -> AuthResult<()> {
        if let Some(session) = self.repository.find_by_token_hash(&hash_token(token))? {
            self.repository.delete(session.id)?;
        }
        Ok(())
    }

    /// Drop expired sessions, returning how many were removed
    pub fn purge_expired(&self) -> AuthResult<usize> {
        self.repository.delete_expired(Utc::now())
    }
}

/// Session repository trait
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    fn create(&self, session: &Session) -> AuthResult<()>;

    /// Find session by token hash
    fn find_by_token_hash(&self, hash: &str) -> AuthResult<Option<Session>>;

    /// Delete a session
    fn delete(&self, id: Uuid) -> AuthResult<()>;

    /// Delete sessions expired as of `now`
    fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<usize>;
}

/// In-memory session repository
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: std::sync::RwLock<Vec<Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn create(&self, session: &Session) -> AuthResult<()> {
        let mut sessions = self.sessions.write().map_err(|_| {
            AuthError::StorageError("Lock poisoned".to_string())
        })?;
        sessions.push(session.clone());
        Ok(())
    }

    fn find_by_token_hash(&self, hash: &str) -> AuthResult<Option<Session>> {
        let sessions = self.sessions.read().map_err(|_| {
            AuthError::StorageError("Lock poisoned".to_string())
        })?;
        Ok(sessions
            .iter()
            .find(|s| constant_time_str_eq(&s.token_hash, hash))
            .cloned())
    }

    fn delete(&self, id: Uuid) -> AuthResult<()> {
        let mut sessions = self.sessions.write().map_err(|_| {
            AuthError::StorageError("Lock poisoned".to_string())
        })?;
        sessions.retain(|s| s.id != id);
        Ok(())
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<usize> {
        let mut sessions = self.sessions.write().map_err(|_| {
            AuthError::StorageError("Lock poisoned".to_string())
        })?;

        let len_before = sessions.len();
        sessions.retain(|s| !s.is_expired(now));
        Ok(len_before - sessions.len())
    }
}
