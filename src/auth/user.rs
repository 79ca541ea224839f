//! # User Management
//!
//! User model and repository for authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::StoredCredential;
use super::errors::{AuthError, AuthResult};

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Login name (unique)
    pub username: String,

    /// User's email address (unique)
    pub email: String,

    /// scrypt credential (never plaintext, never sent to clients)
    #[serde(skip_serializing)]
    pub credential: StoredCredential,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// When the user was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user around an already issued credential
    pub fn new(
        username: String,
        email: String,
        credential: StoredCredential,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            credential,
            first_name,
            last_name,
            created_at: Utc::now(),
        }
    }
}

/// Registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Login request
///
/// Fields default to empty so a missing field is reported as
/// missing credentials rather than a body parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// User repository trait
///
/// Lookups report absence as `Ok(None)`.
pub trait UserRepository: Send + Sync {
    /// Find a user by their ID
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// Find a user by their username
    fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find a user by their email
    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Create a new user
    ///
    /// Uniqueness of username and email is enforced here, atomically.
    fn create(&self, user: &User) -> AuthResult<()>;
}

/// In-memory user repository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: std::sync::RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find<P: Fn(&User) -> bool>(&self, predicate: P) -> AuthResult<Option<User>> {
        let users = self.users.read().map_err(|_| {
            AuthError::StorageError("Lock poisoned".to_string())
        })?;
        Ok(users.iter().find(|u| predicate(u)).cloned())
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        self.find(|u| u.id == id)
    }

    fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        self.find(|u| u.username == username)
    }

    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        self.find(|u| u.email == email)
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().map_err(|_| {
            AuthError::StorageError("Lock poisoned".to_string())
        })?;

        if users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::UsernameTaken);
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }

        users.push(user.clone());
        Ok(())
    }
}
