//! # Auth Module
//!
//! Password credentials, users and cookie sessions.

pub mod api;
pub mod crypto;
pub mod errors;
pub mod session;
pub mod user;

pub use api::AuthService;
pub use crypto::{CredentialVerifier, KdfParams, PasswordPolicy, StoredCredential};
pub use errors::{AuthError, AuthResult};
pub use session::{InMemorySessionRepository, Session, SessionConfig, SessionManager, SessionRepository};
pub use user::{InMemoryUserRepository, LoginRequest, RegisterRequest, User, UserRepository};
