//! # Auth Errors
//!
//! Error types for the authentication module.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // ==================
    // Authentication Errors
    // ==================

    /// Unknown username or wrong password (generic - don't leak which)
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Login request without username or password
    #[error("Username and password are required")]
    MissingCredentials,

    /// Username already registered
    #[error("Username already exists")]
    UsernameTaken,

    /// Email already registered
    #[error("Email already registered")]
    EmailTaken,

    /// Password does not meet requirements
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    // ==================
    // Session Errors
    // ==================

    /// Request carries no session
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Session not found or expired
    #[error("Session expired or invalid")]
    SessionInvalid,

    // ==================
    // Internal Errors
    // ==================

    /// Stored credential is not `<hex digest>.<hex salt>`
    #[error("Internal error: malformed stored credential")]
    MalformedCredential,

    /// Password derivation failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    /// Storage operation failed
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            AuthError::MissingCredentials => 400,
            AuthError::UsernameTaken => 400,
            AuthError::EmailTaken => 400,
            AuthError::WeakPassword(_) => 400,

            // 401 Unauthorized
            AuthError::InvalidCredentials => 401,
            AuthError::AuthenticationRequired => 401,
            AuthError::SessionInvalid => 401,

            // 500 Internal Server Error
            AuthError::MalformedCredential => 500,
            AuthError::HashingFailed => 500,
            AuthError::StorageError(_) => 500,
        }
    }

    /// Returns whether this error is the caller's fault
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Message safe to show to clients; internal details stay in the log
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::UsernameTaken.status_code(), 400);
        assert_eq!(AuthError::AuthenticationRequired.status_code(), 401);
        assert_eq!(AuthError::HashingFailed.status_code(), 500);
        assert_eq!(AuthError::MalformedCredential.status_code(), 500);
    }

    #[test]
    fn test_error_messages_do_not_leak_info() {
        // Same message whether the username or the password was wrong
        let err = AuthError::InvalidCredentials;
        assert_eq!(err.to_string(), "Invalid username or password");

        let internal = AuthError::StorageError("connection reset by peer".into());
        assert_eq!(internal.public_message(), "Internal server error");
        assert!(!internal.is_client_error());
    }
}
