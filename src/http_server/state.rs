//! Shared State
//!
//! Services handed to every handler, and the session cookie that ties a
//! request to a user.

use axum::http::{header, HeaderMap, HeaderValue};
use uuid::Uuid;

use crate::auth::{
    AuthError, AuthService, InMemorySessionRepository, InMemoryUserRepository,
};
use crate::file_storage::{FileGateway, InMemoryFileStore};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "filevault.sid";

/// State shared across handlers
pub struct AppState {
    pub auth: AuthService<InMemoryUserRepository, InMemorySessionRepository>,
    pub files: FileGateway<InMemoryFileStore>,
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(
        auth: AuthService<InMemoryUserRepository, InMemorySessionRepository>,
        files: FileGateway<InMemoryFileStore>,
        cookies: CookieSettings,
    ) -> Self {
        Self { auth, files, cookies }
    }

    /// User id behind the request's session, if any
    pub fn require_user(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = session_token(headers).ok_or(AuthError::AuthenticationRequired)?;
        self.auth.authenticate(&token).map_err(|e| match e {
            AuthError::SessionInvalid => AuthError::AuthenticationRequired,
            other => other,
        })
    }
}

/// Session cookie attributes
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub max_age_secs: i64,
    pub secure: bool,
}

impl CookieSettings {
    /// `Set-Cookie` value establishing a session
    pub fn issue(&self, token: &str) -> HeaderValue {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, token, self.max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        // Tokens are URL-safe base64, always a valid header value
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
    }

    /// `Set-Cookie` value removing the session
    pub fn clear(&self) -> HeaderValue {
        HeaderValue::from_static("filevault.sid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// Extract the raw session token from the cookie or a bearer header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string());

    from_cookie
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .filter(|token| !token.is_empty())
}
