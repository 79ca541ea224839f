//! Auth HTTP Routes
//!
//! Registration, login, logout and current-user endpoints. A successful
//! register or login sets the session cookie.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;

use super::state::{session_token, AppState};
use crate::auth::errors::AuthError;
use crate::auth::user::{LoginRequest, RegisterRequest, User};

/// Auth routes with shared state
pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/register", post(register_handler))
        .route("/api/login", post(login_handler))
        .route("/api/logout", post(logout_handler))
        .route("/api/user", get(get_user_handler))
        .with_state(state)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        Self {
            error: err.public_message(),
            code: err.status_code(),
        }
    }
}

fn error_response(err: AuthError) -> (StatusCode, Json<ErrorResponse>) {
    if !err.is_client_error() {
        tracing::error!(error = %err, "auth request failed");
    }
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err)))
}

// ==================
// Handlers
// ==================

/// Register handler
async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let (user, token) = state.auth.register(request).await.map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, state.cookies.issue(&token))],
        Json(UserResponse::from(&user)),
    )
        .into_response())
}

/// Login handler
async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let (user, token) = state.auth.login(request).await.map_err(error_response)?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookies.issue(&token))],
        Json(UserResponse::from(&user)),
    )
        .into_response())
}

/// Logout handler
async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(&token).map_err(error_response)?;
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookies.clear())],
    )
        .into_response())
}

/// Current user handler
async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, (StatusCode, Json<ErrorResponse>)> {
    let token = session_token(&headers)
        .ok_or_else(|| error_response(AuthError::AuthenticationRequired))?;

    let user = state.auth.current_user(&token).map_err(error_response)?;
    Ok(Json(UserResponse::from(&user)))
}
