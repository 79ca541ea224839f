//! # Auth Service
//!
//! Registration, login and session resolution built from the credential
//! verifier and the user/session repositories.

use std::sync::Arc;

use uuid::Uuid;

use super::crypto::{CredentialVerifier, PasswordPolicy, StoredCredential, DIGEST_LEN};
use super::errors::{AuthError, AuthResult};
use super::session::{SessionConfig, SessionManager, SessionRepository};
use super::user::{LoginRequest, RegisterRequest, User, UserRepository};

/// Salt used to burn the same derivation time when the username is unknown
const UNKNOWN_USER_SALT: &str = "00000000000000000000000000000000";

/// Auth service combining all auth components
pub struct AuthService<U: UserRepository, S: SessionRepository> {
    user_repo: Arc<U>,
    session_manager: SessionManager<S>,
    verifier: CredentialVerifier,
    password_policy: PasswordPolicy,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    pub fn new(
        user_repo: U,
        session_repo: S,
        verifier: CredentialVerifier,
        session_config: SessionConfig,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            user_repo: Arc::new(user_repo),
            session_manager: SessionManager::new(session_config, session_repo),
            verifier,
            password_policy,
        }
    }

    /// Register a new user and open a session for them
    ///
    /// Returns the user and the raw session token.
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<(User, String)> {
        if request.username.trim().is_empty() || request.email.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        self.password_policy.validate(&request.password)?;

        if self.user_repo.find_by_username(&request.username)?.is_some() {
            tracing::debug!(username = %request.username, "registration rejected: username taken");
            return Err(AuthError::UsernameTaken);
        }
        if self.user_repo.find_by_email(&request.email)?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let verifier = self.verifier;
        let password = request.password;
        let credential = run_blocking(move || verifier.issue(&password)).await?;

        let user = User::new(
            request.username,
            request.email,
            credential,
            request.first_name,
            request.last_name,
        );

        // The store re-checks uniqueness atomically; a concurrent registration
        // that won the race surfaces here.
        self.user_repo.create(&user)?;

        let (_, token) = self.session_manager.create_session(user.id)?;
        tracing::info!(user_id = %user.id, "user registered");

        Ok((user, token))
    }

    /// Authenticate a user and open a session
    ///
    /// Unknown usernames and wrong passwords both yield `InvalidCredentials`.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, String)> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        tracing::debug!(username = %request.username, "login attempt");

        let user = self.user_repo.find_by_username(&request.username)?;
        let verifier = self.verifier;
        let password = request.password;

        let user = match user {
            Some(user) => {
                let credential: StoredCredential = user.credential.clone();
                let matched =
                    run_blocking(move || verifier.verify(&password, &credential)).await?;
                matched.then_some(user)
            }
            None => {
                run_blocking(move || verifier.derive(&password, UNKNOWN_USER_SALT, DIGEST_LEN))
                    .await?;
                None
            }
        };

        let user = match user {
            Some(user) => user,
            None => {
                tracing::info!("login rejected: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let (_, token) = self.session_manager.create_session(user.id)?;
        tracing::info!(user_id = %user.id, "login succeeded");

        Ok((user, token))
    }

    /// Resolve a session token to its user
    pub fn current_user(&self, token: &str) -> AuthResult<User> {
        let session = self.session_manager.validate(token)?;
        self.user_repo
            .find_by_id(session.user_id)?
            .ok_or(AuthError::SessionInvalid)
    }

    /// Resolve a session token to its user id
    pub fn authenticate(&self, token: &str) -> AuthResult<Uuid> {
        self.current_user(token).map(|user| user.id)
    }

    /// Logout (invalidate session)
    pub fn logout(&self, token: &str) -> AuthResult<()> {
        self.session_manager.destroy(token)
    }

    /// Drop expired sessions
    pub fn purge_expired_sessions(&self) -> AuthResult<usize> {
        self.session_manager.purge_expired()
    }
}

/// Run CPU-heavy credential work off the async workers
async fn run_blocking<T, F>(f: F) -> AuthResult<T>
where
    F: FnOnce() -> AuthResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "credential task failed");
        AuthError::HashingFailed
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::KdfParams;
    use crate::auth::session::InMemorySessionRepository;
    use crate::auth::user::InMemoryUserRepository;

    fn create_test_service() -> AuthService<InMemoryUserRepository, InMemorySessionRepository> {
        AuthService::new(
            InMemoryUserRepository::new(),
            InMemorySessionRepository::new(),
            CredentialVerifier::new(KdfParams { log_n: 8, r: 8, p: 1 }),
            SessionConfig::default(),
            PasswordPolicy::default(),
        )
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: "correct horse".to_string(),
            email: email.to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_opens_session() {
        let service = create_test_service();
        let (user, token) = service
            .register(register_request("ada", "ada@example.com"))
            .await
            .unwrap();

        assert_eq!(user.username, "ada");
        assert_eq!(service.current_user(&token).unwrap().id, user.id);
        assert_eq!(service.authenticate(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn test_register_duplicates() {
        let service = create_test_service();
        service
            .register(register_request("ada", "ada@example.com"))
            .await
            .unwrap();

        let result = service.register(register_request("ada", "x@example.com")).await;
        assert!(matches!(result, Err(AuthError::UsernameTaken)));

        let result = service.register(register_request("bob", "ada@example.com")).await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_login() {
        let service = create_test_service();
        let (registered, _) = service
            .register(register_request("ada", "ada@example.com"))
            .await
            .unwrap();

        let (user, token) = service
            .login(login_request("ada", "correct horse"))
            .await
            .unwrap();
        assert_eq!(user.id, registered.id);
        assert_eq!(service.authenticate(&token).unwrap(), registered.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = create_test_service();
        service
            .register(register_request("ada", "ada@example.com"))
            .await
            .unwrap();

        let wrong_password = service.login(login_request("ada", "wrong")).await.unwrap_err();
        let unknown_user = service.login(login_request("nobody", "wrong")).await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let service = create_test_service();
        let result = service.login(login_request("", "pw")).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
        let result = service.login(login_request("ada", "")).await;
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_logout() {
        let service = create_test_service();
        let (_, token) = service
            .register(register_request("ada", "ada@example.com"))
            .await
            .unwrap();

        service.logout(&token).unwrap();
        assert!(matches!(
            service.current_user(&token),
            Err(AuthError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_broken_kdf_is_internal_not_rejection() {
        let service: AuthService<InMemoryUserRepository, InMemorySessionRepository> =
            AuthService::new(
                InMemoryUserRepository::new(),
                InMemorySessionRepository::new(),
                CredentialVerifier::new(KdfParams { log_n: 8, r: 0, p: 1 }),
                SessionConfig::default(),
                PasswordPolicy::default(),
            );

        let result = service.login(login_request("nobody", "pw")).await;
        assert!(matches!(result, Err(AuthError::HashingFailed)));
    }
}
