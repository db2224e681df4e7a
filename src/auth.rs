//! Authentication gate.
//!
//! ```text
//! Unknown ──validate ok──────────────▶ Authenticated
//!    │                                   │  ▲
//!    └──no token / validate failed──▶ Unauthenticated
//!          logout, 401/404 ◀─────────────┘  │
//!          login / register ────────────────┘
//! ```
//!
//! Nothing ever moves back to `Unknown`. The gate decides which front-end variant to
//! show and owns the stored token; it has no other side effects.
use crate::client::{ApiClient, ApiError};
use crate::credentials::TokenStore;
use crate::model::{RegisterRequest, UserProfile};
use crate::notify::{Notice, SharedNotifier};
use std::sync::RwLock;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AuthState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Local checks run before anything is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        let fields = [
            &self.username,
            &self.email,
            &self.phone,
            &self.password,
            &self.confirm_password,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ApiError::Invalid("Please fill in all fields".to_string()));
        }
        if !self.email.contains('@') {
            return Err(ApiError::Invalid(
                "Please enter a valid email address".to_string(),
            ));
        }
        if self.password != self.confirm_password {
            return Err(ApiError::Invalid("Passwords do not match".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Invalid(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

pub struct AuthGate {
    api: ApiClient,
    tokens: TokenStore,
    notifier: SharedNotifier,
    state: RwLock<AuthState>,
}

impl AuthGate {
    pub fn new(api: ApiClient, tokens: TokenStore, notifier: SharedNotifier) -> Self {
        Self {
            api,
            tokens,
            notifier,
            state: RwLock::new(AuthState::Unknown),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Fresh read from storage on every call.
    pub fn token(&self) -> Option<String> {
        self.tokens.get_token()
    }

    pub fn state(&self) -> AuthState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    fn set_state(&self, next: AuthState) {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *guard != next {
            log::debug!("Auth state {} -> {}", *guard, next);
        }
        *guard = next;
    }

    fn drop_token(&self) {
        if let Err(e) = self.tokens.clear_token() {
            log::error!("Failed to clear stored token: {}", e);
        }
    }

    /// Startup check: `GET /user` with the stored token.
    ///
    /// Any failure, including an unreachable server, ends in `Unauthenticated` and
    /// removes the token. A bad token and a dead network are not told apart.
    pub async fn validate(&self) -> AuthState {
        let Some(token) = self.token() else {
            self.set_state(AuthState::Unauthenticated);
            return AuthState::Unauthenticated;
        };

        match self.api.current_user(&token).await {
            Ok(_) => self.set_state(AuthState::Authenticated),
            Err(e) => {
                log::error!("Token validation error: {}", e);
                self.drop_token();
                self.set_state(AuthState::Unauthenticated);
            }
        }
        self.state()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        if email.trim().is_empty() || password.trim().is_empty() {
            let err = ApiError::Invalid("Please enter both email and password.".to_string());
            self.notifier
                .notify(Notice::error("Empty Fields", err.user_message()));
            return Err(err);
        }

        match self.api.login(email.trim(), password).await {
            Ok(token) => {
                self.store_session(&token)?;
                self.notifier
                    .notify(Notice::success("Login Successful", "Welcome back!"));
                Ok(())
            }
            Err(e) => {
                log::error!("Login error: {}", e);
                let title = match e {
                    ApiError::Network(_) => "Connection Error",
                    _ => "Login Failed",
                };
                self.notifier.notify(Notice::error(title, e.user_message()));
                Err(e)
            }
        }
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<(), ApiError> {
        if let Err(e) = form.validate() {
            self.notifier
                .notify(Notice::error("Registration Failed", e.user_message()));
            return Err(e);
        }

        match self.api.register(&form.to_request()).await {
            Ok(token) => {
                self.store_session(&token)?;
                self.notifier.notify(Notice::success(
                    "Registration Successful",
                    "Welcome to your journal!",
                ));
                Ok(())
            }
            Err(e) => {
                log::error!("Registration error: {}", e);
                self.notifier
                    .notify(Notice::error("Registration Failed", e.user_message()));
                Err(e)
            }
        }
    }

    fn store_session(&self, token: &str) -> Result<(), ApiError> {
        self.tokens.set_token(token).map_err(|e| {
            log::error!("Failed to store token: {}", e);
            ApiError::Invalid(format!("could not store token: {}", e))
        })?;
        self.set_state(AuthState::Authenticated);
        Ok(())
    }

    /// `GET /user` for the profile screen. A 401/404 ends the session.
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let token = self.token().ok_or(ApiError::NotLoggedIn)?;
        self.api
            .current_user(&token)
            .await
            .inspect_err(|e| self.handle_auth_error(e))
    }

    /// Best-effort remote logout. Local state is cleared whatever the server says.
    pub async fn logout(&self) {
        if let Some(token) = self.token()
            && let Err(e) = self.api.logout(&token).await
        {
            log::warn!("Remote logout failed, clearing local session anyway: {}", e);
        }
        self.drop_token();
        self.set_state(AuthState::Unauthenticated);
        self.notifier
            .notify(Notice::info("Logged Out", "You have been logged out."));
    }

    /// Deletes the account remotely; the local session ends only on success or 401/404.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        let token = self.token().ok_or(ApiError::NotLoggedIn)?;
        match self.api.delete_account(&token).await {
            Ok(()) => {
                self.drop_token();
                self.set_state(AuthState::Unauthenticated);
                self.notifier
                    .notify(Notice::info("Account Deleted", "Your account has been removed."));
                Ok(())
            }
            Err(e) => {
                log::error!("Account deletion failed: {}", e);
                self.handle_auth_error(&e);
                self.notifier
                    .notify(Notice::error("Delete Failed", e.user_message()));
                Err(e)
            }
        }
    }

    /// Called by any component whose authenticated call failed.
    pub fn handle_auth_error(&self, err: &ApiError) {
        if err.is_auth_failure() {
            self.invalidate();
        }
    }

    /// Forget the session: token removed, state `Unauthenticated`.
    pub fn invalidate(&self) {
        log::info!("Session invalidated");
        self.drop_token();
        self.set_state(AuthState::Unauthenticated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            username: "ana".into(),
            email: "ana@example.com".into(),
            phone: "555".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        }
    }

    #[test]
    fn test_register_form_accepts_valid_input() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_register_form_rejections() {
        let mut f = form();
        f.phone = " ".into();
        assert_eq!(
            f.validate(),
            Err(ApiError::Invalid("Please fill in all fields".into()))
        );

        let mut f = form();
        f.email = "ana.example.com".into();
        assert!(matches!(f.validate(), Err(ApiError::Invalid(m)) if m.contains("valid email")));

        let mut f = form();
        f.confirm_password = "secret2".into();
        assert!(matches!(f.validate(), Err(ApiError::Invalid(m)) if m.contains("do not match")));

        let mut f = form();
        f.password = "abc".into();
        f.confirm_password = "abc".into();
        assert!(matches!(f.validate(), Err(ApiError::Invalid(m)) if m.contains("at least 6")));
    }
}
