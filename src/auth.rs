//! Session lifecycle: who is logged in, and how that changes.
//!
//! [`SessionManager`] is the single writer of the current user. Everyone else
//! reads it through [`SessionManager::current_user`], a replay-latest stream:
//! a fresh receiver sees the last published value straight away and every
//! change after that.
//!
//! The persisted token is the only login marker. It is never validated
//! locally; an expired token is discovered when `/users/me` answers 401 or
//! 403, which drops the session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::core::errors::ApiError;
use crate::core::store::TokenStore;
use crate::forms;
use crate::models::models::{AuthResponse, LoginRequest, Session, SignupRequest, User, UserUpdate};

pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed, please try again";

/// The remote calls the session depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError>;
    /// Returns the server's confirmation text.
    async fn register(&self, request: &SignupRequest) -> Result<String, ApiError>;
    async fn current_user(&self) -> Result<User, ApiError>;
    async fn update_user(&self, user_id: i64, update: &UserUpdate) -> Result<User, ApiError>;
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.send_json(Method::POST, "auth/login", request).await
    }

    async fn register(&self, request: &SignupRequest) -> Result<String, ApiError> {
        let response = self.send_raw(Method::POST, "auth/register", request).await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            return Ok(body);
        }
        Err(ApiError::from_status_or(status, &body, REGISTRATION_FAILED_MESSAGE))
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.get_current_user().await
    }

    async fn update_user(&self, user_id: i64, update: &UserUpdate) -> Result<User, ApiError> {
        ApiClient::update_user(self, user_id, update).await
    }
}

type LogoutHook = Box<dyn Fn() + Send + Sync>;

struct Inner {
    backend: Arc<dyn AuthBackend>,
    store: TokenStore,
    config: ClientConfig,
    user_tx: watch::Sender<Option<User>>,
    logout_hooks: Mutex<Vec<LogoutHook>>,
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Build the manager and restore any persisted session before a single
    /// request is made, so views can render the cached user immediately.
    pub fn new(backend: Arc<dyn AuthBackend>, store: TokenStore, config: ClientConfig) -> Self {
        let restored = restore_user(&store);
        let (user_tx, _) = watch::channel(restored);
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                config,
                user_tx,
                logout_hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Exchange credentials for a token.
    ///
    /// The profile is fetched in the background; this call returns as soon as
    /// the token is stored. A failed login leaves the previous session alone.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let request = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        forms::validate_login(&request)?;

        let response = self.inner.backend.login(&request).await?;
        if response.token.is_empty() {
            return Err(ApiError::Decode("login response carried an empty token".to_string()));
        }
        let previous = self.token();
        self.inner.store.set_token(&response.token)?;
        info!(identifier = %identifier, "logged in");

        // The published snapshot belongs to the token that was just replaced.
        if previous.as_deref() != Some(response.token.as_str()) && self.current_user_value().is_some() {
            if let Err(e) = self.inner.store.clear_user() {
                warn!(error = %e, "failed to drop previous user snapshot");
            }
            self.inner.user_tx.send_replace(None);
        }

        let session = self.clone();
        tokio::spawn(async move {
            if let Err(e) = session.load_current_user().await {
                debug!(error = %e, "background profile refresh after login failed");
            }
        });

        Ok(response)
    }

    /// Create an account. Unless `auto_login_after_register` is set, the new
    /// user still has to log in explicitly.
    pub async fn register(&self, signup: &SignupRequest) -> Result<String, ApiError> {
        forms::validate_signup(signup)?;
        let message = self.inner.backend.register(signup).await?;
        info!(username = %signup.username, "registered");

        if self.inner.config.auto_login_after_register {
            self.login(&signup.username, &signup.password).await?;
        }
        Ok(message)
    }

    /// Forget the token and user and tell every subscriber. Safe to call
    /// when nobody is logged in.
    pub fn logout(&self) {
        if let Err(e) = self.inner.store.clear() {
            error!(error = %e, "failed to clear persisted session");
        }
        self.inner.user_tx.send_replace(None);
        for hook in self.inner.logout_hooks.lock().iter() {
            hook();
        }
        debug!("session cleared");
    }

    /// Presence of a stored token; says nothing about whether the server
    /// still accepts it.
    pub fn is_logged_in(&self) -> bool {
        self.inner.store.has_token()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.store.token().ok().flatten()
    }

    /// Fetch the profile for the stored token and publish it.
    ///
    /// 401 and 403 mean the token is dead: the session is cleared and the
    /// error returned. Other failures leave the session as it was.
    pub async fn load_current_user(&self) -> Result<User, ApiError> {
        let Some(token) = self.token() else {
            self.logout();
            return Err(ApiError::Unauthorized);
        };

        let result = self.inner.backend.current_user().await;

        // A login or logout that landed while the request was in flight owns
        // the session now; this answer belongs to a token that is gone.
        if self.token().as_deref() != Some(token.as_str()) {
            debug!("session changed during profile refresh, discarding result");
            return Err(ApiError::Unauthorized);
        }

        match result {
            Ok(user) => {
                self.inner.store.set_user(&user)?;
                self.inner.user_tx.send_replace(Some(user.clone()));
                debug!(user_id = user.id, "current user refreshed");
                Ok(user)
            }
            Err(e) if e.is_auth() => {
                warn!(error = %e, "stored token rejected, logging out");
                self.logout();
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "failed to load current user");
                Err(e)
            }
        }
    }

    /// Wait for the profile load that follows a login to settle.
    ///
    /// Returns the user once published, `None` when `limit` runs out first,
    /// and `Unauthorized` when the load ended the session instead.
    pub async fn wait_for_profile(&self, limit: Duration) -> Result<Option<User>, ApiError> {
        let mut user_rx = self.current_user();
        let session = self.clone();
        let settled = matches!(
            tokio::time::timeout(
                limit,
                user_rx.wait_for(|user| user.is_some() || !session.is_logged_in()),
            )
            .await,
            Ok(Ok(_))
        );
        if !self.is_logged_in() {
            return Err(ApiError::Unauthorized);
        }
        Ok(if settled { self.current_user_value() } else { None })
    }

    pub fn current_user(&self) -> watch::Receiver<Option<User>> {
        self.inner.user_tx.subscribe()
    }

    pub fn current_user_value(&self) -> Option<User> {
        self.inner.user_tx.borrow().clone()
    }

    pub fn session(&self) -> Session {
        Session {
            token: self.token(),
            user: self.current_user_value(),
        }
    }

    /// Save profile changes for the logged-in user.
    ///
    /// The token is bound to the email, so changing it ends the session and
    /// the user has to log in again. Otherwise the fresh profile is
    /// republished.
    pub async fn update_profile(&self, update: &UserUpdate) -> Result<User, ApiError> {
        forms::validate_profile_update(update)?;
        let current = self
            .current_user_value()
            .ok_or(ApiError::Unauthorized)?;

        let updated = match self.inner.backend.update_user(current.id, update).await {
            Ok(user) => user,
            Err(e) if e.is_auth() => {
                self.logout();
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if !updated.email.eq_ignore_ascii_case(&current.email) {
            info!(user_id = updated.id, "email changed, session must be renewed");
            self.logout();
            return Ok(updated);
        }

        match self.load_current_user().await {
            Ok(user) => Ok(user),
            Err(e) if e.is_auth() => Err(e),
            // The update itself went through; publish what the server echoed.
            Err(_) => {
                self.inner.store.set_user(&updated)?;
                self.inner.user_tx.send_replace(Some(updated.clone()));
                Ok(updated)
            }
        }
    }

    /// Run `hook` on every logout, explicit or forced.
    pub fn on_logout(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner.logout_hooks.lock().push(Box::new(hook));
    }
}

fn restore_user(store: &TokenStore) -> Option<User> {
    let user = match store.user() {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "failed to read persisted user");
            None
        }
    };

    match (user, store.has_token()) {
        (Some(user), true) => {
            debug!(user_id = user.id, "restored session");
            Some(user)
        }
        (Some(_), false) => {
            // A user snapshot without a token is not a session.
            if let Err(e) = store.clear_user() {
                warn!(error = %e, "failed to purge orphaned user snapshot");
            }
            None
        }
        (None, _) => None,
    }
}

