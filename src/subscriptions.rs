//! Themes the current user follows.
//!
//! The cached set is only ever replaced by a full server answer. Following
//! or unfollowing sends the mutation and then reloads everything instead of
//! patching the local list, so the cache cannot drift from the server even
//! when another session changes the same subscriptions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::SessionManager;
use crate::client::ApiClient;
use crate::core::errors::ApiError;
use crate::models::models::Theme;

#[async_trait]
pub trait SubscriptionBackend: Send + Sync {
    async fn list_subscriptions(&self) -> Result<Vec<Theme>, ApiError>;
    async fn subscribe(&self, theme_id: i64) -> Result<(), ApiError>;
    async fn unsubscribe(&self, theme_id: i64) -> Result<(), ApiError>;
}

#[async_trait]
impl SubscriptionBackend for ApiClient {
    async fn list_subscriptions(&self) -> Result<Vec<Theme>, ApiError> {
        self.get_subscriptions().await
    }

    async fn subscribe(&self, theme_id: i64) -> Result<(), ApiError> {
        ApiClient::subscribe(self, theme_id).await
    }

    async fn unsubscribe(&self, theme_id: i64) -> Result<(), ApiError> {
        ApiClient::unsubscribe(self, theme_id).await
    }
}

#[derive(Clone)]
pub struct SubscriptionCache {
    backend: Arc<dyn SubscriptionBackend>,
    themes_tx: Arc<watch::Sender<Vec<Theme>>>,
}

impl SubscriptionCache {
    pub fn new(backend: Arc<dyn SubscriptionBackend>) -> Self {
        let (themes_tx, _) = watch::channel(Vec::new());
        Self {
            backend,
            themes_tx: Arc::new(themes_tx),
        }
    }

    /// Clear the cache whenever `session` logs out, so one user's follows
    /// never show up in the next user's session.
    pub fn attach(&self, session: &SessionManager) {
        let cache = self.clone();
        session.on_logout(move || cache.clear_subscriptions());
    }

    /// Fetch the authoritative set, publish it and hand it back.
    pub async fn load_user_subscriptions(&self) -> Result<Vec<Theme>, ApiError> {
        let themes = self.backend.list_subscriptions().await?;
        debug!(count = themes.len(), "subscriptions loaded");
        self.themes_tx.send_replace(themes.clone());
        Ok(themes)
    }

    pub async fn subscribe_to_theme(&self, theme_id: i64) -> Result<(), ApiError> {
        self.backend.subscribe(theme_id).await?;
        info!(theme_id, "subscribed to theme");
        self.reload_after_mutation().await;
        Ok(())
    }

    pub async fn unsubscribe_from_theme(&self, theme_id: i64) -> Result<(), ApiError> {
        self.backend.unsubscribe(theme_id).await?;
        info!(theme_id, "unsubscribed from theme");
        self.reload_after_mutation().await;
        Ok(())
    }

    /// Follow the theme if it is not followed yet, unfollow it otherwise.
    /// Returns whether the user follows it afterwards.
    pub async fn toggle_subscription(&self, theme_id: i64) -> Result<bool, ApiError> {
        if self.is_user_subscribed(theme_id) {
            self.unsubscribe_from_theme(theme_id).await?;
        } else {
            self.subscribe_to_theme(theme_id).await?;
        }
        Ok(self.is_user_subscribed(theme_id))
    }

    // The mutation already succeeded; a failed reload only leaves the cache
    // stale until the next load.
    async fn reload_after_mutation(&self) {
        if let Err(e) = self.load_user_subscriptions().await {
            warn!(error = %e, "failed to reload subscriptions after change");
        }
    }

    /// Membership against the last published set. Between a mutation and
    /// the reload that follows it this can lag behind the server.
    pub fn is_user_subscribed(&self, theme_id: i64) -> bool {
        self.themes_tx.borrow().iter().any(|t| t.id == theme_id)
    }

    pub fn current_subscriptions(&self) -> Vec<Theme> {
        self.themes_tx.borrow().clone()
    }

    pub fn subscriptions(&self) -> watch::Receiver<Vec<Theme>> {
        self.themes_tx.subscribe()
    }

    pub fn clear_subscriptions(&self) {
        self.themes_tx.send_replace(Vec::new());
        debug!("subscriptions cleared");
    }
}
