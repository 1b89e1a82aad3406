//! Client for the MDD developer community API.
//!
//! The crate keeps the authenticated-user context (token and user snapshot,
//! persisted between runs), the set of themes that user follows, and typed
//! calls for every REST route the platform exposes. [`Mdd`] wires the pieces
//! together the way an application would use them.

pub mod auth;
pub mod client;
pub mod comments;
pub mod config;
pub mod core;
pub mod forms;
pub mod listing;
pub mod models;
pub mod password;
pub mod posts;
pub mod subscriptions;
pub mod themes;
pub mod users;
pub mod view;

use std::sync::Arc;

pub use crate::auth::{AuthBackend, SessionManager};
pub use crate::client::ApiClient;
pub use crate::config::ClientConfig;
pub use crate::core::errors::ApiError;
pub use crate::core::store::{FileStore, KeyValueStore, MemoryStore, TokenStore};
pub use crate::subscriptions::{SubscriptionBackend, SubscriptionCache};
pub use crate::view::ViewScope;

/// Application state: one API client, one session, one subscription cache,
/// all sharing the same token store.
#[derive(Clone)]
pub struct Mdd {
    pub api: ApiClient,
    pub session: SessionManager,
    pub subscriptions: SubscriptionCache,
}

impl Mdd {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let tokens = TokenStore::new(store);
        let api = ApiClient::new(&config, tokens.clone())?;
        let session = SessionManager::new(Arc::new(api.clone()), tokens, config);
        let subscriptions = SubscriptionCache::new(Arc::new(api.clone()));
        subscriptions.attach(&session);
        Ok(Self {
            api,
            session,
            subscriptions,
        })
    }

    /// Open the session file named in `config` and build on top of it.
    pub fn with_session_file(config: ClientConfig) -> anyhow::Result<Self> {
        let store = FileStore::open(&config.session_file)?;
        Ok(Self::new(config, Arc::new(store))?)
    }
}
