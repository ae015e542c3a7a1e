//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Database;
use crate::events::BroadcastPublisher;
use crate::middleware::AccessPolicy;
use crate::services::auth::TokenService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and configuration.
pub struct AppState<D: Database> {
    inner: Arc<AppStateInner<D>>,
}

struct AppStateInner<D> {
    config: ApiConfig,
    db: D,
    tokens: TokenService,
    events: BroadcastPublisher,
    policy: AccessPolicy,
}

impl<D: Database> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Database> AppState<D> {
    /// Create a new application state with the default access policy.
    #[must_use]
    pub fn new(config: ApiConfig, db: D) -> Self {
        Self::with_policy(config, db, AccessPolicy::default())
    }

    #[must_use]
    pub fn with_policy(config: ApiConfig, db: D, policy: AccessPolicy) -> Self {
        let tokens = TokenService::new(&config.jwt);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                tokens,
                events: BroadcastPublisher::default(),
                policy,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn db(&self) -> &D {
        &self.inner.db
    }

    /// Get a reference to the access token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the order event publisher.
    #[must_use]
    pub fn events(&self) -> &BroadcastPublisher {
        &self.inner.events
    }

    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.inner.policy
    }
}
