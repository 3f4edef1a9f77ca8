//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::NotificationConfig;
use crate::db::{DirectoryStore, OrderStore};
use crate::services::auth::IdentityGateway;
use crate::services::notify::Notifier;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Every collaborator sits behind
/// a trait object so the same router runs against `PostgreSQL` and SMTP in
/// production and against in-memory stores in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    identity: Arc<dyn IdentityGateway>,
    directory: Arc<dyn DirectoryStore>,
    orders: Arc<dyn OrderStore>,
    notifier: Arc<dyn Notifier>,
    notifications: NotificationConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityGateway>,
        directory: Arc<dyn DirectoryStore>,
        orders: Arc<dyn OrderStore>,
        notifier: Arc<dyn Notifier>,
        notifications: NotificationConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                identity,
                directory,
                orders,
                notifier,
                notifications,
            }),
        }
    }

    /// Get the identity gateway.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityGateway {
        self.inner.identity.as_ref()
    }

    /// Get the profile directory.
    #[must_use]
    pub fn directory(&self) -> &dyn DirectoryStore {
        self.inner.directory.as_ref()
    }

    /// Get the order store.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderStore {
        self.inner.orders.as_ref()
    }

    /// Get a handle to the notifier for detached sends.
    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.inner.notifier)
    }

    /// Get the notification settings.
    #[must_use]
    pub fn notifications(&self) -> &NotificationConfig {
        &self.inner.notifications
    }
}
