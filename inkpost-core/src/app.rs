//! Application wiring
//!
//! [`InkpostApp`] owns one instance of each collaborator: identity provider,
//! document store, role store, session pipeline, navigation guard and the
//! blog repositories. Build it with [`InkpostAppBuilder`]:
//!
//! ```no_run
//! use inkpost_core::app::InkpostApp;
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let app = InkpostApp::builder()
//!     .with_ready_timeout(Duration::from_millis(500))
//!     .build()?;
//!
//! let outcome = app.navigate("/dashboard").await;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```

use crate::blog::{CategoryRepository, PostRepository, UserRepository};
use crate::config::InkpostConfig;
use crate::identity::{IdentityProvider, MemoryIdentityProvider, PersistenceMode};
use crate::roles::{RoleSet, RoleStore};
use crate::router::{NavigationGuard, NavigationOutcome, Notifier, RouteTable};
use crate::session::{SessionContext, SessionPipeline};
use crate::store::{DocumentStore, MemoryDocumentStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`InkpostApp`]
pub struct InkpostAppBuilder {
    config: InkpostConfig,
    provider: Option<Arc<dyn IdentityProvider>>,
    store: Option<Arc<dyn DocumentStore>>,
    routes: Option<RouteTable>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl InkpostAppBuilder {
    /// Builder using `inkpost.toml` and environment variables
    pub fn new() -> Self {
        let config = InkpostConfig::load().unwrap_or_else(|e| {
            log::warn!("Falling back to default configuration: {:#}", e);
            InkpostConfig::default()
        });
        Self::with_config(config)
    }

    /// Builder using an explicit configuration
    pub fn with_config(config: InkpostConfig) -> Self {
        Self { config, provider: None, store: None, routes: None, notifier: None }
    }

    // ========================================================================
    // COLLABORATORS
    // ========================================================================

    /// Use this identity provider instead of the in-memory one
    pub fn with_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use this document store instead of the in-memory one
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the blog route table
    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Receive forbidden notices
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    // ========================================================================
    // CONFIGURATION OVERRIDES
    // ========================================================================

    /// Bound on how long navigation waits for roles
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.config.guard = self.config.guard.with_ready_timeout(timeout);
        self
    }

    /// Carry the requested path on login redirects
    pub fn with_preserve_destination(mut self, enabled: bool) -> Self {
        self.config.guard.preserve_destination = enabled;
        self
    }

    /// Identity persistence for the default provider
    pub fn with_persistence(mut self, mode: PersistenceMode) -> Self {
        self.config.auth.persistence = mode;
        self
    }

    /// Roles granted to new identities
    pub fn with_default_roles(mut self, roles: Vec<String>) -> Self {
        self.config.roles.default_roles = roles;
        self
    }

    /// Wire everything and start the session pipeline
    ///
    /// Must be called from inside a tokio runtime.
    pub fn build(self) -> Result<InkpostApp> {
        self.config.validate().context("Invalid configuration")?;

        let provider: Arc<dyn IdentityProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(
                MemoryIdentityProvider::from_config(&self.config.auth)
                    .context("Failed to initialise identity provider")?,
            ),
        };
        let store: Arc<dyn DocumentStore> =
            self.store.unwrap_or_else(|| Arc::new(MemoryDocumentStore::new()));

        let role_store = RoleStore::new(Arc::clone(&store))
            .with_default_roles(self.config.roles.default_roles.iter().cloned().collect::<RoleSet>());
        let pipeline = SessionPipeline::spawn(Arc::clone(&provider), role_store.clone());

        let mut guard = NavigationGuard::new(
            self.routes.unwrap_or_else(RouteTable::blog),
            pipeline.context(),
            self.config.guard.clone(),
        );
        if let Some(notifier) = self.notifier {
            guard = guard.with_notifier(notifier);
        }

        log::info!(
            "Inkpost ready (persistence: {}, ready timeout: {}ms, {} routes)",
            provider.persistence(),
            self.config.guard.ready_timeout_ms,
            guard.routes().routes().len()
        );

        Ok(InkpostApp {
            users: UserRepository::new(Arc::clone(&store)),
            categories: CategoryRepository::new(Arc::clone(&store)),
            posts: PostRepository::new(Arc::clone(&store)),
            config: self.config,
            provider,
            store,
            role_store,
            pipeline,
            guard,
        })
    }
}

impl Default for InkpostAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running blog front-end core
pub struct InkpostApp {
    config: InkpostConfig,
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    role_store: RoleStore,
    pipeline: SessionPipeline,
    guard: NavigationGuard,
    users: UserRepository,
    categories: CategoryRepository,
    posts: PostRepository,
}

impl InkpostApp {
    pub fn builder() -> InkpostAppBuilder {
        InkpostAppBuilder::new()
    }

    /// Decide a navigation through the guard
    pub async fn navigate(&self, path: &str) -> NavigationOutcome {
        self.guard.navigate(path).await
    }

    pub fn session(&self) -> SessionContext {
        self.pipeline.context()
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn role_store(&self) -> &RoleStore {
        &self.role_store
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn categories(&self) -> &CategoryRepository {
        &self.categories
    }

    pub fn posts(&self) -> &PostRepository {
        &self.posts
    }

    pub fn config(&self) -> &InkpostConfig {
        &self.config
    }
}
