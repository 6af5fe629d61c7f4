//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use pengawas_core::UserId;

use crate::config::PortalConfig;
use crate::db::memory::{MemoryAccounts, MemoryStepStore};
use crate::db::{AccountRepository, IdentityRepository, PgStepStore, PgUserRepository, StepStore};
use crate::services::auth::AuthService;
use crate::services::wizard::WizardController;

/// The repositories a portal instance works against.
#[derive(Clone)]
pub struct Repositories {
    /// Identity lookups for the role gate (service connection).
    pub identities: Arc<dyn IdentityRepository>,
    /// Account management.
    pub accounts: Arc<dyn AccountRepository>,
    /// Program plan steps.
    pub plans: Arc<dyn StepStore>,
}

impl Repositories {
    /// `PostgreSQL` repositories. Identity lookups use `service_pool`.
    #[must_use]
    pub fn postgres(pool: &PgPool, service_pool: &PgPool) -> Self {
        Self {
            identities: Arc::new(PgUserRepository::new(service_pool.clone())),
            accounts: Arc::new(PgUserRepository::new(pool.clone())),
            plans: Arc::new(PgStepStore::new(pool.clone())),
        }
    }

    /// In-memory repositories sharing the given stores.
    #[must_use]
    pub fn memory(accounts: Arc<MemoryAccounts>, plans: Arc<MemoryStepStore>) -> Self {
        Self {
            identities: accounts.clone(),
            accounts,
            plans,
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like repositories and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    pool: Option<PgPool>,
    repositories: Repositories,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: PortalConfig, pool: PgPool, service_pool: &PgPool) -> Self {
        let repositories = Repositories::postgres(&pool, service_pool);
        Self::from_parts(config, Some(pool), repositories)
    }

    /// Create application state from explicit parts.
    ///
    /// Without a pool the readiness check reports ready unconditionally.
    #[must_use]
    pub fn from_parts(
        config: PortalConfig,
        pool: Option<PgPool>,
        repositories: Repositories,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                repositories,
            }),
        }
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get the database connection pool, if running against `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Identity lookups for the role gate.
    #[must_use]
    pub fn identities(&self) -> &dyn IdentityRepository {
        self.inner.repositories.identities.as_ref()
    }

    /// Account management.
    #[must_use]
    pub fn accounts(&self) -> &dyn AccountRepository {
        self.inner.repositories.accounts.as_ref()
    }

    /// Authentication service over the account repository.
    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.inner.repositories.accounts.clone())
    }

    /// Program plan steps.
    #[must_use]
    pub fn plans(&self) -> &dyn StepStore {
        self.inner.repositories.plans.as_ref()
    }

    /// Wizard controller for plans owned by `owner`.
    #[must_use]
    pub fn wizard(&self, owner: UserId) -> WizardController {
        WizardController::new(self.inner.repositories.plans.clone(), owner)
    }
}
