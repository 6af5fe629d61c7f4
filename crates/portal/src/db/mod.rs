//! Database access for the portal.
//!
//! # Schema: `portal`
//!
//! ## Tables
//!
//! - `account` - Identities: role, approval status, display name, password hash
//! - `program_plan` - Program plan headers, one per plan, owned by a pengawas
//! - `program_plan_step` - One row per saved wizard step, keyed by `(plan_id, step)`
//! - `session` - Tower-sessions storage
//!
//! Handlers and services talk to the traits in this module, never to `sqlx`
//! directly. [`users`] and [`program_plans`] implement them for `PostgreSQL`;
//! [`memory`] implements them in process for tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/portal/migrations/` and run via:
//! ```bash
//! cargo run -p pengawas-cli -- migrate
//! ```

pub mod memory;
pub mod program_plans;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use pengawas_core::{ApprovalStatus, Email, Identity, ProgramPlanId, Role, UserId, WizardStep};

use crate::models::StepData;

pub use program_plans::PgStepStore;
pub use users::PgUserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Ports
// =============================================================================

/// Read access to identities, used by the role gate.
///
/// Implementations must be able to read accounts that are not yet approved,
/// so in production this runs on the service connection.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Fetch an identity by ID. `Ok(None)` if the account no longer exists.
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, RepositoryError>;
}

/// Data needed to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub role: Role,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub status_approval: ApprovalStatus,
}

/// Number of non-admin accounts in each approval state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// Account management: login lookups, profile updates and the approval queue.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fetch an identity together with its password hash, by email.
    async fn find_login(&self, email: &Email)
    -> Result<Option<(Identity, String)>, RepositoryError>;

    /// Create an account.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, account: NewAccount) -> Result<Identity, RepositoryError>;

    /// Set the display name of an account.
    async fn update_display_name(&self, id: UserId, name: &str) -> Result<(), RepositoryError>;

    /// List non-admin accounts whose status is one of `statuses`, oldest first.
    async fn list_by_status(
        &self,
        statuses: &[ApprovalStatus],
    ) -> Result<Vec<Identity>, RepositoryError>;

    /// Count non-admin accounts by approval status.
    async fn count_by_status(&self) -> Result<ApprovalCounts, RepositoryError>;

    /// Move a non-admin account to `status`.
    ///
    /// Returns `RepositoryError::NotFound` for unknown IDs and for admins.
    async fn set_approval_status(
        &self,
        id: UserId,
        status: ApprovalStatus,
    ) -> Result<Identity, RepositoryError>;
}

/// One row of the plan listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub id: ProgramPlanId,
    /// Steps that have been saved at least once, in wizard order.
    pub filled_steps: Vec<WizardStep>,
    pub updated_at: DateTime<Utc>,
}

/// The plan a step save lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTarget {
    /// A plan that already exists.
    Existing(ProgramPlanId),
    /// The plan started by one create form.
    ///
    /// The first save carrying the token creates the plan. Later saves by the
    /// same owner with the same token land on that plan instead of creating
    /// another.
    New { creation_token: Uuid },
}

impl PlanTarget {
    /// A new plan under a freshly generated token.
    #[must_use]
    pub fn fresh() -> Self {
        Self::New {
            creation_token: Uuid::new_v4(),
        }
    }
}

/// Per-step persistence of program plans.
#[async_trait]
pub trait StepStore: Send + Sync {
    /// Load one step of a plan. `Ok(None)` if the step was never saved.
    async fn load_step(
        &self,
        plan: ProgramPlanId,
        step: WizardStep,
    ) -> Result<Option<StepData>, RepositoryError>;

    /// Save one step, replacing any earlier content of that step only.
    ///
    /// For [`PlanTarget::New`] the plan owned by `owner` is created in the
    /// same transaction as the step, unless that owner already created one
    /// with the same token. Returns the plan's ID either way; an unknown plan
    /// ID is `RepositoryError::NotFound`.
    async fn save_step(
        &self,
        owner: UserId,
        plan: PlanTarget,
        step: WizardStep,
        data: &StepData,
    ) -> Result<ProgramPlanId, RepositoryError>;

    /// Owner of a plan, or `Ok(None)` if it does not exist.
    async fn owner_of(&self, plan: ProgramPlanId) -> Result<Option<UserId>, RepositoryError>;

    /// Plans owned by `owner`, most recently updated first.
    async fn list_plans(&self, owner: UserId) -> Result<Vec<PlanSummary>, RepositoryError>;
}
