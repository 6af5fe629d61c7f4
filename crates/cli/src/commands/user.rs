//! Account management commands.
//!
//! Mirrors what the admin area does in the browser, plus account creation,
//! which the portal has no page for. Bootstrapping the first administrator
//! goes through here.

use std::sync::Arc;

use pengawas_core::{ApprovalStatus, Role, UserId};
use pengawas_portal::db::{AccountRepository, PgUserRepository, RepositoryError};
use pengawas_portal::services::auth::{AuthError, AuthService};

use super::CommandError;

/// Errors from account commands.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Account {0} not found (administrators have no approval status)")]
    NotFound(UserId),

    #[error(transparent)]
    Repository(RepositoryError),
}

async fn accounts() -> Result<Arc<PgUserRepository>, UserError> {
    let pool = super::connect().await?;
    Ok(Arc::new(PgUserRepository::new(pool)))
}

/// Create an account. Admins start approved, everyone else pending.
pub async fn create(
    email: &str,
    role: Role,
    name: Option<&str>,
    password: &str,
) -> Result<(), UserError> {
    let auth = AuthService::new(accounts().await?);
    let identity = auth.create_account(email, role, name, password).await?;

    tracing::info!(
        user_id = %identity.id,
        role = %identity.role,
        status = %identity.status_approval,
        "Account created"
    );
    Ok(())
}

/// Change an account's approval status.
pub async fn set_status(id: i32, status: ApprovalStatus) -> Result<(), UserError> {
    let id = UserId::new(id);
    let repo = accounts().await?;

    let account = repo
        .set_approval_status(id, status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => UserError::NotFound(id),
            other => UserError::Repository(other),
        })?;

    tracing::info!(user_id = %account.id, email = %account.email, status = %status, "Approval status changed");
    Ok(())
}

/// Print accounts with the given status, one per line.
pub async fn list(status: ApprovalStatus) -> Result<(), UserError> {
    let repo = accounts().await?;
    let found = repo
        .list_by_status(&[status])
        .await
        .map_err(UserError::Repository)?;

    #[allow(clippy::print_stdout)]
    for account in &found {
        println!(
            "{}\t{}\t{}\t{}",
            account.id,
            account.role,
            account.email,
            account.display_name.as_deref().unwrap_or("-"),
        );
    }

    tracing::info!(count = found.len(), status = %status, "Listed accounts");
    Ok(())
}
