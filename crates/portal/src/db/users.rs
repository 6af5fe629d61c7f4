//! Account repository for `PostgreSQL`.
//!
//! Queries are checked at runtime; the row type below is the only place the
//! `portal.account` column list is spelled out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pengawas_core::{ApprovalStatus, Email, Identity, Role, UserId};

use super::{AccountRepository, ApprovalCounts, IdentityRepository, NewAccount, RepositoryError};

const ACCOUNT_COLUMNS: &str = "id, email, role, status_approval, display_name, created_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: UserId,
    email: Email,
    role: Role,
    status_approval: ApprovalStatus,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Identity {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            role: row.role,
            status_approval: row.status_approval,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

/// Repository for `portal.account`.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM portal.account WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Identity::from))
    }
}

#[async_trait]
impl AccountRepository for PgUserRepository {
    async fn find_login(
        &self,
        email: &Email,
    ) -> Result<Option<(Identity, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, LoginRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS}, password_hash FROM portal.account WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (Identity::from(r.account), r.password_hash)))
    }

    async fn create(&self, account: NewAccount) -> Result<Identity, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO portal.account (email, role, status_approval, display_name, password_hash)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&account.email)
        .bind(account.role)
        .bind(account.status_approval)
        .bind(account.display_name.as_deref())
        .bind(&account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    async fn update_display_name(&self, id: UserId, name: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE portal.account SET display_name = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_by_status(
        &self,
        statuses: &[ApprovalStatus],
    ) -> Result<Vec<Identity>, RepositoryError> {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();

        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM portal.account
             WHERE role <> 'admin' AND status_approval::text = ANY($1)
             ORDER BY created_at, id"
        ))
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Identity::from).collect())
    }

    async fn count_by_status(&self) -> Result<ApprovalCounts, RepositoryError> {
        let rows: Vec<(ApprovalStatus, i64)> = sqlx::query_as(
            "SELECT status_approval, count(*) FROM portal.account
             WHERE role <> 'admin'
             GROUP BY status_approval",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = ApprovalCounts::default();
        for (status, count) in rows {
            match status {
                ApprovalStatus::Pending => counts.pending = count,
                ApprovalStatus::Approved => counts.approved = count,
                ApprovalStatus::Rejected => counts.rejected = count,
            }
        }
        Ok(counts)
    }

    async fn set_approval_status(
        &self,
        id: UserId,
        status: ApprovalStatus,
    ) -> Result<Identity, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE portal.account SET status_approval = $2, updated_at = now()
             WHERE id = $1 AND role <> 'admin'
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Identity::from).ok_or(RepositoryError::NotFound)
    }
}
