//! Admin area: approval queue.
//!
//! Administrators move pengawas and sekolah accounts between pending,
//! approved and rejected. The role gate picks up a change on the account's
//! next request.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};

use pengawas_core::{ApprovalStatus, Identity, UserId};

use crate::db::{ApprovalCounts, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::CurrentIdentity;
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub admin: Identity,
    pub counts: ApprovalCounts,
}

/// Approval queue template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/approvals.html")]
pub struct ApprovalsTemplate {
    pub admin: Identity,
    pub pending: Vec<Identity>,
    pub rejected: Vec<Identity>,
}

// =============================================================================
// Routes
// =============================================================================

/// Display approval counts.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentIdentity(admin): CurrentIdentity,
) -> Result<impl IntoResponse> {
    let counts = state.accounts().count_by_status().await?;
    Ok(DashboardTemplate { admin, counts })
}

/// Display pending and rejected accounts.
pub async fn approvals(
    State(state): State<AppState>,
    CurrentIdentity(admin): CurrentIdentity,
) -> Result<impl IntoResponse> {
    let accounts = state
        .accounts()
        .list_by_status(&[ApprovalStatus::Pending, ApprovalStatus::Rejected])
        .await?;
    let (pending, rejected): (Vec<_>, Vec<_>) = accounts
        .into_iter()
        .partition(|a| a.status_approval == ApprovalStatus::Pending);

    Ok(ApprovalsTemplate {
        admin,
        pending,
        rejected,
    })
}

/// Approve an account.
pub async fn approve(
    State(state): State<AppState>,
    CurrentIdentity(admin): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Redirect> {
    transition(&state, &admin, &id, ApprovalStatus::Approved).await
}

/// Reject an account.
pub async fn reject(
    State(state): State<AppState>,
    CurrentIdentity(admin): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Redirect> {
    transition(&state, &admin, &id, ApprovalStatus::Rejected).await
}

async fn transition(
    state: &AppState,
    admin: &Identity,
    raw_id: &str,
    status: ApprovalStatus,
) -> Result<Redirect> {
    let id: UserId = raw_id
        .parse()
        .map_err(|e| AppError::BadRequest(format!("account id: {e}")))?;

    let account = state
        .accounts()
        .set_approval_status(id, status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("account {id}")),
            other => AppError::Database(other),
        })?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %account.id,
        role = %account.role,
        status = %status,
        "Account approval status changed"
    );

    Ok(Redirect::to("/admin/persetujuan"))
}
