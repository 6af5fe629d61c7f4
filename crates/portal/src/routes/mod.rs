//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to login
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//!
//! # Admin (role gate: admin)
//! GET  /admin                              - Approval counts
//! GET  /admin/persetujuan                  - Pending and rejected accounts
//! POST /admin/persetujuan/{id}/setujui     - Approve account
//! POST /admin/persetujuan/{id}/tolak       - Reject account
//!
//! # Pengawas (role gate: pengawas, approval + profile)
//! GET  /pengawas                           - Dashboard
//! GET  /pengawas/profil                    - Profile form
//! POST /pengawas/profil                    - Save profile
//! GET  /pengawas/perencanaan/rencana-program                       - Plan list
//! GET  /pengawas/perencanaan/rencana-program/edit/{step}           - New plan, step form
//! POST /pengawas/perencanaan/rencana-program/edit/{step}           - New plan, save step
//! GET  /pengawas/perencanaan/rencana-program/{id}/edit/{step}      - Existing plan, step form
//! POST /pengawas/perencanaan/rencana-program/{id}/edit/{step}      - Existing plan, save step
//!
//! # Sekolah (role gate: sekolah, approval)
//! GET  /sekolah                            - Dashboard
//! ```
//!
//! Unknown paths inside a role area answer 404 only after the area's gate
//! has admitted the caller.

pub mod admin;
pub mod auth;
pub mod pengawas;
pub mod program_plan;
pub mod sekolah;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Redirect,
    routing::{get, post},
};

use pengawas_core::Role;

use crate::error::AppError;
use crate::middleware::{GateState, role_gate};
use crate::state::AppState;

/// Build all portal routes.
///
/// Every role area sits behind its own role gate; `/auth` and the health
/// checks are public.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/auth/login") }))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/admin", gated(admin_routes(), state, Role::Admin))
        .nest("/pengawas", gated(pengawas_routes(), state, Role::Pengawas))
        .nest("/sekolah", gated(sekolah_routes(), state, Role::Sekolah))
}

/// Put an area router, including its fallback, behind the gate for `role`.
///
/// `layer` rather than `route_layer`: the latter skips the fallback.
fn gated(area: Router<AppState>, state: &AppState, role: Role) -> Router<AppState> {
    area.fallback(area_not_found).layer(from_fn_with_state(
        GateState::new(state.clone(), role),
        role_gate,
    ))
}

async fn area_not_found() -> AppError {
    AppError::NotFound("no such page in this area".to_owned())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the admin area router (ungated).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/persetujuan", get(admin::approvals))
        .route("/persetujuan/{id}/setujui", post(admin::approve))
        .route("/persetujuan/{id}/tolak", post(admin::reject))
}

/// Create the pengawas area router (ungated).
pub fn pengawas_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pengawas::dashboard))
        .route(
            "/profil",
            get(pengawas::profile_page).post(pengawas::save_profile),
        )
        .route("/perencanaan/rencana-program", get(program_plan::list))
        .route(
            "/perencanaan/rencana-program/edit/{step}",
            get(program_plan::new_step_form).post(program_plan::save_new_step),
        )
        .route(
            "/perencanaan/rencana-program/{id}/edit/{step}",
            get(program_plan::step_form).post(program_plan::save_step),
        )
}

/// Create the sekolah area router (ungated).
pub fn sekolah_routes() -> Router<AppState> {
    Router::new().route("/", get(sekolah::dashboard))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
