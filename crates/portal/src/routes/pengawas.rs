//! Pengawas area: dashboard and profile completion.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use pengawas_core::Identity;

use crate::db::PlanSummary;
use crate::error::Result;
use crate::middleware::CurrentIdentity;
use crate::services::wizard::PLAN_BASE_PATH;
use crate::state::AppState;

/// Longest display name accepted.
const MAX_DISPLAY_NAME_LENGTH: usize = 120;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub display_name: String,
}

/// Pengawas dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "pengawas/dashboard.html")]
pub struct DashboardTemplate {
    pub pengawas: Identity,
    pub recent_plans: Vec<PlanSummary>,
    pub plans_url: &'static str,
}

/// Profile form template.
#[derive(Template, WebTemplate)]
#[template(path = "pengawas/profile.html")]
pub struct ProfileTemplate {
    pub pengawas: Identity,
    pub display_name: String,
    pub error: Option<&'static str>,
}

/// Display the pengawas dashboard.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentIdentity(pengawas): CurrentIdentity,
) -> Result<impl IntoResponse> {
    let mut recent_plans = state.plans().list_plans(pengawas.id).await?;
    recent_plans.truncate(5);

    Ok(DashboardTemplate {
        pengawas,
        recent_plans,
        plans_url: PLAN_BASE_PATH,
    })
}

/// Display the profile form.
pub async fn profile_page(CurrentIdentity(pengawas): CurrentIdentity) -> impl IntoResponse {
    ProfileTemplate {
        display_name: pengawas.display_name.clone().unwrap_or_default(),
        pengawas,
        error: None,
    }
}

/// Save the profile.
pub async fn save_profile(
    State(state): State<AppState>,
    CurrentIdentity(pengawas): CurrentIdentity,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let name = form.display_name.trim();

    if let Err(message) = validate_display_name(name) {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            ProfileTemplate {
                display_name: form.display_name.clone(),
                pengawas,
                error: Some(message),
            },
        )
            .into_response());
    }

    state.accounts().update_display_name(pengawas.id, name).await?;
    tracing::info!(user_id = %pengawas.id, "Profile updated");

    Ok(Redirect::to("/pengawas").into_response())
}

fn validate_display_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("Nama lengkap wajib diisi.");
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err("Nama lengkap terlalu panjang.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_validation() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name(&"a".repeat(121)).is_err());
        assert!(validate_display_name("Dra. Sri Wahyuni, M.Pd.").is_ok());
    }
}
