//! Sekolah area.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use pengawas_core::Identity;

use crate::middleware::CurrentIdentity;

/// Sekolah dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "sekolah/dashboard.html")]
pub struct DashboardTemplate {
    pub sekolah: Identity,
}

/// Display the sekolah dashboard.
pub async fn dashboard(CurrentIdentity(sekolah): CurrentIdentity) -> impl IntoResponse {
    DashboardTemplate { sekolah }
}
