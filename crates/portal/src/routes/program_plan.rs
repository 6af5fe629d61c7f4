//! Program plan (rencana program) pages: list and the five-step wizard.
//!
//! GET renders a step's form with its saved content. POST saves the step and
//! redirects to the next one; the first save of a new plan redirects into the
//! plan's edit URLs. If a save fails the same form is shown again with the
//! submitted values and a retry prompt.
//!
//! Forms of a new plan carry a hidden creation token, so a repeated submit of
//! the first step lands on the plan the earlier submit created.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use uuid::Uuid;

use pengawas_core::{Identity, WizardMode, WizardStep};

use crate::db::PlanSummary;
use crate::error::{AppError, Result};
use crate::middleware::CurrentIdentity;
use crate::models::{StepData, fields_for};
use crate::services::wizard::{PLAN_BASE_PATH, WizardError, WizardSession};
use crate::state::AppState;

/// Hidden form field holding the creation token of a new plan.
pub const CREATION_TOKEN_FIELD: &str = "creation_token";

// =============================================================================
// View Models
// =============================================================================

/// One entry of the step navigation.
pub struct StepLink {
    pub number: usize,
    pub title: &'static str,
    pub url: String,
    pub current: bool,
}

/// One input of the step form, with its current value.
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub multiline: bool,
    pub value: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Plan list template.
#[derive(Template, WebTemplate)]
#[template(path = "pengawas/plans.html")]
pub struct PlanListTemplate {
    pub pengawas: Identity,
    pub plans: Vec<PlanSummary>,
    pub base_url: &'static str,
    pub new_plan_url: String,
    pub step_count: usize,
}

/// Wizard step template.
#[derive(Template, WebTemplate)]
#[template(path = "pengawas/wizard_step.html")]
pub struct WizardStepTemplate {
    pub pengawas: Identity,
    pub heading: String,
    pub step_title: &'static str,
    pub step_number: usize,
    pub step_count: usize,
    pub steps: Vec<StepLink>,
    pub fields: Vec<FieldView>,
    pub action_url: String,
    pub creation_token_field: &'static str,
    pub creation_token: Option<String>,
    pub previous_url: Option<String>,
    pub is_last: bool,
    pub error: Option<&'static str>,
}

impl WizardStepTemplate {
    fn new(pengawas: Identity, session: &WizardSession, values: &StepData) -> Self {
        let step = session.current_step();
        let heading = match (session.mode(), session.record_id()) {
            (WizardMode::Edit, Some(id)) => format!("Rencana Program #{id}"),
            _ => "Rencana Program Baru".to_owned(),
        };

        Self {
            pengawas,
            heading,
            step_title: step.title(),
            step_number: step.number(),
            step_count: WizardStep::ALL.len(),
            steps: WizardStep::ALL
                .into_iter()
                .map(|s| StepLink {
                    number: s.number(),
                    title: s.title(),
                    url: session.step_url(s),
                    current: s == step,
                })
                .collect(),
            fields: fields_for(step)
                .iter()
                .map(|field| FieldView {
                    name: field.name,
                    label: field.label,
                    multiline: field.multiline,
                    value: values.field(field.name).to_owned(),
                })
                .collect(),
            action_url: session.current_url(),
            creation_token_field: CREATION_TOKEN_FIELD,
            creation_token: session.creation_token().map(|token| token.to_string()),
            previous_url: step.previous().map(|s| session.step_url(s)),
            is_last: step.next().is_none(),
            error: None,
        }
    }
}

// =============================================================================
// Routes
// =============================================================================

/// List the caller's plans.
pub async fn list(
    State(state): State<AppState>,
    CurrentIdentity(pengawas): CurrentIdentity,
) -> Result<impl IntoResponse> {
    let plans = state.plans().list_plans(pengawas.id).await?;
    Ok(PlanListTemplate {
        pengawas,
        plans,
        base_url: PLAN_BASE_PATH,
        new_plan_url: format!("{PLAN_BASE_PATH}/edit/{}", WizardStep::Analisis),
        step_count: WizardStep::ALL.len(),
    })
}

/// Show a step of a new plan.
pub async fn new_step_form(
    State(state): State<AppState>,
    CurrentIdentity(pengawas): CurrentIdentity,
    Path(step): Path<String>,
) -> Result<Response> {
    render_step(&state, pengawas, None, &step).await
}

/// Show a step of an existing plan.
pub async fn step_form(
    State(state): State<AppState>,
    CurrentIdentity(pengawas): CurrentIdentity,
    Path((id, step)): Path<(String, String)>,
) -> Result<Response> {
    render_step(&state, pengawas, Some(&id), &step).await
}

/// Save a step of a new plan.
pub async fn save_new_step(
    State(state): State<AppState>,
    CurrentIdentity(pengawas): CurrentIdentity,
    Path(step): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response> {
    persist_step(&state, pengawas, None, &step, &form).await
}

/// Save a step of an existing plan.
pub async fn save_step(
    State(state): State<AppState>,
    CurrentIdentity(pengawas): CurrentIdentity,
    Path((id, step)): Path<(String, String)>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response> {
    persist_step(&state, pengawas, Some(&id), &step, &form).await
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_step(raw: &str) -> Result<WizardStep> {
    raw.parse()
        .map_err(|e: pengawas_core::UnknownStep| AppError::NotFound(e.to_string()))
}

async fn render_step(
    state: &AppState,
    pengawas: Identity,
    record_id: Option<&str>,
    step: &str,
) -> Result<Response> {
    let step = parse_step(step)?;
    let wizard = state.wizard(pengawas.id);
    let session = wizard.enter(record_id, step).await?;
    let saved = wizard.load(&session).await?.unwrap_or_default();

    Ok(WizardStepTemplate::new(pengawas, &session, &saved).into_response())
}

async fn persist_step(
    state: &AppState,
    pengawas: Identity,
    record_id: Option<&str>,
    step: &str,
    form: &HashMap<String, String>,
) -> Result<Response> {
    let step = parse_step(step)?;
    let wizard = state.wizard(pengawas.id);
    let mut session = wizard.enter(record_id, step).await?;
    match form.get(CREATION_TOKEN_FIELD).map(|raw| Uuid::parse_str(raw.trim())) {
        Some(Ok(token)) => session.resume_creation(token),
        Some(Err(_)) => {
            tracing::debug!(user_id = %pengawas.id, "Ignoring malformed creation token");
        }
        None => {}
    }
    let data = StepData::from_form(step, form);

    match wizard.save(&mut session, &data).await {
        Ok(_) => Ok(Redirect::to(&session.next_url()).into_response()),
        Err(e @ WizardError::Persistence { .. }) => {
            tracing::error!(user_id = %pengawas.id, error = %e, "Failed to save program plan step");
            let mut page = WizardStepTemplate::new(pengawas, &session, &data);
            page.error = Some("Data belum tersimpan. Periksa koneksi lalu simpan ulang.");
            Ok((StatusCode::SERVICE_UNAVAILABLE, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use serde_json::json;

    use pengawas_core::{ApprovalStatus, Email, Role, UserId};

    use super::*;
    use crate::db::{PlanTarget, StepStore};
    use crate::db::memory::MemoryStepStore;
    use crate::services::wizard::WizardController;

    fn pengawas() -> Identity {
        Identity {
            id: UserId::new(1),
            email: Email::parse("sri@dinas.id").unwrap(),
            role: Role::Pengawas,
            status_approval: ApprovalStatus::Approved,
            display_name: Some("Sri".to_owned()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unknown_step_is_not_found() {
        assert!(matches!(parse_step("laporan"), Err(AppError::NotFound(_))));
        assert_eq!(parse_step("metode").unwrap(), WizardStep::Metode);
    }

    #[tokio::test]
    async fn test_template_for_new_plan() {
        let wizard = WizardController::new(Arc::new(MemoryStepStore::new()), UserId::new(1));
        let session = wizard.enter(None, WizardStep::Analisis).await.unwrap();
        let page = WizardStepTemplate::new(pengawas(), &session, &StepData::default());

        assert_eq!(page.heading, "Rencana Program Baru");
        assert_eq!(page.steps.len(), 5);
        assert!(page.steps[0].current);
        assert_eq!(page.previous_url, None);
        assert_eq!(
            page.action_url,
            "/pengawas/perencanaan/rencana-program/edit/analisis"
        );
        assert!(page.render().unwrap().contains("Analisis Kebutuhan"));
    }

    #[tokio::test]
    async fn test_new_plan_form_carries_creation_token() {
        let wizard = WizardController::new(Arc::new(MemoryStepStore::new()), UserId::new(1));
        let session = wizard.enter(None, WizardStep::Analisis).await.unwrap();
        let token = session.creation_token().unwrap().to_string();
        let page = WizardStepTemplate::new(pengawas(), &session, &StepData::default());

        assert_eq!(page.creation_token.as_deref(), Some(token.as_str()));
        let html = page.render().unwrap();
        assert!(html.contains(r#"type="hidden" name="creation_token""#));
        assert!(html.contains(&token));
    }

    #[tokio::test]
    async fn test_template_keeps_submitted_values() {
        let store = Arc::new(MemoryStepStore::new());
        let id = store
            .save_step(UserId::new(1), PlanTarget::fresh(), WizardStep::Analisis, &StepData::default())
            .await
            .unwrap();
        let wizard = WizardController::new(store, UserId::new(1));
        let session = wizard
            .enter(Some(&id.to_string()), WizardStep::Metode)
            .await
            .unwrap();
        let data: StepData = serde_json::from_value(json!({"metode": "Coaching"})).unwrap();

        let page = WizardStepTemplate::new(pengawas(), &session, &data);
        assert_eq!(page.heading, format!("Rencana Program #{id}"));
        assert_eq!(page.creation_token, None);
        assert_eq!(page.fields[0].value, "Coaching");
        assert!(page.previous_url.unwrap().ends_with("/edit/dokumen"));
    }
}
