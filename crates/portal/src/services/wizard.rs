//! Program plan wizard controller.
//!
//! A wizard session is rebuilt from the route on every request: the optional
//! plan ID decides the mode, the step slug decides the current step. The
//! session holds no plan content; loads and saves go straight to the
//! [`StepStore`].
//!
//! A session for a new plan carries a creation token. The create form echoes
//! it back, so a first step submitted twice still makes a single plan.

use std::sync::Arc;

use uuid::Uuid;

use pengawas_core::{
    ProgramPlanId, RecordRefError, UserId, WizardMode, WizardStep, parse_record_ref,
};

use crate::db::{PlanTarget, RepositoryError, StepStore};
use crate::models::StepData;

/// Route prefix of the program plan pages.
pub const PLAN_BASE_PATH: &str = "/pengawas/perencanaan/rencana-program";

/// Errors from the wizard controller.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// The route carries a plan ID that is not a positive integer.
    #[error(transparent)]
    MalformedRecordReference(#[from] RecordRefError),

    /// The plan does not exist.
    #[error("program plan {0} not found")]
    NotFound(ProgramPlanId),

    /// The plan belongs to someone else.
    #[error("program plan {0} belongs to another user")]
    Forbidden(ProgramPlanId),

    /// Reading from the store failed.
    #[error("failed to load program plan: {0}")]
    Lookup(#[source] RepositoryError),

    /// Writing a step failed. Other steps are unaffected.
    #[error("failed to save step {step}: {source}")]
    Persistence {
        step: WizardStep,
        #[source]
        source: RepositoryError,
    },
}

/// Navigation state of one wizard request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSession {
    record_id: Option<ProgramPlanId>,
    mode: WizardMode,
    current_step: WizardStep,
    base_url: String,
    /// Set exactly while creating.
    creation_token: Option<Uuid>,
}

impl WizardSession {
    fn new(record_id: Option<ProgramPlanId>, current_step: WizardStep, base_url: &str) -> Self {
        Self {
            record_id,
            mode: WizardMode::for_record(record_id),
            current_step,
            base_url: base_url.trim_end_matches('/').to_owned(),
            creation_token: record_id.is_none().then(Uuid::new_v4),
        }
    }

    /// The plan being edited, `None` while creating.
    #[must_use]
    pub const fn record_id(&self) -> Option<ProgramPlanId> {
        self.record_id
    }

    #[must_use]
    pub const fn mode(&self) -> WizardMode {
        self.mode
    }

    #[must_use]
    pub const fn current_step(&self) -> WizardStep {
        self.current_step
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token identifying the plan this create session will make. `None`
    /// while editing.
    #[must_use]
    pub const fn creation_token(&self) -> Option<Uuid> {
        self.creation_token
    }

    /// Continue the creation started by an earlier form carrying `token`.
    ///
    /// Ignored while editing.
    pub fn resume_creation(&mut self, token: Uuid) {
        if self.record_id.is_none() {
            self.creation_token = Some(token);
        }
    }

    /// URL of `step` within this session.
    ///
    /// `{base}/edit/{step}` while creating, `{base}/{id}/edit/{step}` while
    /// editing.
    #[must_use]
    pub fn step_url(&self, step: WizardStep) -> String {
        match self.record_id {
            Some(id) => format!("{}/{id}/edit/{step}", self.base_url),
            None => format!("{}/edit/{step}", self.base_url),
        }
    }

    /// URL of the current step.
    #[must_use]
    pub fn current_url(&self) -> String {
        self.step_url(self.current_step)
    }

    /// Where to go after saving the current step: the next step, or the plan
    /// list after the last one.
    #[must_use]
    pub fn next_url(&self) -> String {
        self.current_step
            .next()
            .map_or_else(|| self.base_url.clone(), |step| self.step_url(step))
    }

    fn target(&self) -> PlanTarget {
        match (self.record_id, self.creation_token) {
            (Some(id), _) => PlanTarget::Existing(id),
            (None, Some(creation_token)) => PlanTarget::New { creation_token },
            (None, None) => PlanTarget::fresh(),
        }
    }

    fn attach(&mut self, id: ProgramPlanId) {
        self.record_id = Some(id);
        self.mode = WizardMode::Edit;
        self.creation_token = None;
    }
}

/// Builds wizard sessions for one pengawas and performs their loads and saves.
#[derive(Clone)]
pub struct WizardController {
    store: Arc<dyn StepStore>,
    owner: UserId,
    base_url: String,
}

impl WizardController {
    /// Controller for plans owned by `owner`, rooted at [`PLAN_BASE_PATH`].
    #[must_use]
    pub fn new(store: Arc<dyn StepStore>, owner: UserId) -> Self {
        Self::with_base_url(store, owner, PLAN_BASE_PATH)
    }

    /// Controller rooted at a custom URL prefix.
    #[must_use]
    pub fn with_base_url(store: Arc<dyn StepStore>, owner: UserId, base_url: &str) -> Self {
        Self {
            store,
            owner,
            base_url: base_url.to_owned(),
        }
    }

    /// Start a session from the route's plan ID segment and step.
    ///
    /// A missing or blank ID starts a new plan. A present ID must name an
    /// existing plan owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecordReference`, `NotFound`, `Forbidden`, or
    /// `Lookup` if the ownership check cannot be made.
    pub async fn enter(
        &self,
        route_record_id: Option<&str>,
        step: WizardStep,
    ) -> Result<WizardSession, WizardError> {
        let record_id = parse_record_ref(route_record_id)?;

        if let Some(id) = record_id {
            match self.store.owner_of(id).await.map_err(WizardError::Lookup)? {
                None => return Err(WizardError::NotFound(id)),
                Some(owner) if owner != self.owner => {
                    tracing::warn!(
                        plan_id = %id,
                        user_id = %self.owner,
                        "Refused access to another user's program plan"
                    );
                    return Err(WizardError::Forbidden(id));
                }
                Some(_) => {}
            }
        }

        Ok(WizardSession::new(record_id, step, &self.base_url))
    }

    /// Saved content of the session's current step.
    ///
    /// A new plan has nothing saved yet and always loads as `None`.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Lookup` if the store fails.
    pub async fn load(&self, session: &WizardSession) -> Result<Option<StepData>, WizardError> {
        let Some(id) = session.record_id else {
            return Ok(None);
        };
        self.store
            .load_step(id, session.current_step)
            .await
            .map_err(WizardError::Lookup)
    }

    /// Save the session's current step.
    ///
    /// The first save of a new plan creates it; the session then switches to
    /// edit mode with the new ID so later steps land on the same plan. Saving
    /// again under the same creation token reuses the plan already made.
    ///
    /// # Errors
    ///
    /// Returns `WizardError::Persistence` naming the step if the store fails.
    /// Nothing is rolled back: steps saved earlier keep their content.
    pub async fn save(
        &self,
        session: &mut WizardSession,
        data: &StepData,
    ) -> Result<ProgramPlanId, WizardError> {
        let step = session.current_step;
        let id = self
            .store
            .save_step(self.owner, session.target(), step, data)
            .await
            .map_err(|source| WizardError::Persistence { step, source })?;

        if let Some(token) = session.creation_token {
            tracing::info!(
                plan_id = %id,
                user_id = %self.owner,
                creation_token = %token,
                "New program plan saved"
            );
        }
        tracing::debug!(plan_id = %id, step = %step, "Program plan step saved");

        session.attach(id);
        Ok(id)
    }
}
