//! Role gate: per-area admission middleware.
//!
//! One [`RoleGate`] guards each role area. For every request it resolves the
//! session user, reads their identity fresh from the database, evaluates the
//! area's [`AdmissionPolicy`] and either lets the request through or answers
//! with a fallback page. Protected handlers only ever run after a grant (or
//! the profile-completion exception below), and read the caller through the
//! [`CurrentIdentity`] extractor.
//!
//! | Decision                | Response                                        |
//! |-------------------------|-------------------------------------------------|
//! | `Grant`                 | handler runs                                    |
//! | `DenyUnauthenticated`   | neutral "not available" page, 401               |
//! | `DenyWrongRole`         | same neutral page, 403                          |
//! | `DenyNotApproved`       | pending / rejected status page, 403             |
//! | `DenyProfileIncomplete` | client redirect to the profile page; requests   |
//! |                         | for the profile page itself run the handler     |
//!
//! A failed identity lookup is logged and treated as `DenyUnauthenticated`.
//! The gate never writes to the session or the account.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use pengawas_core::{AdmissionDecision, AdmissionPolicy, ApprovalStatus, Identity, Role};

use crate::db::IdentityRepository;
use crate::error::{AppError, set_sentry_user};
use crate::services::session_resolver::{self, CredentialStore};
use crate::state::AppState;

/// Where pengawas complete their profile.
pub const PROFILE_PATH: &str = "/pengawas/profil";

/// Header that makes htmx perform a full-page client redirect.
const HX_REDIRECT: &str = "hx-redirect";

// =============================================================================
// Templates
// =============================================================================

/// Shown for both "not signed in" and "wrong area", with the same wording.
#[derive(Template, WebTemplate)]
#[template(path = "gate/denied.html")]
pub struct AccessDeniedTemplate;

/// Shown to signed-in users whose account is not approved.
#[derive(Template, WebTemplate)]
#[template(path = "gate/approval_status.html")]
pub struct ApprovalStatusTemplate {
    pub email: String,
    pub status: ApprovalStatus,
}

/// Minimal page that sends the browser elsewhere.
#[derive(Template, WebTemplate)]
#[template(path = "gate/redirect.html")]
pub struct RedirectShellTemplate {
    pub target: String,
    pub message: &'static str,
}

// =============================================================================
// Gate
// =============================================================================

/// The result of running a gate: the decision plus the identity it was made
/// for, if one could be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub decision: AdmissionDecision,
    pub identity: Option<Identity>,
}

impl Admission {
    const fn unauthenticated() -> Self {
        Self {
            decision: AdmissionDecision::DenyUnauthenticated,
            identity: None,
        }
    }
}

/// Admission check for one role area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGate {
    policy: AdmissionPolicy,
}

impl RoleGate {
    /// Gate for `role`'s own area with that role's standard policy.
    #[must_use]
    pub const fn new(role: Role) -> Self {
        Self::with_policy(AdmissionPolicy::for_role(role))
    }

    /// Gate with an explicit policy.
    #[must_use]
    pub const fn with_policy(policy: AdmissionPolicy) -> Self {
        Self { policy }
    }

    /// The role this gate admits.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.policy.role
    }

    /// Decide whether the owner of `credentials` may enter.
    ///
    /// Never fails: storage and lookup errors become `DenyUnauthenticated`.
    pub async fn admit(
        &self,
        credentials: &(impl CredentialStore + ?Sized),
        identities: &dyn IdentityRepository,
    ) -> Admission {
        let Some(user) = session_resolver::resolve(credentials).await else {
            return Admission::unauthenticated();
        };

        let identity = match identities.find_by_id(user.id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::info!(user_id = %user.id, "Session refers to a missing account");
                return Admission::unauthenticated();
            }
            Err(e) => {
                tracing::error!(
                    user_id = %user.id,
                    area = %self.role(),
                    error = %e,
                    "Identity lookup failed; denying access"
                );
                return Admission::unauthenticated();
            }
        };

        Admission {
            decision: self.policy.evaluate(Some(&identity)),
            identity: Some(identity),
        }
    }
}

/// State for the gate middleware: the application plus the area's gate.
#[derive(Clone)]
pub struct GateState {
    app: AppState,
    gate: RoleGate,
}

impl GateState {
    /// Gate state for `role`'s area.
    #[must_use]
    pub const fn new(app: AppState, role: Role) -> Self {
        Self {
            app,
            gate: RoleGate::new(role),
        }
    }
}

/// Middleware running a [`RoleGate`] in front of an area's routes.
///
/// Install with `layer(from_fn_with_state(GateState::new(..), role_gate))` so the
/// area fallback is gated too.
pub async fn role_gate(
    State(state): State<GateState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let gate = state.gate;
    let admission = gate.admit(&session, state.app.identities()).await;
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path().to_owned(), |uri| uri.0.path().to_owned());

    let user_id = admission.identity.as_ref().map(|i| i.id);
    match admission.decision {
        AdmissionDecision::Grant => {
            tracing::debug!(area = %gate.role(), user_id = ?user_id, "Access granted");
        }
        AdmissionDecision::DenyProfileIncomplete { .. } if is_profile_path(&path) => {
            tracing::debug!(area = %gate.role(), user_id = ?user_id, "Admitted to profile completion");
        }
        decision => {
            tracing::info!(
                area = %gate.role(),
                decision = decision.as_str(),
                user_id = ?user_id,
                path = %path,
                "Access denied"
            );
            return deny(decision, admission.identity);
        }
    }

    if let Some(identity) = admission.identity {
        set_sentry_user(&identity.id);
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

fn is_profile_path(path: &str) -> bool {
    path.trim_end_matches('/') == PROFILE_PATH
}

/// Fallback response for a denial.
fn deny(decision: AdmissionDecision, identity: Option<Identity>) -> Response {
    match decision {
        AdmissionDecision::DenyUnauthenticated => {
            (StatusCode::UNAUTHORIZED, AccessDeniedTemplate).into_response()
        }
        AdmissionDecision::DenyWrongRole { .. } => {
            (StatusCode::FORBIDDEN, AccessDeniedTemplate).into_response()
        }
        AdmissionDecision::DenyNotApproved { status } => (
            StatusCode::FORBIDDEN,
            ApprovalStatusTemplate {
                email: identity
                    .map(|i| i.email.to_string())
                    .unwrap_or_default(),
                status,
            },
        )
            .into_response(),
        AdmissionDecision::DenyProfileIncomplete { .. } => client_redirect(PROFILE_PATH),
        // Handled by the caller; never rendered as a denial.
        AdmissionDecision::Grant => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// A page that redirects the browser, for both htmx and plain requests.
pub fn client_redirect(target: &str) -> Response {
    let mut response = RedirectShellTemplate {
        target: target.to_owned(),
        message: "Lengkapi profil Anda terlebih dahulu.",
    }
    .into_response();

    if let Ok(value) = HeaderValue::from_str(target) {
        response.headers_mut().insert(HX_REDIRECT, value);
    }
    response
}

// =============================================================================
// Extractor
// =============================================================================

/// The identity admitted by the role gate.
///
/// Only available on routes behind [`role_gate`].
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("no admitted identity".to_owned()))
    }
}
