//! Authentication route handlers.
//!
//! Password login for every role. A successful login only records who the
//! user is; whether they may enter their area is up to the role gate.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::clear_sentry_user;
use crate::models::SessionUser;
use crate::services::auth::AuthError;
use crate::services::session_resolver;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// Map an error code from the query string to a message.
///
/// Only known codes are shown, so the query string cannot inject text.
fn error_message(code: &str) -> Option<&'static str> {
    match code {
        "credentials" => Some("Email atau kata sandi salah."),
        "session" => Some("Sesi tidak dapat dibuat. Silakan coba lagi."),
        "server" => Some("Terjadi kesalahan pada server. Silakan coba lagi."),
        _ => None,
    }
}

fn success_message(code: &str) -> Option<&'static str> {
    match code {
        "logout" => Some("Anda telah keluar."),
        _ => None,
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().and_then(error_message),
        success: query.success.as_deref().and_then(success_message),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let identity = match state
        .auth()
        .login_with_password(&form.email, &form.password)
        .await
    {
        Ok(identity) => identity,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed: invalid credentials");
            return Redirect::to("/auth/login?error=credentials").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            return Redirect::to("/auth/login?error=server").into_response();
        }
    };

    // New session ID on privilege change
    if let Err(e) = session.cycle_id().await {
        tracing::error!(error = %e, "Failed to cycle session id");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    let user = SessionUser {
        id: identity.id,
        email: identity.email.clone(),
    };
    if let Err(e) = session_resolver::sign_in(&session, &user).await {
        tracing::error!(error = %e, "Failed to set session");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    tracing::info!(user_id = %identity.id, role = %identity.role, "User logged in");
    Redirect::to(identity.role.home_path()).into_response()
}

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush session on logout");
        if let Err(e) = session_resolver::sign_out(&session).await {
            tracing::error!(error = %e, "Failed to clear session user");
        }
    }
    clear_sentry_user();
    Redirect::to("/auth/login?success=logout").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_codes_are_ignored() {
        assert_eq!(error_message("<script>"), None);
        assert!(error_message("credentials").is_some());
        assert_eq!(success_message("credentials"), None);
    }

    #[test]
    fn test_login_template_shows_message() {
        let html = LoginTemplate {
            error: error_message("credentials"),
            success: None,
        }
        .render();
        assert!(html.is_ok_and(|h| h.contains("Email atau kata sandi salah.")));
    }
}
