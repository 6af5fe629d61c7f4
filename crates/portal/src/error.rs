//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server-side failures are captured
//! to Sentry before the response is built; clients only ever see a short,
//! neutral message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use pengawas_core::RecordRefError;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::wizard::WizardError;

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The route names a record with an unusable ID.
    #[error("Malformed record reference: {0}")]
    MalformedRecordReference(#[from] RecordRefError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User may not access this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::MalformedRecordReference(e) => Self::MalformedRecordReference(e),
            WizardError::NotFound(id) => Self::NotFound(format!("program plan {id}")),
            WizardError::Forbidden(id) => Self::Forbidden(format!("program plan {id}")),
            // Handlers re-render the step form on save failures; anything
            // that still gets here is a plain server error.
            WizardError::Lookup(e) | WizardError::Persistence { source: e, .. } => {
                Self::Database(e)
            }
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::MalformedRecordReference(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) => "Terjadi kesalahan pada server.",
            Self::Auth(AuthError::InvalidCredentials) => "Email atau kata sandi salah.",
            Self::Auth(AuthError::UserAlreadyExists) => "Email sudah terdaftar.",
            Self::Auth(AuthError::WeakPassword(_)) => "Kata sandi terlalu pendek.",
            Self::Auth(AuthError::InvalidEmail(_)) => "Alamat email tidak valid.",
            Self::Auth(_) => "Terjadi kesalahan autentikasi.",
            Self::MalformedRecordReference(_) => "Alamat rencana program tidak valid.",
            Self::NotFound(_) => "Halaman tidak ditemukan.",
            Self::Unauthorized(_) | Self::Forbidden(_) => "Halaman ini tidak tersedia untuk Anda.",
            Self::BadRequest(_) => "Permintaan tidak valid.",
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
///
/// Only the account ID is attached; emails stay out of error reports.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use pengawas_core::{ProgramPlanId, WizardStep, parse_record_ref};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("program plan 9".to_string());
        assert_eq!(err.to_string(), "Not found: program plan 9");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_wizard_errors_map_to_statuses() {
        let malformed = parse_record_ref(Some("abc")).err().map(WizardError::from);
        assert!(malformed.is_some());
        if let Some(err) = malformed {
            assert_eq!(AppError::from(err).status(), StatusCode::BAD_REQUEST);
        }

        let id = ProgramPlanId::new(3);
        assert_eq!(
            AppError::from(WizardError::NotFound(id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(WizardError::Forbidden(id)).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(WizardError::Persistence {
                step: WizardStep::Metode,
                source: RepositoryError::NotFound,
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
