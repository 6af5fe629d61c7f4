//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::PortalConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "portal_session";

/// Session expiry time in seconds (8 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 8 * 60 * 60;

/// The session table name was rejected by the store.
#[derive(Debug, thiserror::Error)]
#[error("invalid session table: {0}")]
pub struct SessionTableError(String);

/// Create the session layer with `PostgreSQL` store.
///
/// The `portal.session` table is created by migration, not at startup.
///
/// # Errors
///
/// Returns `SessionTableError` if the schema or table name is invalid.
pub fn create_session_layer(
    pool: &PgPool,
    config: &PortalConfig,
) -> Result<SessionManagerLayer<PostgresStore>, SessionTableError> {
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("portal")
        .map_err(SessionTableError)?
        .with_table_name("session")
        .map_err(SessionTableError)?;

    Ok(session_layer(store, config.is_secure()))
}

/// Apply the portal's cookie settings to any session store.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(store: S, secure: bool) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
