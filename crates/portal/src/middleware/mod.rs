//! HTTP middleware stack for the portal.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Security headers
//! 4. Request ID (add unique ID to each request)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Role gate (per area: `/admin`, `/pengawas`, `/sekolah`)

pub mod gate;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use gate::{CurrentIdentity, GateState, RoleGate, role_gate};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_layer};
