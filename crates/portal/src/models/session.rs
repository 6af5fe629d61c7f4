//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use pengawas_core::{Email, UserId};

/// Session-stored user identity.
///
/// Only the account's ID and email live in the session. Role, approval
/// status and profile state are read fresh from the database on every gated
/// request so that an admin's decision takes effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Account ID.
    pub id: UserId,
    /// Login email.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
