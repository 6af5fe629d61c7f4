//! The authenticated caller as seen by the admission policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApprovalStatus, Email, Role, UserId};

/// An account's role and lifecycle attributes.
///
/// Identities are created by registration (or the CLI) and only their
/// approval status and display name change afterwards. The admission policy
/// reads them; it never writes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
    pub status_approval: ApprovalStatus,
    /// Display name; the one mandatory profile field.
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Whether the mandatory profile fields are filled in.
    ///
    /// A name made only of whitespace counts as missing.
    #[must_use]
    pub fn profile_complete(&self) -> bool {
        self.display_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }

    /// Name to greet the user with, falling back to the email address.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.as_str(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(role: Role, status: ApprovalStatus, name: Option<&str>) -> Identity {
        Identity {
            id: UserId::new(1),
            email: Email::parse("user@portal.id").unwrap(),
            role,
            status_approval: status,
            display_name: name.map(str::to_owned),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_blank_display_name_is_incomplete() {
        assert!(!identity(Role::Pengawas, ApprovalStatus::Approved, None).profile_complete());
        assert!(!identity(Role::Pengawas, ApprovalStatus::Approved, Some("  ")).profile_complete());
        assert!(identity(Role::Pengawas, ApprovalStatus::Approved, Some("Sri")).profile_complete());
    }

    #[test]
    fn test_greeting_falls_back_to_email() {
        let anon = identity(Role::Sekolah, ApprovalStatus::Approved, Some(""));
        assert_eq!(anon.greeting_name(), "user@portal.id");
        let named = identity(Role::Sekolah, ApprovalStatus::Approved, Some("SDN 1"));
        assert_eq!(named.greeting_name(), "SDN 1");
    }
}
