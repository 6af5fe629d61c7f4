//! Admission policy for role areas.
//!
//! Decides, for one request, whether a caller may enter a role area. The
//! decision is a pure function of the resolved identity (if any) and the
//! area's policy, evaluated in a fixed order:
//!
//! 1. no identity → [`AdmissionDecision::DenyUnauthenticated`]
//! 2. different role → [`AdmissionDecision::DenyWrongRole`]
//! 3. approval required and not approved → [`AdmissionDecision::DenyNotApproved`]
//! 4. profile required and incomplete → [`AdmissionDecision::DenyProfileIncomplete`]
//! 5. otherwise → [`AdmissionDecision::Grant`]
//!
//! Pending and rejected accounts both stop at step 3. Telling them apart is
//! left to whoever renders the denial.

use serde::Serialize;

use crate::types::{ApprovalStatus, Identity, Role};

/// Outcome of evaluating one identity against one role area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AdmissionDecision {
    /// The caller may enter the area.
    Grant,
    /// No identity could be established for the caller.
    DenyUnauthenticated,
    /// The caller is signed in but belongs to another area.
    DenyWrongRole {
        /// The caller's own role.
        actual: Role,
    },
    /// The caller's account has not been approved.
    DenyNotApproved {
        /// `Pending` or `Rejected`.
        status: ApprovalStatus,
    },
    /// The caller is approved but must finish their profile first.
    ///
    /// This is a soft denial: callers route it to profile completion rather
    /// than to an error page.
    DenyProfileIncomplete {
        /// The area whose profile page should be shown.
        role: Role,
    },
}

impl AdmissionDecision {
    /// Whether the decision lets the caller in unconditionally.
    #[must_use]
    pub const fn is_grant(&self) -> bool {
        matches!(self, Self::Grant)
    }

    /// Short machine-readable name, used as a log field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::DenyUnauthenticated => "deny_unauthenticated",
            Self::DenyWrongRole { .. } => "deny_wrong_role",
            Self::DenyNotApproved { .. } => "deny_not_approved",
            Self::DenyProfileIncomplete { .. } => "deny_profile_incomplete",
        }
    }
}

/// Admission requirements of one role area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    /// The role a caller must have.
    pub role: Role,
    /// Whether the account must be approved.
    pub approval_required: bool,
    /// Whether the profile must be complete.
    pub profile_required: bool,
}

impl AdmissionPolicy {
    /// The standard policy for a role's own area.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        Self {
            role,
            approval_required: role.requires_approval(),
            profile_required: role.requires_profile(),
        }
    }

    /// Evaluate an identity against this policy.
    #[must_use]
    pub fn evaluate(&self, identity: Option<&Identity>) -> AdmissionDecision {
        let Some(identity) = identity else {
            return AdmissionDecision::DenyUnauthenticated;
        };

        if identity.role != self.role {
            return AdmissionDecision::DenyWrongRole {
                actual: identity.role,
            };
        }

        // Admins have no approval lifecycle, whatever the column says.
        if identity.role == Role::Admin {
            return AdmissionDecision::Grant;
        }

        if self.approval_required && identity.status_approval != ApprovalStatus::Approved {
            return AdmissionDecision::DenyNotApproved {
                status: identity.status_approval,
            };
        }

        if self.profile_required && !identity.profile_complete() {
            return AdmissionDecision::DenyProfileIncomplete { role: self.role };
        }

        AdmissionDecision::Grant
    }
}

/// Evaluate an identity against the standard policy of `required_role`.
#[must_use]
pub fn evaluate(identity: Option<&Identity>, required_role: Role) -> AdmissionDecision {
    AdmissionPolicy::for_role(required_role).evaluate(identity)
}
