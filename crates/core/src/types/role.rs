//! Portal roles and account approval status.

use serde::{Deserialize, Serialize};

/// Error returned when a role or status name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// The three actor roles of the portal.
///
/// Every identity has exactly one role, and each role owns one area of the
/// application (`/admin`, `/pengawas`, `/sekolah`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "portal.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator. Has no approval lifecycle.
    Admin,
    /// School inspector.
    Pengawas,
    /// School.
    Sekolah,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Pengawas, Self::Sekolah];

    /// Whether accounts with this role must be approved by an administrator
    /// before they may enter their area.
    #[must_use]
    pub const fn requires_approval(self) -> bool {
        !matches!(self, Self::Admin)
    }

    /// Whether this role's area requires a completed profile.
    #[must_use]
    pub const fn requires_profile(self) -> bool {
        matches!(self, Self::Pengawas)
    }

    /// Stable lowercase name, also the URL prefix of the role's area.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Pengawas => "pengawas",
            Self::Sekolah => "sekolah",
        }
    }

    /// Root path of the role's area.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Pengawas => "/pengawas",
            Self::Sekolah => "/sekolah",
        }
    }

    /// Human-readable area name for page titles.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Pengawas => "Pengawas",
            Self::Sekolah => "Sekolah",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "pengawas" => Ok(Self::Pengawas),
            "sekolah" => Ok(Self::Sekolah),
            _ => Err(ParseEnumError {
                kind: "role",
                value: s.to_owned(),
            }),
        }
    }
}

/// Approval lifecycle of a pengawas or sekolah account.
///
/// New registrations start as `Pending`; an administrator moves them to
/// `Approved` or `Rejected`. The value is stored for admins too but never
/// consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "portal.approval_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Indonesian label shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Menunggu persetujuan",
            Self::Approved => "Disetujui",
            Self::Rejected => "Ditolak",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseEnumError {
                kind: "approval status",
                value: s.to_owned(),
            }),
        }
    }
}
