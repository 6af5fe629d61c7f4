//! Step and mode types for the program-plan wizard.
//!
//! A program plan (*rencana program*) is filled in over five steps that
//! always come in the same order. The route decides the mode: a plan ID in
//! the path means the plan is being edited, no ID means a new plan is being
//! created.

use serde::{Deserialize, Serialize};

use super::ProgramPlanId;
use super::id::ParseIdError;

/// One of the five sub-forms of a program plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "portal.plan_step", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Analisis,
    Dokumen,
    Metode,
    Strategi,
    Wawancara,
}

impl WizardStep {
    /// Every step, in wizard order.
    pub const ALL: [Self; 5] = [
        Self::Analisis,
        Self::Dokumen,
        Self::Metode,
        Self::Strategi,
        Self::Wawancara,
    ];

    /// URL segment and storage key.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Analisis => "analisis",
            Self::Dokumen => "dokumen",
            Self::Metode => "metode",
            Self::Strategi => "strategi",
            Self::Wawancara => "wawancara",
        }
    }

    /// Heading shown above the step's form.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Analisis => "Analisis Kebutuhan",
            Self::Dokumen => "Kajian Dokumen",
            Self::Metode => "Metode Pendampingan",
            Self::Strategi => "Strategi Pelaksanaan",
            Self::Wawancara => "Wawancara",
        }
    }

    /// 1-based position within the wizard.
    #[must_use]
    pub const fn number(self) -> usize {
        match self {
            Self::Analisis => 1,
            Self::Dokumen => 2,
            Self::Metode => 3,
            Self::Strategi => 4,
            Self::Wawancara => 5,
        }
    }

    /// The step after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Analisis => Some(Self::Dokumen),
            Self::Dokumen => Some(Self::Metode),
            Self::Metode => Some(Self::Strategi),
            Self::Strategi => Some(Self::Wawancara),
            Self::Wawancara => None,
        }
    }

    /// The step before this one, if any.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Analisis => None,
            Self::Dokumen => Some(Self::Analisis),
            Self::Metode => Some(Self::Dokumen),
            Self::Strategi => Some(Self::Metode),
            Self::Wawancara => Some(Self::Strategi),
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error returned for an unknown step slug.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown wizard step: {0}")]
pub struct UnknownStep(pub String);

impl std::str::FromStr for WizardStep {
    type Err = UnknownStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.slug() == s)
            .ok_or_else(|| UnknownStep(s.to_owned()))
    }
}

/// Whether the wizard is creating a new plan or editing an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardMode {
    Create,
    Edit,
}

impl WizardMode {
    /// The mode implied by the presence of a record ID.
    #[must_use]
    pub const fn for_record(record_id: Option<ProgramPlanId>) -> Self {
        if record_id.is_some() {
            Self::Edit
        } else {
            Self::Create
        }
    }
}

/// A record reference in the route that is present but unusable.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed record reference {raw:?}: {reason}")]
pub struct RecordRefError {
    /// The segment as it appeared in the route.
    pub raw: String,
    /// Why it was rejected.
    pub reason: ParseIdError,
}

/// Interpret the record ID segment of a wizard route.
///
/// A missing or blank segment cannot be told apart from "no record yet" and
/// yields `Ok(None)` (create mode). Anything else must be a positive integer;
/// otherwise the reference is malformed and the caller should show an error
/// rather than silently starting a new plan.
///
/// # Errors
///
/// Returns [`RecordRefError`] if the segment is non-blank but not a valid ID.
pub fn parse_record_ref(raw: Option<&str>) -> Result<Option<ProgramPlanId>, RecordRefError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    raw.parse::<ProgramPlanId>()
        .map(Some)
        .map_err(|reason| RecordRefError {
            raw: raw.to_owned(),
            reason,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_fixed_and_total() {
        let mut walked = vec![WizardStep::Analisis];
        while let Some(next) = walked.last().and_then(|s| s.next()) {
            walked.push(next);
        }
        assert_eq!(walked, WizardStep::ALL);

        for (index, step) in WizardStep::ALL.iter().enumerate() {
            assert_eq!(step.number(), index + 1);
        }
    }

    #[test]
    fn test_previous_mirrors_next() {
        for step in WizardStep::ALL {
            if let Some(next) = step.next() {
                assert_eq!(next.previous(), Some(step));
            }
        }
        assert_eq!(WizardStep::Analisis.previous(), None);
    }

    #[test]
    fn test_slug_round_trip() {
        for step in WizardStep::ALL {
            assert_eq!(step.slug().parse::<WizardStep>().unwrap(), step);
        }
        assert_eq!(
            "laporan".parse::<WizardStep>(),
            Err(UnknownStep("laporan".to_owned()))
        );
    }

    #[test]
    fn test_missing_or_blank_ref_means_create() {
        assert_eq!(parse_record_ref(None), Ok(None));
        assert_eq!(parse_record_ref(Some("")), Ok(None));
        assert_eq!(parse_record_ref(Some("  ")), Ok(None));
        assert_eq!(WizardMode::for_record(None), WizardMode::Create);
    }

    #[test]
    fn test_numeric_ref_means_edit() {
        let id = parse_record_ref(Some("42")).unwrap();
        assert_eq!(id, Some(ProgramPlanId::new(42)));
        assert_eq!(WizardMode::for_record(id), WizardMode::Edit);
    }

    #[test]
    fn test_garbage_ref_is_an_error() {
        let err = parse_record_ref(Some("abc")).unwrap_err();
        assert_eq!(err.raw, "abc");
        assert!(parse_record_ref(Some("0")).is_err());
        assert!(parse_record_ref(Some("-1")).is_err());
    }
}
