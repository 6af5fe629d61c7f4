//! Domain models for the portal.

pub mod program_plan;
pub mod session;

pub use program_plan::{FieldSpec, StepData, fields_for};
pub use session::{SessionUser, keys as session_keys};
