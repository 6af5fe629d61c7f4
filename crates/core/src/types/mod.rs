//! Core types for the supervision portal.
//!
//! This module provides type-safe wrappers for the portal's domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod role;
pub mod wizard;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
pub use role::*;
pub use wizard::{RecordRefError, UnknownStep, WizardMode, WizardStep, parse_record_ref};
