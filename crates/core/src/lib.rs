//! Pengawas Core - Shared domain types for the supervision portal.
//!
//! This crate provides the types used across the portal components:
//! - `portal` - Role-gated web application (admin, pengawas, sekolah areas)
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure decision logic - no I/O, no
//! database access, no HTTP. Whatever needs a session or a connection pool
//! lives in the portal crate and calls into this one.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, identities and wizard steps
//! - [`access`] - The admission policy that decides whether an identity may
//!   enter a role area

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;

pub use access::{AdmissionDecision, AdmissionPolicy, evaluate};
pub use types::*;
