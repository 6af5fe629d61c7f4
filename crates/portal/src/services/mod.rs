//! Business logic services.
//!
//! - [`session_resolver`] - who is signed in, from the session
//! - [`auth`] - password login and account creation
//! - [`wizard`] - program plan wizard navigation, loads and saves

pub mod auth;
pub mod session_resolver;
pub mod wizard;
