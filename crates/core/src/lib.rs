//! Functional core for launchpad.
//!
//! Everything in here is free of I/O: domain types, the capability traits
//! implemented by the auth shell, the route access policy, form validation,
//! notification and theme types.

pub mod auth;
pub mod notify;
pub mod theme;
