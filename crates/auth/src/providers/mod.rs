//! Identity provider implementations.
//!
//! - `GoTrueProvider`: the hosted auth service over its REST API
//! - `MockProvider`: in-memory accounts for development and tests

mod gotrue;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use gotrue::GoTrueProvider;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockProvider;
