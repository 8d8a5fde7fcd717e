//! Shared slot state.
//!
//! Provides the thread-safe store that every connection reads from and
//! writes to, along with the snapshot and label types.

pub mod state_store;
pub mod types;

pub use state_store::*;
pub use types::*;
