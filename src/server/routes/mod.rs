//! Route handlers module.

pub mod health;
pub mod page;
pub mod state;
