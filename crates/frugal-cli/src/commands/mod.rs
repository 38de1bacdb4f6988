//! CLI command implementations.

pub mod check;
pub mod policies;
pub mod run;
