//! CLI command implementations

pub mod add;
pub mod remove;
pub mod start;
pub mod status;
pub mod stop;
