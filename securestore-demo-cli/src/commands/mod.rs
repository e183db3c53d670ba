//! CLI command implementations

pub mod exists;
pub mod get;
pub mod info;
pub mod remove;
pub mod set;
