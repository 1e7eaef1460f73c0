//! CLI command implementations

pub mod clear;
pub mod info;
pub mod prune;
pub mod regenerate;
pub mod status;
pub mod warm;
