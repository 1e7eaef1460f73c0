//! iconforge CLI library.
//!
//! Command implementations behind the `iconforge` binary, plus the shared
//! project/config resolution and logging setup.

pub mod commands;
pub mod logging;
pub mod project;
