//! # Menu Shared
//!
//! Shared types, constants, configuration, and telemetry for the menu
//! catalog workspace.

pub mod config;
pub mod constants;
pub mod telemetry;
pub mod types;

pub use types::*;
