//! # Menu Core
//!
//! Domain entities, services, and repository traits for the hierarchical
//! permission-menu catalog.

pub mod domain;
pub mod error;
pub mod notify;
pub mod repositories;
pub mod services;

// Re-export domain entities
pub use domain::*;
pub use error::DomainError;
