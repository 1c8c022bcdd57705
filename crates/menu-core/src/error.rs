//! Domain errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Menu not found: {0}")]
    MenuNotFound(String),

    #[error("Parent menu not found: {0}")]
    ParentNotFound(String),

    #[error("Menu name already exists: {0}")]
    MenuNameAlreadyExists(String),

    #[error("Menu path already exists: {0}")]
    MenuPathAlreadyExists(String),

    #[error("Menu {0} cannot be moved under its own subtree")]
    MenuCycle(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}
