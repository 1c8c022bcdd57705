//! Role collaborator port (read-only joins plus cascade grant cleanup)

use async_trait::async_trait;
use menu_shared::{MenuId, UserId};

use crate::error::DomainError;

#[async_trait]
pub trait RoleGrantRepository: Send + Sync {
    /// Menu ids reachable by the user through role membership
    /// (User -> Role -> Menu join), duplicates removed.
    async fn menu_ids_for_user(&self, user_id: UserId) -> Result<Vec<MenuId>, DomainError>;

    /// Drops every grant referencing the given menu ids. Runs after a
    /// cascade soft-delete commits. Returns the number of grants removed.
    async fn remove_grants_for_menus(&self, menu_ids: &[MenuId]) -> Result<u64, DomainError>;
}
