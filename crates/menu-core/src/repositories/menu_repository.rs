// ============================================================================
// Menu Core - Menu Repository Port
// File: crates/menu-core/src/repositories/menu_repository.rs
// ============================================================================
//! Record-store port: filtered listing, CRUD, batch soft delete, descendant
//! closure, and derived-field write-back.

use async_trait::async_trait;
use menu_shared::{MenuId, UserId};

use crate::domain::{MenuNode, MenuNodeType};
use crate::error::DomainError;

/// Predicate vocabulary for `list`/`count`. Every field is conjunctive.
#[derive(Debug, Clone, Default)]
pub struct MenuFilter {
    pub include_deleted: bool,
    pub include_buttons: bool,
    pub ids_in: Option<Vec<MenuId>>,
    pub ids_not_in: Option<Vec<MenuId>>,
    pub id_ne: Option<MenuId>,
    pub name_eq: Option<String>,
    pub path_eq: Option<String>,
    pub permission_code_eq: Option<String>,
    pub parent_id_eq: Option<MenuId>,
}

impl MenuFilter {
    /// Non-deleted nodes, buttons included.
    pub fn active() -> Self {
        Self { include_buttons: true, ..Self::default() }
    }

    /// Non-deleted nodes, buttons excluded.
    pub fn navigational() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, ids: Vec<MenuId>) -> Self {
        self.ids_in = Some(ids);
        self
    }

    pub fn without_ids(mut self, ids: Vec<MenuId>) -> Self {
        self.ids_not_in = Some(ids);
        self
    }

    /// Reference semantics for the predicate; adapters either call this
    /// directly (in-memory) or translate it to an equivalent query (SQL).
    pub fn matches(&self, node: &MenuNode) -> bool {
        if !self.include_deleted && node.deleted {
            return false;
        }
        if !self.include_buttons && node.node_type == MenuNodeType::Button {
            return false;
        }
        if let Some(ids) = &self.ids_in {
            if !ids.contains(&node.id) {
                return false;
            }
        }
        if let Some(ids) = &self.ids_not_in {
            if ids.contains(&node.id) {
                return false;
            }
        }
        if let Some(id) = &self.id_ne {
            if &node.id == id {
                return false;
            }
        }
        if let Some(name) = &self.name_eq {
            if &node.name != name {
                return false;
            }
        }
        if let Some(path) = &self.path_eq {
            if &node.path != path {
                return false;
            }
        }
        if let Some(code) = &self.permission_code_eq {
            if node.permission_code.as_deref() != Some(code.as_str()) {
                return false;
            }
        }
        if let Some(parent) = &self.parent_id_eq {
            if &node.parent_id != parent {
                return false;
            }
        }
        true
    }
}

/// One row of the derived-field write-back plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedUpdate {
    pub id: MenuId,
    pub depth: i32,
    pub has_children: bool,
}

#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Matching records ordered by (`sort_order`, `id`) ascending.
    async fn list(&self, filter: &MenuFilter) -> Result<Vec<MenuNode>, DomainError>;

    async fn count(&self, filter: &MenuFilter) -> Result<i64, DomainError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<MenuNode>, DomainError>;

    async fn insert(&self, node: &MenuNode) -> Result<MenuNode, DomainError>;

    async fn update(&self, node: &MenuNode) -> Result<MenuNode, DomainError>;

    /// Flags every listed record as deleted in one batch, stamping the
    /// acting user. Returns the number of rows flagged.
    async fn soft_delete_many(&self, ids: &[MenuId], removed_by: UserId)
        -> Result<u64, DomainError>;

    /// Self-inclusive transitive closure over the parent chain, regardless
    /// of deletion state.
    async fn descendant_closure(&self, root_ids: &[MenuId]) -> Result<Vec<MenuId>, DomainError>;

    /// Writes the derived-field plan back as a single atomic batch.
    async fn sync_derived(&self, updates: &[DerivedUpdate]) -> Result<u64, DomainError>;
}
