// ============================================================================
// Menu Core - Menu Node Entity
// File: crates/menu-core/src/domain/menu_node.rs
// Description: Catalog node (directory, page, or button) with derived
//              hierarchy metadata
// ============================================================================

use chrono::{DateTime, Utc};
use menu_shared::constants::ROOT_PARENT_ID;
use menu_shared::{new_menu_id, MenuId, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Node kind. Buttons carry permission codes but never appear in
/// navigational trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MenuNodeType {
    Directory,
    #[default]
    Page,
    Button,
}

impl MenuNodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuNodeType::Directory => "directory",
            MenuNodeType::Page => "page",
            MenuNodeType::Button => "button",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "directory" => Some(MenuNodeType::Directory),
            "page" => Some(MenuNodeType::Page),
            "button" => Some(MenuNodeType::Button),
            _ => None,
        }
    }
}

/// True when a `parent_id` value marks a top-level node. The empty string is
/// accepted alongside the sentinel for records imported from older data.
pub fn is_root_parent(parent_id: &str) -> bool {
    parent_id.is_empty() || parent_id == ROOT_PARENT_ID
}

/// Menu catalog entity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MenuNode {
    pub id: MenuId,

    /// Parent node id, or the `"0"` sentinel for top-level nodes.
    pub parent_id: MenuId,

    #[validate(length(min = 2, max = 100, message = "Menu name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 100, message = "Menu title too long"))]
    pub title: String,

    #[validate(length(max = 255, message = "Menu path too long"))]
    pub path: String,

    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,

    #[validate(length(max = 128, message = "Permission code too long"))]
    pub permission_code: Option<String>,

    pub node_type: MenuNodeType,
    pub sort_order: i32,
    pub is_link: bool,
    pub is_hidden: bool,

    /// Derived: 1-based distance from a root along the parent chain.
    /// Recomputed globally after every structural change.
    pub depth: i32,

    /// Derived: true iff at least one non-deleted node has this node as
    /// parent. Recomputed globally after every structural change.
    pub has_children: bool,

    pub deleted: bool,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<UserId>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<UserId>,
}

impl MenuNode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parent_id: MenuId,
        name: String,
        title: String,
        path: String,
        node_type: MenuNodeType,
        sort_order: i32,
        depth: i32,
        created_by: Option<UserId>,
    ) -> Result<Self, validator::ValidationErrors> {
        let node = Self {
            id: new_menu_id(),
            parent_id: if is_root_parent(&parent_id) {
                ROOT_PARENT_ID.to_string()
            } else {
                parent_id
            },
            name: name.trim().to_string(),
            title: title.trim().to_string(),
            path: path.trim().to_string(),
            component: None,
            redirect: None,
            icon: None,
            permission_code: None,
            node_type,
            sort_order,
            is_link: false,
            is_hidden: false,
            depth,
            has_children: false,
            deleted: false,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            modified_by: None,
            removed_at: None,
            removed_by: None,
        };

        node.validate()?;
        Ok(node)
    }

    pub fn is_root(&self) -> bool {
        is_root_parent(&self.parent_id)
    }

    pub fn is_button(&self) -> bool {
        self.node_type == MenuNodeType::Button
    }

    pub fn soft_delete(&mut self, removed_by: UserId) {
        self.deleted = true;
        self.removed_at = Some(Utc::now());
        self.removed_by = Some(removed_by);
    }
}
