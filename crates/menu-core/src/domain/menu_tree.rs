// ============================================================================
// Menu Core - Tree Views
// File: crates/menu-core/src/domain/menu_tree.rs
// Description: Nested views assembled from flat menu records
// ============================================================================

use menu_shared::constants::{SYNTHETIC_ROOT_ID, SYNTHETIC_ROOT_PARENT_ID, SYNTHETIC_ROOT_TITLE};
use menu_shared::MenuId;
use serde::{Deserialize, Serialize};

use super::menu_node::{MenuNode, MenuNodeType};

/// Per-node display metadata carried by the navigational tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuMeta {
    pub title: String,
    pub icon: Option<String>,
    /// Redirect target when the node is an external link, `None` otherwise.
    pub link: Option<String>,
    pub hidden: bool,
}

/// One node of the navigational tree view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuTreeNode {
    pub id: MenuId,
    pub parent_id: MenuId,
    pub name: String,
    pub path: String,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub permission_code: Option<String>,
    pub node_type: MenuNodeType,
    pub sort_order: i32,
    pub depth: i32,
    pub has_children: bool,
    pub meta: MenuMeta,
    pub children: Vec<MenuTreeNode>,
}

impl MenuTreeNode {
    pub fn from_node(node: &MenuNode, children: Vec<MenuTreeNode>) -> Self {
        Self {
            id: node.id.clone(),
            parent_id: node.parent_id.clone(),
            name: node.name.clone(),
            path: node.path.clone(),
            component: node.component.clone(),
            redirect: node.redirect.clone(),
            permission_code: node.permission_code.clone(),
            node_type: node.node_type,
            sort_order: node.sort_order,
            depth: node.depth,
            has_children: node.has_children,
            meta: MenuMeta {
                title: node.title.clone(),
                icon: node.icon.clone(),
                link: if node.is_link { node.redirect.clone() } else { None },
                hidden: node.is_hidden,
            },
            children,
        }
    }
}

/// Minimal picker view, used where only titles and structure matter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuPickerNode {
    pub id: MenuId,
    pub parent_id: MenuId,
    pub title: String,
    pub children: Vec<MenuPickerNode>,
}

impl MenuPickerNode {
    /// Synthetic wrapper giving consumers a single top-level handle.
    /// Never persisted.
    pub fn synthetic_root(children: Vec<MenuPickerNode>) -> Self {
        Self {
            id: SYNTHETIC_ROOT_ID.to_string(),
            parent_id: SYNTHETIC_ROOT_PARENT_ID.to_string(),
            title: SYNTHETIC_ROOT_TITLE.to_string(),
            children,
        }
    }
}

impl From<&MenuTreeNode> for MenuPickerNode {
    fn from(node: &MenuTreeNode) -> Self {
        Self {
            id: node.id.clone(),
            parent_id: node.parent_id.clone(),
            title: node.meta.title.clone(),
            children: node.children.iter().map(MenuPickerNode::from).collect(),
        }
    }
}
