// ============================================================================
// Menu Core - Menu Service
// File: crates/menu-core/src/services/menu_service.rs
// ============================================================================
//! Owning service for the menu catalog. Every structural mutation writes
//! through the record store, re-runs the global derived-field sync, and ends
//! with a best-effort permission-change notification. Reads assemble tree
//! views and aggregate permission codes without side effects.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use menu_shared::constants::ROOT_PARENT_ID;
use menu_shared::{MenuId, UserId};
use tracing::{info, warn};
use validator::Validate;

use crate::domain::{is_root_parent, MenuNode, MenuNodeType, MenuPickerNode, MenuTreeNode};
use crate::error::DomainError;
use crate::notify::{ChangeNotifier, PermissionChangeEvent};
use crate::repositories::{MenuFilter, MenuRepository, RoleGrantRepository};
use crate::services::{hierarchy, tree};

/// Input for `create`.
#[derive(Debug, Clone)]
pub struct CreateMenu {
    pub parent_id: MenuId,
    pub name: String,
    pub title: String,
    pub path: String,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,
    pub permission_code: Option<String>,
    pub node_type: MenuNodeType,
    pub sort_order: i32,
    pub is_link: bool,
    pub is_hidden: bool,
}

/// Input for `update`. `id` selects the record; the remaining fields replace
/// the stored values.
#[derive(Debug, Clone)]
pub struct UpdateMenu {
    pub id: MenuId,
    pub parent_id: MenuId,
    pub name: String,
    pub title: String,
    pub path: String,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,
    pub permission_code: Option<String>,
    pub node_type: MenuNodeType,
    pub sort_order: i32,
    pub is_link: bool,
    pub is_hidden: bool,
}

pub struct MenuService<R: MenuRepository, G: RoleGrantRepository, N: ChangeNotifier> {
    menus: Arc<R>,
    grants: Arc<G>,
    notifier: Arc<N>,
}

impl<R: MenuRepository, G: RoleGrantRepository, N: ChangeNotifier> MenuService<R, G, N> {
    pub fn new(menus: Arc<R>, grants: Arc<G>, notifier: Arc<N>) -> Self {
        Self { menus, grants, notifier }
    }

    /// Create a menu node. Name/path uniqueness is checked for non-buttons
    /// before any write; depth is seeded from the declared parent and the
    /// global derived sync runs afterwards.
    pub async fn create(&self, cmd: CreateMenu, acting_user: UserId) -> Result<MenuNode, DomainError> {
        info!("Creating menu: {}", cmd.name);

        if cmd.node_type != MenuNodeType::Button {
            self.assert_name_free(&cmd.name, None).await?;
            self.assert_path_free(&cmd.path, None).await?;
        }

        let (parent_id, depth) = self.resolve_parent(&cmd.parent_id).await?;

        let mut node = MenuNode::new(
            parent_id,
            cmd.name,
            cmd.title,
            cmd.path,
            cmd.node_type,
            cmd.sort_order,
            depth,
            Some(acting_user),
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        node.component = cmd.component;
        node.redirect = cmd.redirect;
        node.icon = cmd.icon;
        node.permission_code = cmd.permission_code;
        node.is_link = cmd.is_link;
        node.is_hidden = cmd.is_hidden;
        node.validate().map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let created = self.menus.insert(&node).await?;
        self.resync_derived().await?;
        self.publish_change().await;

        info!("Menu created: {}", created.id);
        Ok(created)
    }

    /// Update a menu node. On a parent change the new parent must exist and
    /// must not sit inside the node's own subtree.
    pub async fn update(&self, cmd: UpdateMenu, acting_user: UserId) -> Result<MenuNode, DomainError> {
        let existing = self
            .menus
            .find_by_id(&cmd.id)
            .await?
            .filter(|n| !n.deleted)
            .ok_or_else(|| DomainError::MenuNotFound(cmd.id.clone()))?;

        if cmd.node_type != MenuNodeType::Button {
            self.assert_name_free(&cmd.name, Some(&cmd.id)).await?;
            self.assert_path_free(&cmd.path, Some(&cmd.id)).await?;
        }

        let (parent_id, depth) = if cmd.parent_id == existing.parent_id {
            (existing.parent_id.clone(), existing.depth)
        } else {
            self.assert_no_cycle(&cmd.id, &cmd.parent_id).await?;
            self.resolve_parent(&cmd.parent_id).await?
        };

        let mut node = existing;
        node.parent_id = parent_id;
        node.name = cmd.name.trim().to_string();
        node.title = cmd.title.trim().to_string();
        node.path = cmd.path.trim().to_string();
        node.component = cmd.component;
        node.redirect = cmd.redirect;
        node.icon = cmd.icon;
        node.permission_code = cmd.permission_code;
        node.node_type = cmd.node_type;
        node.sort_order = cmd.sort_order;
        node.is_link = cmd.is_link;
        node.is_hidden = cmd.is_hidden;
        node.depth = depth;
        node.modified_at = Some(Utc::now());
        node.modified_by = Some(acting_user);
        node.validate().map_err(|e| DomainError::ValidationError(e.to_string()))?;

        let updated = self.menus.update(&node).await?;
        self.resync_derived().await?;
        self.publish_change().await;

        Ok(updated)
    }

    /// Cascade soft-delete: the targets and their full descendant closure
    /// are flagged in one batch, derived fields are re-synced, grants
    /// referencing the closure are dropped, and a notification is published
    /// even when nothing matched. Returns the number of nodes flagged.
    pub async fn remove(&self, ids: &[MenuId], acting_user: UserId) -> Result<u64, DomainError> {
        let mut flagged = 0;
        if !ids.is_empty() {
            let closure = self.menus.descendant_closure(ids).await?;
            if !closure.is_empty() {
                flagged = self.menus.soft_delete_many(&closure, acting_user).await?;
                self.resync_derived().await?;
                let dropped = self.grants.remove_grants_for_menus(&closure).await?;
                info!("Cascade removed {} menus, {} grants", flagged, dropped);
            }
        }
        self.publish_change().await;
        Ok(flagged)
    }

    pub async fn detail(&self, id: &str) -> Result<MenuNode, DomainError> {
        self.menus
            .find_by_id(id)
            .await?
            .filter(|n| !n.deleted)
            .ok_or_else(|| DomainError::MenuNotFound(id.to_string()))
    }

    /// Full catalog tree; buttons are included only on request (they also
    /// feed the role-grant assignment screen).
    pub async fn menu_tree(&self, include_buttons: bool) -> Result<Vec<MenuTreeNode>, DomainError> {
        let filter = if include_buttons { MenuFilter::active() } else { MenuFilter::navigational() };
        let nodes = self.menus.list(&filter).await?;
        Ok(tree::build_forest(&nodes))
    }

    /// Navigational tree restricted to the menus reachable through the
    /// user's role grants; buttons never appear here.
    pub async fn menu_tree_for_user(&self, user_id: UserId) -> Result<Vec<MenuTreeNode>, DomainError> {
        let menu_ids = self.grants.menu_ids_for_user(user_id).await?;
        if menu_ids.is_empty() {
            return Ok(Vec::new());
        }
        let nodes = self.menus.list(&MenuFilter::navigational().with_ids(menu_ids)).await?;
        Ok(tree::build_forest(&nodes))
    }

    /// Tree without the given node and its whole subtree, so a reparent
    /// picker cannot offer the node a place under itself. An unknown or
    /// root-sentinel id yields the full tree.
    pub async fn menu_tree_excluding(
        &self,
        node_id: Option<&str>,
        include_buttons: bool,
    ) -> Result<Vec<MenuTreeNode>, DomainError> {
        let base = if include_buttons { MenuFilter::active() } else { MenuFilter::navigational() };
        let filter = match node_id {
            Some(id) if !is_root_parent(id) => {
                let excluded = self.menus.descendant_closure(&[id.to_string()]).await?;
                if excluded.is_empty() {
                    base
                } else {
                    base.without_ids(excluded)
                }
            }
            _ => base,
        };
        let nodes = self.menus.list(&filter).await?;
        Ok(tree::build_forest(&nodes))
    }

    /// Non-button forest wrapped in the synthetic picker root.
    pub async fn picker_tree(&self) -> Result<MenuPickerNode, DomainError> {
        let nodes = self.menus.list(&MenuFilter::navigational()).await?;
        let forest = tree::build_forest(&nodes);
        Ok(MenuPickerNode::synthetic_root(forest.iter().map(MenuPickerNode::from).collect()))
    }

    /// Distinct non-empty permission codes reachable by the user through
    /// role membership, restricted to non-deleted nodes. Sorted for
    /// deterministic output.
    pub async fn permissions_for_user(&self, user_id: UserId) -> Result<Vec<String>, DomainError> {
        let menu_ids = self.grants.menu_ids_for_user(user_id).await?;
        if menu_ids.is_empty() {
            return Ok(Vec::new());
        }
        let nodes = self.menus.list(&MenuFilter::active().with_ids(menu_ids)).await?;
        Ok(collect_permission_codes(&nodes))
    }

    /// Distinct non-empty permission codes across the whole catalog.
    pub async fn all_permissions(&self) -> Result<Vec<String>, DomainError> {
        let nodes = self.menus.list(&MenuFilter::active()).await?;
        Ok(collect_permission_codes(&nodes))
    }

    /// How many non-deleted nodes (other than `excluding_id`) already carry
    /// the candidate code. The caller decides the conflict threshold.
    pub async fn permission_code_collisions(
        &self,
        code: &str,
        excluding_id: Option<&str>,
    ) -> Result<i64, DomainError> {
        let filter = MenuFilter {
            include_buttons: true,
            permission_code_eq: Some(code.to_string()),
            id_ne: excluding_id.map(str::to_string),
            ..MenuFilter::default()
        };
        self.menus.count(&filter).await
    }

    async fn assert_name_free(&self, name: &str, excluding: Option<&str>) -> Result<(), DomainError> {
        let filter = MenuFilter {
            include_buttons: true,
            name_eq: Some(name.trim().to_string()),
            id_ne: excluding.map(str::to_string),
            ..MenuFilter::default()
        };
        if self.menus.count(&filter).await? > 0 {
            warn!("Menu name already exists: {}", name);
            return Err(DomainError::MenuNameAlreadyExists(name.to_string()));
        }
        Ok(())
    }

    async fn assert_path_free(&self, path: &str, excluding: Option<&str>) -> Result<(), DomainError> {
        let filter = MenuFilter {
            include_buttons: true,
            path_eq: Some(path.trim().to_string()),
            id_ne: excluding.map(str::to_string),
            ..MenuFilter::default()
        };
        if self.menus.count(&filter).await? > 0 {
            warn!("Menu path already exists: {}", path);
            return Err(DomainError::MenuPathAlreadyExists(path.to_string()));
        }
        Ok(())
    }

    async fn resolve_parent(&self, parent_id: &str) -> Result<(MenuId, i32), DomainError> {
        if is_root_parent(parent_id) {
            return Ok((ROOT_PARENT_ID.to_string(), 1));
        }
        let parent = self
            .menus
            .find_by_id(parent_id)
            .await?
            .filter(|p| !p.deleted)
            .ok_or_else(|| DomainError::ParentNotFound(parent_id.to_string()))?;
        Ok((parent.id, parent.depth + 1))
    }

    /// Walks the proposed parent chain upward; hitting the node itself means
    /// the move would put it under its own subtree. A dangling link ends the
    /// walk (the depth pass logs and repairs those separately).
    async fn assert_no_cycle(&self, node_id: &str, new_parent_id: &str) -> Result<(), DomainError> {
        let mut cursor = new_parent_id.to_string();
        while !is_root_parent(&cursor) {
            if cursor == node_id {
                return Err(DomainError::MenuCycle(node_id.to_string()));
            }
            match self.menus.find_by_id(&cursor).await? {
                Some(parent) => cursor = parent.parent_id,
                None => break,
            }
        }
        Ok(())
    }

    /// One full recomputation pass over the non-deleted set, written back as
    /// a single batch. Runs inside every mutation flow so readers never see
    /// a fresh structure with stale derived fields for longer than the
    /// store's isolation window.
    async fn resync_derived(&self) -> Result<(), DomainError> {
        let nodes = self.menus.list(&MenuFilter::active()).await?;
        let plan = hierarchy::plan_derived_sync(&nodes);
        if !plan.is_empty() {
            self.menus.sync_derived(&plan).await?;
        }
        Ok(())
    }

    /// Best-effort: a failed publish is logged and never rolls back the
    /// structural commit.
    async fn publish_change(&self) {
        if let Err(e) = self.notifier.publish(PermissionChangeEvent::full_refresh()).await {
            warn!("Permission change notification failed: {}", e);
        }
    }
}

fn collect_permission_codes(nodes: &[MenuNode]) -> Vec<String> {
    let set: BTreeSet<String> = nodes
        .iter()
        .filter_map(|n| n.permission_code.as_deref())
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect();
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::DerivedUpdate;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemMenus {
        nodes: Mutex<HashMap<MenuId, MenuNode>>,
    }

    impl MemMenus {
        fn seed(nodes: Vec<MenuNode>) -> Arc<Self> {
            Arc::new(Self {
                nodes: Mutex::new(nodes.into_iter().map(|n| (n.id.clone(), n)).collect()),
            })
        }

        fn get(&self, id: &str) -> Option<MenuNode> {
            self.nodes.lock().unwrap().get(id).cloned()
        }
    }

    #[async_trait]
    impl MenuRepository for MemMenus {
        async fn list(&self, filter: &MenuFilter) -> Result<Vec<MenuNode>, DomainError> {
            let mut out: Vec<MenuNode> = self
                .nodes
                .lock()
                .unwrap()
                .values()
                .filter(|n| filter.matches(n))
                .cloned()
                .collect();
            out.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
            Ok(out)
        }

        async fn count(&self, filter: &MenuFilter) -> Result<i64, DomainError> {
            Ok(self.nodes.lock().unwrap().values().filter(|n| filter.matches(n)).count() as i64)
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<MenuNode>, DomainError> {
            Ok(self.get(id))
        }

        async fn insert(&self, node: &MenuNode) -> Result<MenuNode, DomainError> {
            self.nodes.lock().unwrap().insert(node.id.clone(), node.clone());
            Ok(node.clone())
        }

        async fn update(&self, node: &MenuNode) -> Result<MenuNode, DomainError> {
            self.nodes.lock().unwrap().insert(node.id.clone(), node.clone());
            Ok(node.clone())
        }

        async fn soft_delete_many(
            &self,
            ids: &[MenuId],
            removed_by: UserId,
        ) -> Result<u64, DomainError> {
            let mut nodes = self.nodes.lock().unwrap();
            let mut flagged = 0;
            for id in ids {
                if let Some(n) = nodes.get_mut(id) {
                    if !n.deleted {
                        n.soft_delete(removed_by);
                        flagged += 1;
                    }
                }
            }
            Ok(flagged)
        }

        async fn descendant_closure(&self, root_ids: &[MenuId]) -> Result<Vec<MenuId>, DomainError> {
            let nodes = self.nodes.lock().unwrap();
            let mut closure: Vec<MenuId> =
                root_ids.iter().filter(|id| nodes.contains_key(*id)).cloned().collect();
            let mut i = 0;
            while i < closure.len() {
                let parent = closure[i].clone();
                for n in nodes.values() {
                    if n.parent_id == parent && !closure.contains(&n.id) {
                        closure.push(n.id.clone());
                    }
                }
                i += 1;
            }
            Ok(closure)
        }

        async fn sync_derived(&self, updates: &[DerivedUpdate]) -> Result<u64, DomainError> {
            let mut nodes = self.nodes.lock().unwrap();
            for u in updates {
                if let Some(n) = nodes.get_mut(&u.id) {
                    n.depth = u.depth;
                    n.has_children = u.has_children;
                }
            }
            Ok(updates.len() as u64)
        }
    }

    #[derive(Default)]
    struct MemGrants {
        menus_by_user: Mutex<HashMap<UserId, Vec<MenuId>>>,
    }

    impl MemGrants {
        fn seed(user_id: UserId, menu_ids: Vec<MenuId>) -> Arc<Self> {
            let grants = Self::default();
            grants.menus_by_user.lock().unwrap().insert(user_id, menu_ids);
            Arc::new(grants)
        }
    }

    #[async_trait]
    impl RoleGrantRepository for MemGrants {
        async fn menu_ids_for_user(&self, user_id: UserId) -> Result<Vec<MenuId>, DomainError> {
            Ok(self.menus_by_user.lock().unwrap().get(&user_id).cloned().unwrap_or_default())
        }

        async fn remove_grants_for_menus(&self, menu_ids: &[MenuId]) -> Result<u64, DomainError> {
            let mut map = self.menus_by_user.lock().unwrap();
            let mut dropped = 0;
            for ids in map.values_mut() {
                let before = ids.len();
                ids.retain(|id| !menu_ids.contains(id));
                dropped += (before - ids.len()) as u64;
            }
            Ok(dropped)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<PermissionChangeEvent>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl ChangeNotifier for RecordingNotifier {
        async fn publish(&self, event: PermissionChangeEvent) -> Result<(), DomainError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DomainError::NotificationError("bus down".into()));
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn seeded(id: &str, parent: &str, name: &str, sort: i32, depth: i32, has_children: bool) -> MenuNode {
        let mut n = MenuNode::new(
            parent.to_string(),
            name.to_string(),
            name.to_string(),
            format!("/{}", name),
            MenuNodeType::Page,
            sort,
            depth,
            None,
        )
        .unwrap();
        n.id = id.to_string();
        n.has_children = has_children;
        n
    }

    fn button(id: &str, parent: &str, name: &str, code: &str) -> MenuNode {
        let mut n = seeded(id, parent, name, 0, 2, false);
        n.node_type = MenuNodeType::Button;
        n.permission_code = Some(code.to_string());
        n
    }

    /// A(1) -> B(2) -> D(4); A(1) -> C(3)
    fn scenario() -> Vec<MenuNode> {
        vec![
            seeded("1", ROOT_PARENT_ID, "System", 1, 1, true),
            seeded("2", "1", "Users", 1, 2, true),
            seeded("3", "1", "Roles", 2, 2, false),
            seeded("4", "2", "Accounts", 1, 3, false),
        ]
    }

    fn service(
        menus: Arc<MemMenus>,
        grants: Arc<MemGrants>,
    ) -> (MenuService<MemMenus, MemGrants, RecordingNotifier>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (MenuService::new(menus, grants, notifier.clone()), notifier)
    }

    fn create_cmd(parent: &str, name: &str) -> CreateMenu {
        CreateMenu {
            parent_id: parent.to_string(),
            name: name.to_string(),
            title: name.to_string(),
            path: format!("/{}", name),
            component: None,
            redirect: None,
            icon: None,
            permission_code: None,
            node_type: MenuNodeType::Page,
            sort_order: 1,
            is_link: false,
            is_hidden: false,
        }
    }

    fn update_cmd(node: &MenuNode) -> UpdateMenu {
        UpdateMenu {
            id: node.id.clone(),
            parent_id: node.parent_id.clone(),
            name: node.name.clone(),
            title: node.title.clone(),
            path: node.path.clone(),
            component: node.component.clone(),
            redirect: node.redirect.clone(),
            icon: node.icon.clone(),
            permission_code: node.permission_code.clone(),
            node_type: node.node_type,
            sort_order: node.sort_order,
            is_link: node.is_link,
            is_hidden: node.is_hidden,
        }
    }

    #[tokio::test]
    async fn test_create_child_seeds_depth_and_syncs_parent_flag() {
        let menus = MemMenus::seed(vec![seeded("1", ROOT_PARENT_ID, "System", 1, 1, false)]);
        let (service, notifier) = service(menus.clone(), Arc::new(MemGrants::default()));

        let created = service.create(create_cmd("1", "Audit"), 7).await.unwrap();
        assert_eq!(created.depth, 2);
        assert_eq!(created.created_by, Some(7));

        assert!(menus.get("1").unwrap().has_children);
        assert_eq!(notifier.events.lock().unwrap().len(), 1);
        assert_eq!(notifier.events.lock().unwrap()[0], PermissionChangeEvent::full_refresh());
    }

    #[tokio::test]
    async fn test_create_duplicate_name_fails_before_write() {
        let menus = MemMenus::seed(scenario());
        let (service, notifier) = service(menus.clone(), Arc::new(MemGrants::default()));

        let err = service.create(create_cmd(ROOT_PARENT_ID, "Users"), 1).await.unwrap_err();
        assert!(matches!(err, DomainError::MenuNameAlreadyExists(_)));
        assert_eq!(menus.nodes.lock().unwrap().len(), 4);
        assert!(notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_under_missing_parent_fails() {
        let menus = MemMenus::seed(vec![]);
        let (service, _) = service(menus, Arc::new(MemGrants::default()));

        let err = service.create(create_cmd("nope", "Audit"), 1).await.unwrap_err();
        assert!(matches!(err, DomainError::ParentNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_missing_menu_fails() {
        let menus = MemMenus::seed(vec![]);
        let (service, _) = service(menus, Arc::new(MemGrants::default()));

        let mut cmd = update_cmd(&seeded("9", ROOT_PARENT_ID, "Ghost", 1, 1, false));
        cmd.id = "9".to_string();
        let err = service.update(cmd, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::MenuNotFound(_)));
    }

    #[tokio::test]
    async fn test_reparent_under_own_subtree_rejected() {
        let menus = MemMenus::seed(scenario());
        let (service, _) = service(menus.clone(), Arc::new(MemGrants::default()));

        // move B (2) under its own child D (4)
        let mut cmd = update_cmd(&menus.get("2").unwrap());
        cmd.parent_id = "4".to_string();
        let err = service.update(cmd, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::MenuCycle(_)));
        assert_eq!(menus.get("2").unwrap().parent_id, "1");
    }

    #[tokio::test]
    async fn test_reparent_recomputes_depths() {
        let menus = MemMenus::seed(scenario());
        let (service, _) = service(menus.clone(), Arc::new(MemGrants::default()));

        // move D (4) from B to the root
        let mut cmd = update_cmd(&menus.get("4").unwrap());
        cmd.parent_id = ROOT_PARENT_ID.to_string();
        service.update(cmd, 1).await.unwrap();

        assert_eq!(menus.get("4").unwrap().depth, 1);
        assert!(!menus.get("2").unwrap().has_children);
    }

    #[tokio::test]
    async fn test_cascade_delete_subtree() {
        let menus = MemMenus::seed(scenario());
        let grants = MemGrants::seed(5, vec!["2".into(), "3".into(), "4".into()]);
        let (service, notifier) = service(menus.clone(), grants.clone());

        let flagged = service.remove(&["2".to_string()], 9).await.unwrap();
        assert_eq!(flagged, 2);

        assert!(menus.get("2").unwrap().deleted);
        assert!(menus.get("4").unwrap().deleted);
        assert_eq!(menus.get("4").unwrap().removed_by, Some(9));
        assert!(!menus.get("1").unwrap().deleted);
        // A keeps C, so the flag stays set
        assert!(menus.get("1").unwrap().has_children);

        // grants referencing the closure are gone
        let remaining = grants.menus_by_user.lock().unwrap().get(&5).cloned().unwrap();
        assert_eq!(remaining, vec!["3".to_string()]);

        // the full listing now shows A -> C only
        let forest = service.menu_tree(false).await.unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, "1");
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].id, "3");

        assert_eq!(notifier.events.lock().unwrap().len(), 1);
    }

    mockall::mock! {
        Grants {}

        #[async_trait]
        impl RoleGrantRepository for Grants {
            async fn menu_ids_for_user(&self, user_id: UserId) -> Result<Vec<MenuId>, DomainError>;
            async fn remove_grants_for_menus(&self, menu_ids: &[MenuId]) -> Result<u64, DomainError>;
        }
    }

    #[tokio::test]
    async fn test_grant_cleanup_failure_surfaces_after_delete() {
        let menus = MemMenus::seed(scenario());
        let mut grants = MockGrants::new();
        grants
            .expect_remove_grants_for_menus()
            .returning(|_| Err(DomainError::DatabaseError("grants store down".into())));
        let notifier = Arc::new(RecordingNotifier::default());
        let service = MenuService::new(menus.clone(), Arc::new(grants), notifier);

        let err = service.remove(&["2".to_string()], 1).await.unwrap_err();
        assert!(matches!(err, DomainError::DatabaseError(_)));
        // the soft delete already committed; grant cleanup is retryable
        assert!(menus.get("2").unwrap().deleted);
        assert!(menus.get("4").unwrap().deleted);
    }

    #[tokio::test]
    async fn test_remove_with_no_match_still_notifies() {
        let menus = MemMenus::seed(scenario());
        let (service, notifier) = service(menus.clone(), Arc::new(MemGrants::default()));

        let flagged = service.remove(&["missing".to_string()], 1).await.unwrap();
        assert_eq!(flagged, 0);
        assert_eq!(menus.nodes.lock().unwrap().values().filter(|n| n.deleted).count(), 0);
        assert_eq!(notifier.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_mutation() {
        let menus = MemMenus::seed(vec![]);
        let (service, notifier) = service(menus.clone(), Arc::new(MemGrants::default()));
        notifier.fail.store(true, Ordering::SeqCst);

        let created = service.create(create_cmd(ROOT_PARENT_ID, "Audit"), 1).await.unwrap();
        assert!(menus.get(&created.id).is_some());
        assert!(notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exclusion_tree_excluding_root_is_empty() {
        let menus = MemMenus::seed(scenario());
        let (service, _) = service(menus, Arc::new(MemGrants::default()));

        let forest = service.menu_tree_excluding(Some("1"), false).await.unwrap();
        assert!(forest.is_empty());
    }

    #[tokio::test]
    async fn test_exclusion_tree_excluding_branch() {
        let menus = MemMenus::seed(scenario());
        let (service, _) = service(menus, Arc::new(MemGrants::default()));

        let forest = service.menu_tree_excluding(Some("2"), false).await.unwrap();
        assert_eq!(forest.len(), 1);
        let ids: Vec<&str> = forest[0].children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["3"]);
    }

    #[tokio::test]
    async fn test_user_tree_filters_to_grants_and_drops_buttons() {
        let mut nodes = scenario();
        nodes.push(button("5", "2", "CreateUser", "user.create"));
        let menus = MemMenus::seed(nodes);
        let grants = MemGrants::seed(5, vec!["1".into(), "2".into(), "5".into()]);
        let (service, _) = service(menus, grants);

        let forest = service.menu_tree_for_user(5).await.unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, "1");
        let ids: Vec<&str> = forest[0].children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["2"]);
        assert!(forest[0].children[0].children.is_empty());

        let empty = service.menu_tree_for_user(99).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_picker_tree_wraps_synthetic_root() {
        let menus = MemMenus::seed(scenario());
        let (service, _) = service(menus, Arc::new(MemGrants::default()));

        let root = service.picker_tree().await.unwrap();
        assert_eq!(root.id, "0");
        assert_eq!(root.parent_id, "-1");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id, "1");
    }

    #[tokio::test]
    async fn test_permissions_for_user_deduplicated_and_sorted() {
        let mut nodes = scenario();
        nodes.push(button("5", "2", "CreateUser", "user.create"));
        nodes.push(button("6", "2", "CreateUserAlt", "user.create"));
        nodes.push(button("7", "3", "ListRoles", "role.list"));
        let menus = MemMenus::seed(nodes);
        let grants = MemGrants::seed(5, vec!["5".into(), "6".into(), "7".into()]);
        let (service, _) = service(menus, grants.clone());

        let perms = service.permissions_for_user(5).await.unwrap();
        assert_eq!(perms, vec!["role.list".to_string(), "user.create".to_string()]);

        grants.remove_grants_for_menus(&["5".into(), "6".into(), "7".into()]).await.unwrap();
        assert!(service.permissions_for_user(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_nodes_excluded_from_permission_catalog() {
        let mut nodes = scenario();
        nodes.push(button("5", "2", "CreateUser", "user.create"));
        let mut removed = button("6", "3", "DropRole", "role.drop");
        removed.soft_delete(1);
        nodes.push(removed);
        let menus = MemMenus::seed(nodes);
        let (service, _) = service(menus, Arc::new(MemGrants::default()));

        let perms = service.all_permissions().await.unwrap();
        assert_eq!(perms, vec!["user.create".to_string()]);
    }

    #[tokio::test]
    async fn test_permission_code_collisions_respects_exclusion() {
        let mut nodes = scenario();
        nodes.push(button("5", "2", "CreateUser", "user.create"));
        let menus = MemMenus::seed(nodes);
        let (service, _) = service(menus, Arc::new(MemGrants::default()));

        assert_eq!(service.permission_code_collisions("user.create", None).await.unwrap(), 1);
        assert_eq!(
            service.permission_code_collisions("user.create", Some("5")).await.unwrap(),
            0
        );
        assert_eq!(service.permission_code_collisions("unused", None).await.unwrap(), 0);
    }
}
