// ============================================================================
// Menu Core - Hierarchy Maintainer
// File: crates/menu-core/src/services/hierarchy.rs
// Description: Global recomputation of depth and has_children over the
//              non-deleted node set
// ============================================================================
//! Derived hierarchy metadata is recomputed for the whole catalog in one
//! pass after any structural change, never incrementally: a single cascade
//! can stale the flags of several ancestors at once.

use std::collections::{HashMap, HashSet, VecDeque};

use menu_shared::MenuId;
use tracing::warn;

use crate::domain::{is_root_parent, MenuNode};
use crate::repositories::DerivedUpdate;

/// Breadth-first depth assignment from the root-sentinel nodes. A node whose
/// parent chain never reaches a root (dangling reference, or a cycle in
/// stored data) falls back to depth 1 and is logged; the pass itself never
/// fails.
pub fn compute_depths(nodes: &[MenuNode]) -> HashMap<MenuId, i32> {
    let mut children_of: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut queue: VecDeque<(&str, i32)> = VecDeque::new();

    for node in nodes {
        if is_root_parent(&node.parent_id) {
            queue.push_back((node.id.as_str(), 1));
        } else {
            children_of.entry(node.parent_id.as_str()).or_default().push(node.id.as_str());
        }
    }

    let mut depths: HashMap<MenuId, i32> = HashMap::with_capacity(nodes.len());
    while let Some((id, depth)) = queue.pop_front() {
        depths.insert(id.to_string(), depth);
        if let Some(children) = children_of.get(id) {
            for child in children {
                queue.push_back((child, depth + 1));
            }
        }
    }

    for node in nodes {
        if !depths.contains_key(&node.id) {
            warn!(
                "menu {} has unresolvable parent {}, assigning depth 1",
                node.id, node.parent_id
            );
            depths.insert(node.id.clone(), 1);
        }
    }

    depths
}

/// Ids that have at least one child within the given (non-deleted) set.
pub fn compute_children_flags(nodes: &[MenuNode]) -> HashSet<MenuId> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    nodes
        .iter()
        .filter(|n| !is_root_parent(&n.parent_id) && ids.contains(n.parent_id.as_str()))
        .map(|n| n.parent_id.clone())
        .collect()
}

/// Full recomputation plan over the non-deleted node set. Only rows whose
/// stored values differ are returned, so replaying the plan and re-planning
/// immediately afterwards yields nothing.
pub fn plan_derived_sync(nodes: &[MenuNode]) -> Vec<DerivedUpdate> {
    let depths = compute_depths(nodes);
    let parents = compute_children_flags(nodes);

    nodes
        .iter()
        .filter_map(|node| {
            let depth = depths.get(&node.id).copied().unwrap_or(1);
            let has_children = parents.contains(&node.id);
            if node.depth != depth || node.has_children != has_children {
                Some(DerivedUpdate { id: node.id.clone(), depth, has_children })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MenuNodeType;
    use menu_shared::constants::ROOT_PARENT_ID;

    fn node(id: &str, parent: &str, depth: i32, has_children: bool) -> MenuNode {
        let mut n = MenuNode::new(
            parent.to_string(),
            format!("node-{}", id),
            format!("Node {}", id),
            format!("/{}", id),
            MenuNodeType::Page,
            0,
            depth,
            None,
        )
        .unwrap();
        n.id = id.to_string();
        n.has_children = has_children;
        n
    }

    #[test]
    fn test_depths_follow_parent_chain() {
        let nodes = vec![
            node("1", ROOT_PARENT_ID, 0, false),
            node("2", "1", 0, false),
            node("3", "1", 0, false),
            node("4", "2", 0, false),
        ];
        let depths = compute_depths(&nodes);
        assert_eq!(depths["1"], 1);
        assert_eq!(depths["2"], 2);
        assert_eq!(depths["3"], 2);
        assert_eq!(depths["4"], 3);
    }

    #[test]
    fn test_dangling_parent_falls_back_to_depth_one() {
        let nodes = vec![node("1", ROOT_PARENT_ID, 1, false), node("2", "missing", 5, false)];
        let depths = compute_depths(&nodes);
        assert_eq!(depths["2"], 1);
    }

    #[test]
    fn test_cycle_in_stored_data_terminates() {
        // Two nodes pointing at each other never reach a root.
        let nodes = vec![node("a", "b", 1, false), node("b", "a", 1, false)];
        let depths = compute_depths(&nodes);
        assert_eq!(depths.len(), 2);
        assert_eq!(depths["a"], 1);
        assert_eq!(depths["b"], 1);
    }

    #[test]
    fn test_children_flags_match_child_count() {
        let nodes = vec![
            node("1", ROOT_PARENT_ID, 1, false),
            node("2", "1", 2, false),
            node("3", "1", 2, false),
            node("4", "2", 3, false),
        ];
        let parents = compute_children_flags(&nodes);
        assert!(parents.contains("1"));
        assert!(parents.contains("2"));
        assert!(!parents.contains("3"));
        assert!(!parents.contains("4"));
    }

    #[test]
    fn test_plan_reports_only_stale_rows() {
        let nodes = vec![
            node("1", ROOT_PARENT_ID, 1, true),
            node("2", "1", 2, false),
            // stored depth is stale after a reparent
            node("4", "2", 99, false),
        ];
        let plan = plan_derived_sync(&nodes);
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().any(|u| u.id == "2" && u.has_children));
        assert!(plan.iter().any(|u| u.id == "4" && u.depth == 3));
    }

    #[test]
    fn test_plan_is_idempotent() {
        let mut nodes = vec![
            node("1", ROOT_PARENT_ID, 0, false),
            node("2", "1", 0, true),
            node("3", "1", 0, false),
            node("4", "2", 0, false),
        ];
        let plan = plan_derived_sync(&nodes);
        assert!(!plan.is_empty());
        for update in &plan {
            let n = nodes.iter_mut().find(|n| n.id == update.id).unwrap();
            n.depth = update.depth;
            n.has_children = update.has_children;
        }
        assert!(plan_derived_sync(&nodes).is_empty());
    }
}
