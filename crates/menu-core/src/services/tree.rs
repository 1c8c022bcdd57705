// ============================================================================
// Menu Core - Tree Builder
// File: crates/menu-core/src/services/tree.rs
// Description: Recursive assembly of nested views from a flat record list
// ============================================================================
//! The builder works on an already-filtered flat list and is shared by every
//! view variant (full, user-scoped, exclusion-scoped, picker). An adjacency
//! map is built once per call instead of rescanning the list per node.
//!
//! A record whose parent is neither present in the input nor a root sentinel
//! is omitted from the output; historical data can hold such orphans and
//! they are not worth failing a read for.

use std::collections::HashMap;

use crate::domain::{is_root_parent, MenuNode, MenuTreeNode};

/// Assembles the forest for the given records. Children are ordered by
/// (`sort_order`, `id`) ascending, so output is deterministic for a given
/// input set.
pub fn build_forest(nodes: &[MenuNode]) -> Vec<MenuTreeNode> {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| {
        nodes[a]
            .sort_order
            .cmp(&nodes[b].sort_order)
            .then_with(|| nodes[a].id.cmp(&nodes[b].id))
    });

    let mut roots: Vec<usize> = Vec::new();
    let mut children_of: HashMap<&str, Vec<usize>> = HashMap::new();
    for &i in &order {
        let node = &nodes[i];
        if is_root_parent(&node.parent_id) {
            roots.push(i);
        } else {
            children_of.entry(node.parent_id.as_str()).or_default().push(i);
        }
    }

    roots.into_iter().map(|i| assemble(nodes, i, &children_of)).collect()
}

fn assemble(
    nodes: &[MenuNode],
    index: usize,
    children_of: &HashMap<&str, Vec<usize>>,
) -> MenuTreeNode {
    let node = &nodes[index];
    let children = children_of
        .get(node.id.as_str())
        .map(|ids| ids.iter().map(|&i| assemble(nodes, i, children_of)).collect())
        .unwrap_or_default();
    MenuTreeNode::from_node(node, children)
}
