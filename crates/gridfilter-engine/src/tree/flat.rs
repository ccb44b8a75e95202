use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{prepare_root, TreeError, TreeResult};
use crate::node::{FilterNode, GroupNode, NodeId, NodeKind, NodeRef};

/// One node of a flattened tree, linked to its parent by id.
///
/// Group nodes carry no children here; the hierarchy lives in `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatNode {
    /// `None` only for the root.
    pub parent_id: Option<NodeId>,
    pub node: FilterNode,
}

/// Lists every node in pre-order, root first.
pub fn flatten(root: &GroupNode) -> Vec<NodeRef<'_>> {
    fn visit<'a>(node: NodeRef<'a>, out: &mut Vec<NodeRef<'a>>) {
        out.push(node);
        for child in node.children() {
            visit(child.as_node_ref(), out);
        }
    }

    let mut out = Vec::new();
    visit(NodeRef::Group(root), &mut out);
    out
}

/// Converts the tree to a parent-linked list in pre-order.
pub fn to_flat(root: &GroupNode) -> Vec<FlatNode> {
    fn visit(node: &FilterNode, parent_id: Option<&str>, out: &mut Vec<FlatNode>) {
        let mut stripped = node.clone();
        if let Some(group) = stripped.as_group_mut() {
            group.children.clear();
        }
        out.push(FlatNode {
            parent_id: parent_id.map(str::to_string),
            node: stripped,
        });
        if let FilterNode::Group(group) = node {
            for child in &group.children {
                visit(child, Some(&group.id), out);
            }
        }
    }

    let mut out = Vec::with_capacity(flatten(root).len());
    let mut stripped = root.clone();
    stripped.children.clear();
    out.push(FlatNode {
        parent_id: None,
        node: FilterNode::Group(stripped),
    });
    for child in &root.children {
        visit(child, Some(&root.id), &mut out);
    }
    out
}

/// Rebuilds a tree from a parent-linked list.
///
/// Siblings keep their relative order from the list. The rebuilt tree is
/// validated like an imported one.
///
/// # Errors
///
/// - `TreeError::MalformedHierarchy` if there is not exactly one root, the
///   root is not a group, a parent is missing or is not a group, or some
///   nodes are not reachable from the root (a cycle).
/// - `TreeError::DuplicateId` if two entries share an id.
/// - Any validation error of the assembled tree.
pub fn rebuild_from_flat(nodes: Vec<FlatNode>) -> TreeResult<GroupNode> {
    let mut roots = nodes
        .iter()
        .enumerate()
        .filter(|(_, flat)| flat.parent_id.is_none());
    let root_index = match (roots.next(), roots.next()) {
        (None, _) => return Err(TreeError::malformed("no root node")),
        (Some(_), Some(_)) => return Err(TreeError::malformed("multiple root nodes")),
        (Some((index, _)), None) => index,
    };

    let mut kinds = HashMap::new();
    for flat in &nodes {
        if kinds.insert(flat.node.id(), flat.node.kind()).is_some() {
            return Err(TreeError::DuplicateId {
                id: flat.node.id().to_string(),
            });
        }
    }

    let mut children_of: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, flat) in nodes.iter().enumerate() {
        let Some(parent_id) = &flat.parent_id else {
            continue;
        };
        match kinds.get(parent_id.as_str()) {
            None => {
                return Err(TreeError::malformed(format!(
                    "parent '{parent_id}' of node '{}' does not exist",
                    flat.node.id()
                )))
            }
            Some(kind) if *kind != NodeKind::Group => {
                return Err(TreeError::malformed(format!(
                    "parent '{parent_id}' of node '{}' is not a group",
                    flat.node.id()
                )))
            }
            Some(_) => children_of.entry(parent_id.clone()).or_default().push(index),
        }
    }

    let mut slots: Vec<Option<FilterNode>> = nodes.into_iter().map(|flat| Some(flat.node)).collect();
    let mut visited = HashSet::new();
    let root = assemble(root_index, &mut slots, &children_of, &mut visited)?;

    if visited.len() != slots.len() {
        return Err(TreeError::malformed(format!(
            "{} node(s) are not reachable from the root",
            slots.len() - visited.len()
        )));
    }

    let FilterNode::Group(mut root) = root else {
        return Err(TreeError::malformed("the root node is not a group"));
    };
    prepare_root(&mut root)?;
    Ok(root)
}

fn assemble(
    index: usize,
    slots: &mut [Option<FilterNode>],
    children_of: &HashMap<String, Vec<usize>>,
    visited: &mut HashSet<usize>,
) -> TreeResult<FilterNode> {
    let mut node = slots
        .get_mut(index)
        .and_then(Option::take)
        .ok_or_else(|| TreeError::malformed("node visited twice"))?;
    visited.insert(index);

    if let Some(group) = node.as_group_mut() {
        group.children.clear();
        if let Some(children) = children_of.get(&group.id) {
            for &child in children {
                let child = assemble(child, slots, children_of, visited)?;
                group.children.push(Arc::new(child));
            }
        }
    }
    Ok(node)
}
