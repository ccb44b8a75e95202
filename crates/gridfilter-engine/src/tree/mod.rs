//! Structural operations on a filter tree.
//!
//! Every function here validates before it mutates: when an error is
//! returned the tree is exactly as it was. Edits copy only the groups on the
//! path to the edited node; sibling subtrees stay shared with any snapshot
//! taken before the edit.

mod flat;
mod patch;

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::custom_logic::{self, LogicError};
use crate::node::{FilterNode, GroupNode, NodeKind, NodeRef};
use crate::operator::{Arity, LogicalOperator};

pub use flat::{flatten, rebuild_from_flat, to_flat, FlatNode};
pub use patch::NodePatch;
pub(crate) use patch::check_column;

/// Structural errors raised by tree operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// No node (or no group, for a parent lookup) has this id.
    #[error("node not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The root group is permanent.
    #[error("the root group cannot be removed")]
    CannotRemoveRoot,

    /// A group would end up with a child count its operator does not accept.
    #[error("{operator} group '{group_id}' requires {expected} children, found {actual}")]
    InvalidArity {
        /// The offending group.
        group_id: String,
        /// Its operator.
        operator: LogicalOperator,
        /// Required child count.
        expected: usize,
        /// Child count after the rejected change.
        actual: usize,
    },

    /// Parent links do not describe a single tree.
    #[error("malformed hierarchy: {reason}")]
    MalformedHierarchy {
        /// What is wrong with the hierarchy.
        reason: String,
    },

    /// Two nodes share an id.
    #[error("duplicate node id: {id}")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },

    /// A patch field does not exist on the target node's kind.
    #[error("field '{field}' does not apply to {kind} node '{id}'")]
    PatchMismatch {
        /// The patched node.
        id: String,
        /// The field that does not apply.
        field: &'static str,
        /// The node's kind.
        kind: NodeKind,
    },

    /// A field value is out of range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// The field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A group's custom logic does not compile.
    #[error("custom logic of group '{group_id}': {source}")]
    Expression {
        /// The group carrying the logic.
        group_id: String,
        /// The expression error.
        #[source]
        source: LogicError,
    },
}

impl TreeError {
    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        TreeError::NotFound { id: id.into() }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TreeError::MalformedHierarchy {
            reason: reason.into(),
        }
    }

    /// Returns the expression error, if this is one.
    pub fn as_expression(&self) -> Option<&LogicError> {
        match self {
            TreeError::Expression { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Finds a node by id, including the root itself.
pub fn find<'a>(root: &'a GroupNode, id: &str) -> Option<NodeRef<'a>> {
    if root.id == id {
        return Some(NodeRef::Group(root));
    }
    for child in &root.children {
        if child.id() == id {
            return Some(child.as_node_ref());
        }
        if let FilterNode::Group(group) = &**child {
            if let Some(found) = find(group, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Returns the group that directly contains `id`.
pub fn parent_of<'a>(root: &'a GroupNode, id: &str) -> Option<&'a GroupNode> {
    let path = path_to(root, id)?;
    let (_, parent_path) = path.split_last()?;
    group_at(root, parent_path)
}

/// Child-index path from the root to `id`; empty for the root.
pub(crate) fn path_to(root: &GroupNode, id: &str) -> Option<Vec<usize>> {
    fn walk(group: &GroupNode, id: &str, path: &mut Vec<usize>) -> bool {
        for (index, child) in group.children.iter().enumerate() {
            path.push(index);
            if child.id() == id {
                return true;
            }
            if let FilterNode::Group(inner) = &**child {
                if walk(inner, id, path) {
                    return true;
                }
            }
            path.pop();
        }
        false
    }

    if root.id == id {
        return Some(Vec::new());
    }
    let mut path = Vec::new();
    walk(root, id, &mut path).then_some(path)
}

pub(crate) fn group_at<'a>(root: &'a GroupNode, path: &[usize]) -> Option<&'a GroupNode> {
    let mut group = root;
    for &index in path {
        group = group.children.get(index)?.as_group()?;
    }
    Some(group)
}

/// Walks a path, copying each shared group on the way.
pub(crate) fn group_at_mut<'a>(root: &'a mut GroupNode, path: &[usize]) -> Option<&'a mut GroupNode> {
    let mut group = root;
    for &index in path {
        let child = group.children.get_mut(index)?;
        group = Arc::make_mut(child).as_group_mut()?;
    }
    Some(group)
}

/// Collects every id in the tree.
pub(crate) fn collect_ids(root: &GroupNode) -> HashSet<String> {
    flatten(root)
        .into_iter()
        .map(|node| node.id().to_string())
        .collect()
}

/// Checks a group's child count against its operator.
pub(crate) fn check_arity(group: &GroupNode) -> TreeResult<()> {
    check_arity_with(group, group.operator, group.children.len())
}

fn check_arity_with(group: &GroupNode, operator: LogicalOperator, count: usize) -> TreeResult<()> {
    match operator.arity() {
        Arity::Exactly(expected) if expected != count => Err(TreeError::InvalidArity {
            group_id: group.id.clone(),
            operator,
            expected,
            actual: count,
        }),
        _ => Ok(()),
    }
}

fn expression_error(group: &GroupNode, source: LogicError) -> TreeError {
    TreeError::Expression {
        group_id: group.id.clone(),
        source,
    }
}

/// Validates a subtree and rebuilds its compiled caches.
///
/// Ids are checked against (and added to) `seen`.
pub(crate) fn prepare_node(node: &mut FilterNode, seen: &mut HashSet<String>) -> TreeResult<()> {
    if !seen.insert(node.id().to_string()) {
        return Err(TreeError::DuplicateId {
            id: node.id().to_string(),
        });
    }

    match node {
        FilterNode::Group(group) => prepare_group_body(group, seen),
        FilterNode::Condition(condition) => {
            check_column(&condition.column_id)?;
            patch::check_weight(condition.weight)
        }
        FilterNode::Formula(formula) => {
            // An uncompilable formula stays in the tree; generators report it.
            let _ = formula.recompile();
            Ok(())
        }
        FilterNode::Natural(natural) => patch::check_confidence(natural.confidence),
    }
}

/// Validates a whole tree rooted at `root` and rebuilds its compiled caches.
pub(crate) fn prepare_root(root: &mut GroupNode) -> TreeResult<()> {
    let mut seen = HashSet::new();
    seen.insert(root.id.clone());
    prepare_group_body(root, &mut seen)
}

fn prepare_group_body(group: &mut GroupNode, seen: &mut HashSet<String>) -> TreeResult<()> {
    for child in group.children.iter_mut() {
        prepare_node(Arc::make_mut(child), seen)?;
    }
    check_arity(group)?;

    if group.operator == LogicalOperator::Custom {
        if group.custom_logic().is_none() {
            return Err(expression_error(group, LogicError::EmptyExpression));
        }
        if let Err(e) = group.recompile_logic() {
            return Err(expression_error(group, e));
        }
    } else if group.custom_logic().is_some() {
        // Only CUSTOM groups carry logic; stale text from a former operator goes.
        let _ = group.set_custom_logic(None);
    }
    Ok(())
}

/// Checks a whole tree without modifying it.
///
/// # Errors
///
/// Returns the first duplicate id, arity violation or invalid custom logic.
pub fn validate_tree(root: &GroupNode) -> TreeResult<()> {
    let mut copy = root.clone();
    prepare_root(&mut copy)
}

/// Inserts `node` (and its subtree) under the group `parent_id`.
///
/// `index` is clamped to the parent's child count; `None` appends.
///
/// # Errors
///
/// - `TreeError::NotFound` if `parent_id` is not a group in the tree.
/// - `TreeError::DuplicateId` if any id in the subtree already exists.
/// - `TreeError::InvalidArity` if the parent (or a group inside the
///   subtree) would violate its operator's arity.
/// - `TreeError::Expression` if custom logic inside the subtree is invalid.
pub fn insert(
    root: &mut GroupNode,
    parent_id: &str,
    mut node: FilterNode,
    index: Option<usize>,
) -> TreeResult<()> {
    let path = path_to(root, parent_id).ok_or_else(|| TreeError::not_found(parent_id))?;
    let parent = group_at(root, &path).ok_or_else(|| TreeError::not_found(parent_id))?;

    check_arity_with(parent, parent.operator, parent.children.len() + 1)?;

    let mut seen = collect_ids(root);
    prepare_node(&mut node, &mut seen)?;

    let parent = group_at_mut(root, &path).ok_or_else(|| TreeError::not_found(parent_id))?;
    let index = index
        .unwrap_or(parent.children.len())
        .min(parent.children.len());
    parent.children.insert(index, Arc::new(node));
    Ok(())
}

/// Removes a node and its whole subtree, returning it.
///
/// # Errors
///
/// - `TreeError::CannotRemoveRoot` for the root id.
/// - `TreeError::NotFound` if no node has this id.
/// - `TreeError::InvalidArity` if the parent's operator needs the child.
/// - `TreeError::Expression` if the parent's custom logic references a
///   position that would no longer exist.
pub fn remove(root: &mut GroupNode, id: &str) -> TreeResult<FilterNode> {
    if root.id == id {
        return Err(TreeError::CannotRemoveRoot);
    }
    let path = path_to(root, id).ok_or_else(|| TreeError::not_found(id))?;
    let (&index, parent_path) = path.split_last().ok_or(TreeError::CannotRemoveRoot)?;

    let parent = group_at(root, parent_path).ok_or_else(|| TreeError::not_found(id))?;
    let remaining = parent.children.len() - 1;
    check_arity_with(parent, parent.operator, remaining)?;
    if let Some(logic) = parent.custom_logic() {
        if let Err(e) = custom_logic::compile(logic, remaining) {
            return Err(expression_error(parent, e));
        }
    }

    let parent = group_at_mut(root, parent_path).ok_or_else(|| TreeError::not_found(id))?;
    let removed = parent.children.remove(index);
    if parent.custom_logic().is_some() {
        parent
            .recompile_logic()
            .map_err(|e| expression_error(parent, e))?;
    }

    Ok(Arc::try_unwrap(removed).unwrap_or_else(|shared| (*shared).clone()))
}

/// Swaps a node (and its subtree) for another at the same position, returning
/// the old one. The parent's child count is unchanged, so its arity and
/// custom logic still hold.
///
/// # Errors
///
/// - `TreeError::CannotRemoveRoot` for the root id.
/// - `TreeError::NotFound` if no node has this id.
/// - `TreeError::DuplicateId` if the replacement reuses an id found elsewhere
///   in the tree.
/// - Any validation error inside the replacement subtree.
pub fn replace(root: &mut GroupNode, id: &str, mut node: FilterNode) -> TreeResult<FilterNode> {
    if root.id == id {
        return Err(TreeError::CannotRemoveRoot);
    }
    let path = path_to(root, id).ok_or_else(|| TreeError::not_found(id))?;
    let (&index, parent_path) = path.split_last().ok_or(TreeError::CannotRemoveRoot)?;
    let parent = group_at(root, parent_path).ok_or_else(|| TreeError::not_found(id))?;

    let mut seen = collect_ids(root);
    let mut outgoing = Vec::new();
    subtree_ids(parent.children[index].as_node_ref(), &mut outgoing);
    for old in &outgoing {
        seen.remove(*old);
    }
    prepare_node(&mut node, &mut seen)?;

    let parent = group_at_mut(root, parent_path).ok_or_else(|| TreeError::not_found(id))?;
    let old = std::mem::replace(&mut parent.children[index], Arc::new(node));
    Ok(Arc::try_unwrap(old).unwrap_or_else(|shared| (*shared).clone()))
}

fn subtree_ids<'a>(node: NodeRef<'a>, out: &mut Vec<&'a str>) {
    out.push(node.id());
    for child in node.children() {
        subtree_ids(child.as_node_ref(), out);
    }
}

/// Applies a partial update to one node and returns the updated node.
///
/// # Errors
///
/// - `TreeError::NotFound` if no node has this id.
/// - `TreeError::PatchMismatch` if the patch sets a field the node's kind
///   does not have.
/// - `TreeError::InvalidArity` if a new operator does not accept the group's
///   current children.
/// - `TreeError::InvalidField` / `TreeError::Expression` for invalid values.
pub fn update(root: &mut GroupNode, id: &str, patch: &NodePatch) -> TreeResult<FilterNode> {
    let path = path_to(root, id).ok_or_else(|| TreeError::not_found(id))?;

    if path.is_empty() {
        let mut node = FilterNode::Group(root.clone());
        patch.apply(&mut node)?;
        let FilterNode::Group(updated) = node else {
            return Err(TreeError::malformed("the root must stay a group"));
        };
        *root = updated.clone();
        return Ok(FilterNode::Group(updated));
    }

    let (&index, parent_path) = path.split_last().ok_or_else(|| TreeError::not_found(id))?;
    let parent = group_at(root, parent_path).ok_or_else(|| TreeError::not_found(id))?;
    let mut node = (*parent.children[index]).clone();
    patch.apply(&mut node)?;

    let parent = group_at_mut(root, parent_path).ok_or_else(|| TreeError::not_found(id))?;
    parent.children[index] = Arc::new(node.clone());
    Ok(node)
}

/// Moves a node to a new parent in one step.
///
/// `index` is the position in the new parent after the node has been taken
/// out of its old one.
///
/// # Errors
///
/// - `TreeError::CannotRemoveRoot` when moving the root.
/// - `TreeError::MalformedHierarchy` when moving a group into its own subtree.
/// - Any error [`remove`] or [`insert`] would report.
pub fn move_node(
    root: &mut GroupNode,
    id: &str,
    new_parent_id: &str,
    index: Option<usize>,
) -> TreeResult<()> {
    if root.id == id {
        return Err(TreeError::CannotRemoveRoot);
    }
    let node = find(root, id).ok_or_else(|| TreeError::not_found(id))?;
    if find_in_subtree(node, new_parent_id) {
        return Err(TreeError::malformed(format!(
            "cannot move '{id}' into its own subtree"
        )));
    }

    let path = path_to(root, id).ok_or_else(|| TreeError::not_found(id))?;
    let (&from, parent_path) = path.split_last().ok_or(TreeError::CannotRemoveRoot)?;
    let same_parent = group_at(root, parent_path).is_some_and(|group| group.id == new_parent_id);
    if same_parent {
        // A reorder keeps the child count, so arity cannot change.
        let parent = group_at_mut(root, parent_path).ok_or_else(|| TreeError::not_found(id))?;
        let child = parent.children.remove(from);
        let index = index
            .unwrap_or(parent.children.len())
            .min(parent.children.len());
        parent.children.insert(index, child);
        return Ok(());
    }

    let mut working = root.clone();
    let node = remove(&mut working, id)?;
    insert(&mut working, new_parent_id, node, index)?;
    *root = working;
    Ok(())
}

fn find_in_subtree(node: NodeRef<'_>, id: &str) -> bool {
    node.id() == id
        || node
            .children()
            .iter()
            .any(|child| find_in_subtree(child.as_node_ref(), id))
}

#[cfg(test)]
mod tests;
