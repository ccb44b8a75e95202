//! Tests for structural tree operations.

use std::sync::Arc;

use super::*;
use crate::node::{ConditionFilter, ConditionNode, FilterValue, FormulaNode, NaturalNode};

fn cond(id: &str) -> ConditionNode {
    ConditionNode::new(
        id,
        "col",
        ConditionFilter::new("equals", FilterValue::Number(1.0)),
    )
}

/// root(AND)
///   a
///   g(OR)
///     b
///     c
fn sample() -> GroupNode {
    GroupNode::new("root", LogicalOperator::And)
        .with_child(cond("a"))
        .with_child(
            GroupNode::new("g", LogicalOperator::Or)
                .with_child(cond("b"))
                .with_child(cond("c")),
        )
}

fn ids(root: &GroupNode) -> Vec<String> {
    flatten(root).iter().map(|n| n.id().to_string()).collect()
}

// ==================== Lookup ====================

#[test]
fn test_find_root_and_nested() {
    let root = sample();
    assert_eq!(find(&root, "root").unwrap().kind(), NodeKind::Group);
    assert_eq!(find(&root, "c").unwrap().id(), "c");
    assert!(find(&root, "missing").is_none());
}

#[test]
fn test_parent_of() {
    let root = sample();
    assert_eq!(parent_of(&root, "b").unwrap().id, "g");
    assert_eq!(parent_of(&root, "a").unwrap().id, "root");
    assert!(parent_of(&root, "root").is_none());
}

#[test]
fn test_flatten_is_pre_order() {
    assert_eq!(ids(&sample()), ["root", "a", "g", "b", "c"]);
}

// ==================== Insert ====================

#[test]
fn test_insert_appends_and_positions() {
    let mut root = sample();
    insert(&mut root, "g", cond("d").into(), None).unwrap();
    insert(&mut root, "g", cond("e").into(), Some(0)).unwrap();
    insert(&mut root, "root", cond("f").into(), Some(99)).unwrap();
    assert_eq!(ids(&root), ["root", "a", "g", "e", "b", "c", "d", "f"]);
}

#[test]
fn test_insert_into_missing_parent() {
    let mut root = sample();
    let err = insert(&mut root, "nope", cond("d").into(), None).unwrap_err();
    assert_eq!(err, TreeError::NotFound { id: "nope".into() });
}

#[test]
fn test_insert_under_leaf_is_not_found() {
    let mut root = sample();
    let err = insert(&mut root, "a", cond("d").into(), None).unwrap_err();
    assert!(matches!(err, TreeError::NotFound { .. }));
}

#[test]
fn test_insert_duplicate_id() {
    let mut root = sample();
    let before = root.clone();
    let err = insert(&mut root, "root", cond("b").into(), None).unwrap_err();
    assert_eq!(err, TreeError::DuplicateId { id: "b".into() });
    assert_eq!(root, before);
}

#[test]
fn test_insert_respects_fixed_arity() {
    let mut root = GroupNode::new("root", LogicalOperator::And).with_child(
        GroupNode::new("x", LogicalOperator::Xor)
            .with_child(cond("a"))
            .with_child(cond("b")),
    );
    let err = insert(&mut root, "x", cond("c").into(), None).unwrap_err();
    assert_eq!(
        err,
        TreeError::InvalidArity {
            group_id: "x".into(),
            operator: LogicalOperator::Xor,
            expected: 2,
            actual: 3,
        }
    );
}

#[test]
fn test_insert_validates_subtree() {
    let mut root = sample();
    let snapshot = root.clone();
    let bad = GroupNode::new("n", LogicalOperator::IfThenElse)
        .with_child(cond("x"))
        .with_child(cond("y"));
    let err = insert(&mut root, "root", bad.into(), None).unwrap_err();
    assert_eq!(
        err,
        TreeError::InvalidArity {
            group_id: "n".into(),
            operator: LogicalOperator::IfThenElse,
            expected: 3,
            actual: 2,
        }
    );
    assert_eq!(root, snapshot);
}

#[test]
fn test_insert_rejects_blank_column() {
    let mut root = sample();
    let blank = ConditionNode::new(
        "d",
        "  ",
        ConditionFilter::new("equals", FilterValue::Number(1.0)),
    );
    let err = insert(&mut root, "g", blank.into(), None).unwrap_err();
    assert!(matches!(err, TreeError::InvalidField { field: "columnId", .. }));
    assert!(find(&root, "d").is_none());
}

#[test]
fn test_not_group_takes_any_number_of_children() {
    let mut root = sample();
    let not = GroupNode::new("n", LogicalOperator::Not)
        .with_child(cond("x"))
        .with_child(cond("y"));
    insert(&mut root, "root", not.into(), None).unwrap();
    insert(&mut root, "n", cond("z").into(), None).unwrap();

    for id in ["x", "y", "z"] {
        remove(&mut root, id).unwrap();
    }
    let Some(NodeRef::Group(not)) = find(&root, "n") else {
        panic!("expected group n");
    };
    assert!(not.children.is_empty());
}

#[test]
fn test_insert_shares_untouched_subtrees() {
    let mut root = sample();
    let snapshot = root.clone();
    insert(&mut root, "root", cond("d").into(), None).unwrap();
    assert!(Arc::ptr_eq(&root.children[1], &snapshot.children[1]));
}

#[test]
fn test_insert_compiles_formula_cache() {
    let mut root = sample();
    insert(&mut root, "root", FormulaNode::new("f", "age > 18").into(), None).unwrap();
    match &*root.children[2] {
        FilterNode::Formula(f) => assert!(f.compiled().is_some()),
        other => panic!("unexpected node {other:?}"),
    }
}

// ==================== Remove ====================

#[test]
fn test_remove_subtree() {
    let mut root = sample();
    let removed = remove(&mut root, "g").unwrap();
    assert_eq!(removed.id(), "g");
    assert_eq!(ids(&root), ["root", "a"]);
}

#[test]
fn test_remove_root_fails() {
    let mut root = sample();
    assert_eq!(remove(&mut root, "root").unwrap_err(), TreeError::CannotRemoveRoot);
}

#[test]
fn test_remove_missing_node() {
    let mut root = sample();
    assert!(matches!(
        remove(&mut root, "zzz").unwrap_err(),
        TreeError::NotFound { .. }
    ));
}

#[test]
fn test_remove_from_fixed_arity_group() {
    let mut root = GroupNode::new("root", LogicalOperator::And).with_child(
        GroupNode::new("n", LogicalOperator::Xor)
            .with_child(cond("a"))
            .with_child(cond("b")),
    );
    let err = remove(&mut root, "a").unwrap_err();
    assert!(matches!(err, TreeError::InvalidArity { expected: 2, actual: 1, .. }));
    assert!(find(&root, "a").is_some());
}

#[test]
fn test_remove_revalidates_custom_logic() {
    let custom = GroupNode::new("c", LogicalOperator::Custom)
        .with_child(cond("a"))
        .with_child(cond("b"))
        .with_custom_logic("A AND B")
        .unwrap();
    let mut root = GroupNode::new("root", LogicalOperator::And).with_child(custom);

    let err = remove(&mut root, "b").unwrap_err();
    assert!(matches!(
        err.as_expression(),
        Some(LogicError::UndefinedReference { reference: 'B', .. })
    ));
    assert_eq!(parent_of(&root, "b").unwrap().children.len(), 2);
}

// ==================== Update ====================

#[test]
fn test_update_condition() {
    let mut root = sample();
    let patch = NodePatch::new()
        .enabled(false)
        .filter(ConditionFilter::new("lessThan", FilterValue::Number(5.0)));
    let updated = update(&mut root, "b", &patch).unwrap();

    let FilterNode::Condition(c) = updated else {
        panic!("expected condition");
    };
    assert!(!c.enabled);
    assert_eq!(c.filter.operator, "lessThan");
}

#[test]
fn test_update_root_operator() {
    let mut root = sample();
    update(&mut root, "root", &NodePatch::new().operator(LogicalOperator::Or)).unwrap();
    assert_eq!(root.operator, LogicalOperator::Or);
}

#[test]
fn test_update_to_xor_with_three_children_fails() {
    let mut root = sample();
    insert(&mut root, "g", cond("d").into(), None).unwrap();
    let before = root.clone();

    let err = update(&mut root, "g", &NodePatch::new().operator(LogicalOperator::Xor)).unwrap_err();
    assert_eq!(
        err,
        TreeError::InvalidArity {
            group_id: "g".into(),
            operator: LogicalOperator::Xor,
            expected: 2,
            actual: 3,
        }
    );
    assert_eq!(root, before);
}

#[test]
fn test_update_field_mismatch() {
    let mut root = sample();
    let err = update(&mut root, "a", &NodePatch::new().negated(true)).unwrap_err();
    assert_eq!(
        err,
        TreeError::PatchMismatch {
            id: "a".into(),
            field: "negated",
            kind: NodeKind::Condition,
        }
    );
}

#[test]
fn test_update_invalid_weight() {
    let mut root = sample();
    for weight in [0.0, -1.0, f64::NAN] {
        let err = update(&mut root, "a", &NodePatch::new().weight(weight)).unwrap_err();
        assert!(matches!(err, TreeError::InvalidField { field: "weight", .. }));
    }
}

#[test]
fn test_update_custom_logic() {
    let mut root = sample();
    let patch = NodePatch::new()
        .operator(LogicalOperator::Custom)
        .custom_logic("NOT A OR B");
    update(&mut root, "g", &patch).unwrap();

    let group = find(&root, "g").unwrap();
    let NodeRef::Group(group) = group else {
        panic!("expected group");
    };
    assert_eq!(group.custom_logic(), Some("NOT A OR B"));
    assert!(group.compiled_logic().is_some());
}

#[test]
fn test_update_custom_without_logic_fails() {
    let mut root = sample();
    let err = update(&mut root, "g", &NodePatch::new().operator(LogicalOperator::Custom)).unwrap_err();
    assert_eq!(err.as_expression(), Some(&LogicError::EmptyExpression));
}

#[test]
fn test_update_invalid_custom_logic_is_rejected() {
    let mut root = sample();
    let patch = NodePatch::new()
        .operator(LogicalOperator::Custom)
        .custom_logic("A AND (B");
    let before = root.clone();
    let err = update(&mut root, "g", &patch).unwrap_err();
    assert_eq!(err.as_expression(), Some(&LogicError::UnmatchedOpeningParen));
    assert_eq!(root, before);
}

#[test]
fn test_leaving_custom_clears_logic() {
    let mut root = sample();
    update(
        &mut root,
        "g",
        &NodePatch::new().operator(LogicalOperator::Custom).custom_logic("A"),
    )
    .unwrap();
    update(&mut root, "g", &NodePatch::new().operator(LogicalOperator::And)).unwrap();
    assert_eq!(parent_of(&root, "b").unwrap().custom_logic(), None);
}

#[test]
fn test_update_natural_query_clears_interpretation() {
    let mut root = GroupNode::new("root", LogicalOperator::And);
    let mut natural = NaturalNode::new("n", "old query");
    natural.parsed = Some(crate::ports::ParsedNaturalQuery::unrecognized("old query"));
    natural.confidence = 0.5;
    insert(&mut root, "root", natural.into(), None).unwrap();

    let updated = update(&mut root, "n", &NodePatch::new().query("new query")).unwrap();
    let FilterNode::Natural(n) = updated else {
        panic!("expected natural node");
    };
    assert_eq!(n.query, "new query");
    assert!(n.parsed.is_none());
    assert_eq!(n.confidence, 0.0);
}

#[test]
fn test_patch_serialization_skips_unset_fields() {
    let patch = NodePatch::new().enabled(false);
    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(json, serde_json::json!({ "enabled": false }));
    assert!(NodePatch::new().is_empty());
}

// ==================== Move ====================

#[test]
fn test_move_between_groups() {
    let mut root = sample();
    move_node(&mut root, "a", "g", Some(1)).unwrap();
    assert_eq!(ids(&root), ["root", "g", "b", "a", "c"]);
}

#[test]
fn test_move_reorders_within_fixed_arity_group() {
    let mut root = GroupNode::new("root", LogicalOperator::And).with_child(
        GroupNode::new("x", LogicalOperator::Xor)
            .with_child(cond("a"))
            .with_child(cond("b")),
    );
    move_node(&mut root, "b", "x", Some(0)).unwrap();
    assert_eq!(ids(&root), ["root", "x", "b", "a"]);
}

#[test]
fn test_move_into_own_subtree_fails() {
    let mut root = sample();
    let before = root.clone();
    let err = move_node(&mut root, "g", "g", None).unwrap_err();
    assert!(matches!(err, TreeError::MalformedHierarchy { .. }));
    assert_eq!(root, before);
}

#[test]
fn test_move_root_fails() {
    let mut root = sample();
    assert_eq!(
        move_node(&mut root, "root", "g", None).unwrap_err(),
        TreeError::CannotRemoveRoot
    );
}

// ==================== Flat Round Trip ====================

#[test]
fn test_flat_round_trip() {
    let root = sample();
    let flat = to_flat(&root);
    assert_eq!(flat.len(), 5);
    assert!(flat[0].parent_id.is_none());
    assert!(flat[2].node.as_group().unwrap().children.is_empty());

    let rebuilt = rebuild_from_flat(flat).unwrap();
    assert_eq!(rebuilt, root);
}

#[test]
fn test_rebuild_keeps_sibling_order_from_list() {
    let mut flat = to_flat(&sample());
    flat.swap(3, 4);
    let rebuilt = rebuild_from_flat(flat).unwrap();
    assert_eq!(ids(&rebuilt), ["root", "a", "g", "c", "b"]);
}

#[test]
fn test_rebuild_rejects_missing_root() {
    let mut flat = to_flat(&sample());
    flat.remove(0);
    assert!(matches!(
        rebuild_from_flat(flat).unwrap_err(),
        TreeError::MalformedHierarchy { .. }
    ));
}

#[test]
fn test_rebuild_rejects_two_roots() {
    let mut flat = to_flat(&sample());
    flat[1].parent_id = None;
    let err = rebuild_from_flat(flat).unwrap_err();
    assert_eq!(err, TreeError::malformed("multiple root nodes"));
}

#[test]
fn test_rebuild_rejects_cycle() {
    let mut flat = to_flat(&sample());
    // g becomes its own parent, cutting g, b and c off from the root.
    flat[2].parent_id = Some("g".into());
    assert!(matches!(
        rebuild_from_flat(flat).unwrap_err(),
        TreeError::MalformedHierarchy { .. }
    ));
}

#[test]
fn test_rebuild_rejects_leaf_parent() {
    let mut flat = to_flat(&sample());
    flat[3].parent_id = Some("a".into());
    assert!(matches!(
        rebuild_from_flat(flat).unwrap_err(),
        TreeError::MalformedHierarchy { .. }
    ));
}

#[test]
fn test_rebuild_rejects_duplicates() {
    let mut flat = to_flat(&sample());
    let copy = flat[1].clone();
    flat.push(copy);
    assert_eq!(
        rebuild_from_flat(flat).unwrap_err(),
        TreeError::DuplicateId { id: "a".into() }
    );
}

// ==================== Validation ====================

#[test]
fn test_validate_tree() {
    assert!(validate_tree(&sample()).is_ok());

    let bad = GroupNode::new("root", LogicalOperator::And)
        .with_child(cond("a"))
        .with_child(cond("a"));
    assert_eq!(
        validate_tree(&bad).unwrap_err(),
        TreeError::DuplicateId { id: "a".into() }
    );
}
