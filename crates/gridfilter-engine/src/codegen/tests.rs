//! Tests for the shared generator walk.

use serde_json::json;

use super::*;
use crate::node::{ConditionNode, FilterValue, FormulaNode};
use crate::ports::{ParsedCondition, ParsedNaturalQuery};

fn cond(id: &str, column: &str) -> ConditionNode {
    ConditionNode::new(
        id,
        column,
        ConditionFilter::new("equals", FilterValue::Number(1.0)),
    )
}

fn sql(root: &GroupNode) -> Generated<String> {
    SqlGenerator::generate(root)
}

// ==================== Disabled Conditions ====================

#[test]
fn test_disabled_condition_is_dropped() {
    let root = GroupNode::new("root", LogicalOperator::And)
        .with_child(cond("a", "a"))
        .with_child(cond("b", "b").enabled(false))
        .with_child(cond("c", "c"));
    assert_eq!(sql(&root).output, "a = ? AND c = ?");
}

#[test]
fn test_all_disabled_gives_empty_clause() {
    let root = GroupNode::new("root", LogicalOperator::Or)
        .with_child(cond("a", "a").enabled(false))
        .with_child(
            GroupNode::new("g", LogicalOperator::And).with_child(cond("b", "b").enabled(false)),
        );

    assert_eq!(sql(&root).output, "");
    assert_eq!(DocumentGenerator::generate(&root).output, json!({ "$or": [] }));
    assert_eq!(NaturalLanguageGenerator::generate(&root).output, "");
}

#[test]
fn test_empty_nested_group_is_dropped() {
    let root = GroupNode::new("root", LogicalOperator::And)
        .with_child(cond("a", "a"))
        .with_child(GroupNode::new("g", LogicalOperator::Or));
    assert_eq!(sql(&root).output, "a = ?");
}

#[test]
fn test_fixed_arity_group_losing_operand_falls_back() {
    let root = GroupNode::new("root", LogicalOperator::Xor)
        .with_child(cond("a", "a"))
        .with_child(cond("b", "b").enabled(false));
    let generated = sql(&root);
    assert_eq!(generated.output, "a = ?");
    assert_eq!(
        generated.warnings,
        vec![GenerationWarning::ArityFallback {
            group_id: "root".into(),
            operator: LogicalOperator::Xor,
        }]
    );
}

// ==================== Custom Logic ====================

fn custom(logic: &str) -> GroupNode {
    GroupNode::new("root", LogicalOperator::Custom)
        .with_child(cond("a", "a"))
        .with_child(cond("b", "b"))
        .with_child(cond("c", "c"))
        .with_custom_logic(logic)
        .unwrap()
}

#[test]
fn test_custom_logic_folds_into_sql() {
    assert_eq!(sql(&custom("A AND (B OR C)")).output, "a = ? AND (b = ? OR c = ?)");
    assert_eq!(sql(&custom("NOT A OR C")).output, "NOT a = ? OR c = ?");
}

#[test]
fn test_custom_logic_repeated_letter() {
    assert_eq!(sql(&custom("B OR B")).output, "b = ? OR b = ?");
}

#[test]
fn test_custom_logic_prunes_disabled_operand() {
    let root = GroupNode::new("root", LogicalOperator::Custom)
        .with_child(cond("a", "a"))
        .with_child(cond("b", "b").enabled(false))
        .with_custom_logic("A AND NOT B")
        .unwrap();
    assert_eq!(sql(&root).output, "a = ?");
}

#[test]
fn test_negated_custom_group() {
    let root = custom("A OR B").negated(true);
    assert_eq!(sql(&root).output, "NOT (a = ? OR b = ?)");
    assert_eq!(
        DocumentGenerator::generate(&root).output,
        json!({ "$nor": [ { "$or": [ { "a": { "$eq": "?" } }, { "b": { "$eq": "?" } } ] } ] })
    );
}

// ==================== Formulas ====================

#[test]
fn test_formula_expands_into_comparisons() {
    let root = GroupNode::new("root", LogicalOperator::And)
        .with_child(cond("a", "a"))
        .with_child(FormulaNode::new("f", "age >= 21 OR NOT name ~ 'bot'"));
    assert_eq!(
        sql(&root).output,
        "a = ? AND (age >= ? OR NOT name LIKE ?)"
    );
}

#[test]
fn test_uncompiled_formula_is_skipped_with_warning() {
    let root = GroupNode::new("root", LogicalOperator::And)
        .with_child(cond("a", "a"))
        .with_child(FormulaNode::new("f", "age >"));
    let generated = sql(&root);
    assert_eq!(generated.output, "a = ?");
    assert_eq!(
        generated.warnings,
        vec![GenerationWarning::UncompiledFormula { node_id: "f".into() }]
    );
}

// ==================== Natural-Language Nodes ====================

#[test]
fn test_interpreted_natural_node_expands() {
    let mut natural = NaturalNode::new("n", "people in Oslo or Bergen");
    natural.parsed = Some(ParsedNaturalQuery {
        operator: LogicalOperator::Or,
        conditions: vec![
            ParsedCondition {
                column_id: "city".into(),
                filter: ConditionFilter::new("equals", FilterValue::Text("Oslo".into())),
            },
            ParsedCondition {
                column_id: "city".into(),
                filter: ConditionFilter::new("equals", FilterValue::Text("Bergen".into())),
            },
        ],
        interpretation: "city is Oslo or Bergen".into(),
        confidence: 0.8,
    });
    let root = GroupNode::new("root", LogicalOperator::And)
        .with_child(cond("a", "age"))
        .with_child(natural);

    let generated = sql(&root);
    assert_eq!(generated.output, "age = ? AND (city = ? OR city = ?)");
    assert!(generated.is_faithful());
}

#[test]
fn test_uninterpreted_natural_node_is_left_out_of_sql() {
    let root = GroupNode::new("root", LogicalOperator::And)
        .with_child(cond("a", "age"))
        .with_child(NaturalNode::new("n", "recent orders"));
    let generated = sql(&root);
    assert_eq!(generated.output, "age = ?");
    assert_eq!(
        generated.warnings,
        vec![GenerationWarning::UninterpretedNatural { node_id: "n".into() }]
    );
}

// ==================== Totality ====================

#[test]
fn test_three_level_tree_generates_everywhere() {
    let root = GroupNode::new("root", LogicalOperator::And)
        .with_child(cond("a", "a"))
        .with_child(
            GroupNode::new("g1", LogicalOperator::Or)
                .with_child(cond("b", "b"))
                .with_child(
                    GroupNode::new("g2", LogicalOperator::Xor)
                        .with_child(cond("c", "c"))
                        .with_child(cond("d", "d")),
                ),
        );

    assert_eq!(
        sql(&root).output,
        "a = ? AND (b = ? OR ((c = ? OR d = ?) AND NOT (c = ? AND d = ?)))"
    );
    assert_eq!(
        DocumentGenerator::generate(&root).output,
        json!({ "$and": [
            { "a": { "$eq": "?" } },
            { "$or": [
                { "b": { "$eq": "?" } },
                { "$xor": [ { "c": { "$eq": "?" } }, { "d": { "$eq": "?" } } ] }
            ] }
        ] })
    );
    assert_eq!(
        NaturalLanguageGenerator::generate(&root).output,
        "a is 1 and (b is 1 or (c is 1 xor d is 1))"
    );
}

#[test]
fn test_warning_serialization() {
    let warning = GenerationWarning::UnmappedOperator {
        node_id: "a".into(),
        operator: "fuzzy".into(),
        fallback: "=",
        suggestion: None,
    };
    assert_eq!(
        serde_json::to_value(&warning).unwrap(),
        json!({ "kind": "unmappedOperator", "nodeId": "a", "operator": "fuzzy", "fallback": "=", "suggestion": null })
    );
    assert_eq!(warning.to_string(), "a: unknown operator 'fuzzy', using '='");
}
