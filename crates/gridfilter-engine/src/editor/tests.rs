//! Tests for the editor's commit and history behaviour.

use chrono::{TimeZone, Utc};

use super::*;
use crate::custom_logic::LogicError;
use crate::node::FilterValue;
use crate::ports::{FixedClock, ParsedCondition, SequentialIds};

type TestEditor = FilterEditor<FixedClock, SequentialIds>;

fn editor() -> TestEditor {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    FilterEditor::with_collaborators("customers", EngineConfig::default(), clock, SequentialIds::new("n"))
}

fn gt(n: f64) -> ConditionFilter {
    ConditionFilter::new("greaterThan", FilterValue::Number(n))
}

fn eq(text: &str) -> ConditionFilter {
    ConditionFilter::new("equals", FilterValue::Text(text.to_string()))
}

// ==================== Commit ====================

#[test]
fn test_add_condition_assigns_ids_and_bumps_version() {
    let mut e = editor();
    let a = e.add_condition("root", "age", gt(18.0)).unwrap();
    let b = e.add_condition("root", "status", eq("active")).unwrap();

    assert_eq!(a, "n-1");
    assert_eq!(b, "n-2");
    assert_eq!(e.model().version(), 2);
    assert_eq!(e.root().children.len(), 2);
    assert!(e.can_undo());
}

#[test]
fn test_rejected_edit_changes_nothing() {
    let mut e = editor();
    e.add_condition("root", "age", gt(18.0)).unwrap();
    let before = e.model().clone();

    let err = e.add_condition("missing", "age", gt(1.0)).unwrap_err();
    assert_eq!(err, TreeError::NotFound { id: "missing".to_string() });
    assert_eq!(e.model(), &before);

    e.undo();
    assert!(e.root().children.is_empty());
    assert!(!e.can_undo());
}

#[test]
fn test_empty_column_is_rejected() {
    let mut e = editor();
    let err = e.add_condition("root", "  ", gt(1.0)).unwrap_err();
    assert!(matches!(err, TreeError::InvalidField { field: "columnId", .. }));
    assert_eq!(e.model().version(), 0);
}

#[test]
fn test_xor_patch_on_three_children_is_rejected() {
    let mut e = editor();
    for column in ["a", "b", "c"] {
        e.add_condition("root", column, gt(1.0)).unwrap();
    }
    let before = e.root().clone();

    let err = e
        .update("root", &NodePatch::new().operator(LogicalOperator::Xor))
        .unwrap_err();
    assert!(matches!(
        err,
        TreeError::InvalidArity { expected: 2, actual: 3, .. }
    ));
    assert_eq!(e.root(), &before);
}

#[test]
fn test_custom_logic_referencing_missing_child_is_rejected() {
    let mut e = editor();
    e.add_condition("root", "a", gt(1.0)).unwrap();
    e.add_condition("root", "b", gt(2.0)).unwrap();

    let patch = NodePatch::new()
        .operator(LogicalOperator::Custom)
        .custom_logic("A AND C");
    let err = e.update("root", &patch).unwrap_err();
    assert!(matches!(
        err.as_expression(),
        Some(LogicError::UndefinedReference { .. })
    ));
    assert_eq!(e.root().operator, LogicalOperator::And);
}

#[test]
fn test_metadata_is_stale_after_edit() {
    let mut e = editor();
    e.add_condition("root", "a", gt(1.0)).unwrap();
    assert_eq!(e.complexity().node_count, 2);
    assert!(!e.model().is_metadata_stale());

    e.add_condition("root", "b", gt(1.0)).unwrap();
    assert!(e.model().is_metadata_stale());
    assert_eq!(e.complexity().node_count, 3);
}

// ==================== History ====================

#[test]
fn test_undo_redo_restore_trees() {
    let mut e = editor();
    e.add_condition("root", "age", gt(18.0)).unwrap();
    let one = e.root().clone();
    e.add_condition("root", "status", eq("active")).unwrap();
    let two = e.root().clone();

    assert!(e.undo());
    assert_eq!(e.root(), &one);
    assert!(e.can_redo());

    assert!(e.redo());
    assert_eq!(e.root(), &two);
    assert!(!e.redo());

    // undo and redo count as changes
    assert_eq!(e.model().version(), 4);
}

#[test]
fn test_new_edit_discards_redo() {
    let mut e = editor();
    e.add_condition("root", "a", gt(1.0)).unwrap();
    e.undo();
    e.add_condition("root", "b", gt(1.0)).unwrap();
    assert!(!e.can_redo());
}

#[test]
fn test_undo_on_fresh_editor() {
    let mut e = editor();
    assert!(!e.undo());
    assert_eq!(e.model().version(), 0);
}

#[test]
fn test_history_capacity_from_config() {
    let clock = FixedClock(Utc::now());
    let config = EngineConfig {
        history: crate::config::HistoryConfig { capacity: 2 },
        ..EngineConfig::default()
    };
    let mut e = FilterEditor::with_collaborators("c", config, clock, SequentialIds::new("n"));
    for column in ["a", "b", "c"] {
        e.add_condition("root", column, gt(1.0)).unwrap();
    }
    assert!(e.undo());
    assert!(e.undo());
    assert!(!e.undo());
    assert_eq!(e.root().children.len(), 1);
}

// ==================== Structure ====================

#[test]
fn test_copy_node_places_copy_after_original() {
    let mut e = editor();
    let g = e.add_group("root", LogicalOperator::Or).unwrap();
    e.add_condition(&g, "a", gt(1.0)).unwrap();
    e.add_condition("root", "z", gt(1.0)).unwrap();

    let copy = e.copy_node(&g, None).unwrap();
    let order: Vec<_> = e.root().children.iter().map(|c| c.id().to_string()).collect();
    assert_eq!(order, [g.clone(), copy.clone(), "n-3".to_string()]);

    let copied = e.find(&copy).unwrap();
    assert_eq!(copied.children().len(), 1);
    assert_ne!(copied.children()[0].id(), "n-2");
}

#[test]
fn test_copy_root_is_rejected() {
    let mut e = editor();
    assert!(e.copy_node("root", None).is_err());
}

#[test]
fn test_set_enabled_and_remove() {
    let mut e = editor();
    let a = e.add_condition("root", "age", gt(18.0)).unwrap();
    e.add_condition("root", "status", eq("active")).unwrap();

    e.set_enabled(&a, false).unwrap();
    assert_eq!(e.generate_sql().output, "status = ?");

    let removed = e.remove(&a).unwrap();
    assert_eq!(removed.id(), a);
    assert!(e.find(&a).is_none());
}

#[test]
fn test_move_node_between_groups() {
    let mut e = editor();
    let g = e.add_group("root", LogicalOperator::Or).unwrap();
    let a = e.add_condition("root", "a", gt(1.0)).unwrap();

    e.move_node(&a, &g, None).unwrap();
    assert_eq!(tree::parent_of(e.root(), &a).unwrap().id, g);
}

#[test]
fn test_validate_custom_logic_is_read_only() {
    let mut e = editor();
    e.add_condition("root", "a", gt(1.0)).unwrap();
    e.add_condition("root", "b", gt(1.0)).unwrap();

    assert!(e.validate_custom_logic("root", "A OR NOT B").unwrap().valid);
    assert!(!e.validate_custom_logic("root", "A AND").unwrap().valid);
    assert!(e.validate_custom_logic("n-1", "A").is_err());
    assert_eq!(e.model().version(), 2);
}

// ==================== External Results ====================

fn parsed() -> ParsedNaturalQuery {
    ParsedNaturalQuery {
        operator: LogicalOperator::Or,
        conditions: vec![
            ParsedCondition {
                column_id: "city".to_string(),
                filter: eq("Oslo"),
            },
            ParsedCondition {
                column_id: "city".to_string(),
                filter: eq("Bergen"),
            },
        ],
        interpretation: "city is Oslo or Bergen".to_string(),
        confidence: 0.8,
    }
}

#[test]
fn test_apply_natural_parse_then_fold() {
    let mut e = editor();
    let nl = e.add_natural("root", "customers in Oslo or Bergen").unwrap();
    assert!(e.fold_natural(&nl).is_err());

    e.apply_natural_parse(&nl, parsed()).unwrap();
    assert_eq!(e.generate_sql().output, "city = ? OR city = ?");

    let group = e.fold_natural(&nl).unwrap();
    assert!(e.find(&nl).is_none());
    assert_eq!(e.find(&group).unwrap().children().len(), 2);
    assert_eq!(e.generate_sql().output, "city = ? OR city = ?");

    assert!(e.undo());
    assert!(e.find(&nl).is_some());
}

#[test]
fn test_fold_on_condition_is_rejected() {
    let mut e = editor();
    let a = e.add_condition("root", "a", gt(1.0)).unwrap();
    assert!(matches!(
        e.fold_natural(&a),
        Err(TreeError::PatchMismatch { kind: crate::node::NodeKind::Condition, .. })
    ));
}

#[test]
fn test_apply_suggestion_actions() {
    let mut e = editor();
    let added = e
        .apply_suggestion(&Suggestion {
            title: "Only adults".to_string(),
            description: String::new(),
            action: SuggestionAction::AddCondition {
                parent_id: "root".to_string(),
                column_id: "age".to_string(),
                filter: gt(17.0),
            },
        })
        .unwrap()
        .unwrap();

    e.apply_suggestion(&Suggestion {
        title: "Disable".to_string(),
        description: String::new(),
        action: SuggestionAction::Update {
            node_id: added.clone(),
            patch: NodePatch::new().enabled(false),
        },
    })
    .unwrap();
    assert_eq!(e.generate_sql().output, "");

    let removed = e
        .apply_suggestion(&Suggestion {
            title: "Drop".to_string(),
            description: String::new(),
            action: SuggestionAction::Remove { node_id: added },
        })
        .unwrap();
    assert!(removed.is_none());
    assert!(e.root().children.is_empty());
}

// ==================== Views and State ====================

#[test]
fn test_evaluate_rows() {
    let mut e = editor();
    e.add_condition("root", "age", gt(18.0)).unwrap();
    let rows = [
        serde_json::json!({ "age": 30 }),
        serde_json::json!({ "age": 12 }),
    ];
    let rows: Vec<_> = rows.iter().map(crate::evaluator::JsonRow).collect();
    let kept = e.filter_rows(&rows);
    assert_eq!(kept.len(), 1);
    assert!(e.evaluate(&rows[0]));
}

#[test]
fn test_import_replaces_model_and_clears_history() {
    let mut source = editor();
    source.add_condition("root", "age", gt(18.0)).unwrap();
    let json = source.export_state().unwrap();

    let mut e = editor();
    e.add_condition("root", "x", gt(1.0)).unwrap();
    e.import_state(&json).unwrap();

    assert_eq!(e.root(), source.root());
    assert_eq!(e.model().version(), source.model().version());
    assert!(!e.can_undo());
}

#[test]
fn test_export_carries_fresh_metadata() {
    let mut e = editor();
    e.add_condition("root", "age", gt(18.0)).unwrap();
    assert!(e.model().is_metadata_stale());

    let json = e.export_state().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["model"]["metadata"]["performance"], "excellent");
    assert_eq!(value["model"]["metadata"]["complexity"]["nodeCount"], 2);
}

#[test]
fn test_failed_import_keeps_model() {
    let mut e = editor();
    e.add_condition("root", "x", gt(1.0)).unwrap();
    let before = e.model().clone();
    assert!(e.import_state("{}").is_err());
    assert_eq!(e.model(), &before);
    assert!(e.can_undo());
}
