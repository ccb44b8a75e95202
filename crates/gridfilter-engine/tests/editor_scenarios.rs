//! End-to-end editing scenarios through the public API.

use chrono::{TimeZone, Utc};
use gridfilter_engine::custom_logic::{self, LogicError};
use gridfilter_engine::ports::{FixedClock, SequentialIds};
use gridfilter_engine::{
    ConditionFilter, EngineConfig, FilterEditor, FilterValue, LogicalOperator, NodePatch,
    TreeError,
};

fn editor() -> FilterEditor<FixedClock, SequentialIds> {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap());
    FilterEditor::with_collaborators("customers", EngineConfig::default(), clock, SequentialIds::new("c"))
}

fn age_over_18() -> ConditionFilter {
    ConditionFilter::new("greaterThan", FilterValue::Number(18.0))
}

fn status_active() -> ConditionFilter {
    ConditionFilter::new("equals", FilterValue::Text("active".to_string()))
}

#[test]
fn sql_for_two_conditions_under_and() {
    let mut editor = editor();
    editor.add_condition("root", "age", age_over_18()).unwrap();
    editor.add_condition("root", "status", status_active()).unwrap();

    let sql = editor.generate_sql();
    assert_eq!(sql.output, "age > ? AND status = ?");
    assert!(sql.is_faithful());
}

#[test]
fn custom_logic_with_repeated_letter_is_valid() {
    let mut editor = editor();
    editor.add_condition("root", "age", age_over_18()).unwrap();
    editor.add_condition("root", "status", status_active()).unwrap();

    let result = editor.validate_custom_logic("root", "A AND (B OR B)").unwrap();
    assert!(result.valid);

    editor
        .update(
            "root",
            &NodePatch::new()
                .operator(LogicalOperator::Custom)
                .custom_logic("A AND (B OR B)"),
        )
        .unwrap();
    assert_eq!(editor.root().custom_logic(), Some("A AND (B OR B)"));
}

#[test]
fn custom_logic_with_unclosed_paren_is_reported() {
    let mut editor = editor();
    editor.add_condition("root", "age", age_over_18()).unwrap();
    editor.add_condition("root", "status", status_active()).unwrap();

    let result = editor.validate_custom_logic("root", "A AND (B").unwrap();
    assert!(!result.valid);
    assert_eq!(
        custom_logic::compile("A AND (B", 2),
        Err(LogicError::UnmatchedOpeningParen)
    );

    let version = editor.model().version();
    let err = editor
        .update(
            "root",
            &NodePatch::new()
                .operator(LogicalOperator::Custom)
                .custom_logic("A AND (B"),
        )
        .unwrap_err();
    assert_eq!(err.as_expression(), Some(&LogicError::UnmatchedOpeningParen));
    assert_eq!(editor.model().version(), version);
}

#[test]
fn xor_on_three_children_is_rejected_without_change() {
    let mut editor = editor();
    let group = editor.add_group("root", LogicalOperator::And).unwrap();
    for column in ["a", "b", "c"] {
        editor.add_condition(&group, column, age_over_18()).unwrap();
    }
    let before = editor.model().clone();

    let err = editor
        .update(&group, &NodePatch::new().operator(LogicalOperator::Xor))
        .unwrap_err();
    assert!(matches!(err, TreeError::InvalidArity { actual: 3, .. }));
    assert_eq!(editor.model(), &before);

    // one undo reverts the last successful insert, not the rejected update
    assert!(editor.undo());
    assert_eq!(editor.find(&group).unwrap().children().len(), 2);
}

#[test]
fn undo_after_insert_restores_snapshot() {
    let mut editor = editor();
    let a = editor.add_condition("root", "age", age_over_18()).unwrap();
    let group = editor.add_group("root", LogicalOperator::Or).unwrap();
    let before = editor.root().clone();

    editor.add_condition(&group, "status", status_active()).unwrap();
    assert!(editor.undo());

    assert_eq!(editor.root(), &before);
    assert!(editor.find(&a).is_some());
    assert!(editor.find(&group).is_some());
}

#[test]
fn disabled_condition_is_left_out_of_preview() {
    let mut editor = editor();
    let age = editor.add_condition("root", "age", age_over_18()).unwrap();
    editor.add_condition("root", "status", status_active()).unwrap();
    assert!(editor.generate_natural().output.contains("age"));

    editor.set_enabled(&age, false).unwrap();
    let preview = editor.generate_natural().output;
    assert_eq!(preview, "status is \"active\"");
    assert!(!preview.contains("age"));
}

#[test]
fn exported_state_reimports_into_a_fresh_editor() {
    let mut source = editor();
    let group = source.add_group("root", LogicalOperator::Or).unwrap();
    source.add_condition(&group, "age", age_over_18()).unwrap();
    source.add_condition(&group, "status", status_active()).unwrap();
    source.add_formula("root", "score >= 10").unwrap();

    let json = source.export_state().unwrap();
    let mut restored = editor();
    restored.import_state(&json).unwrap();

    assert_eq!(restored.generate_sql().output, source.generate_sql().output);
    assert_eq!(restored.generate_document().output, source.generate_document().output);
}
