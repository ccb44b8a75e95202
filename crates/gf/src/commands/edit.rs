//! Commands that change a model file: new, add, remove, set, move.

use std::path::Path;

use chrono::NaiveDate;
use gridfilter_engine::codegen::operators::{self, ConditionOperator};
use gridfilter_engine::{
    ConditionFilter, FilterValue, LogicalOperator, MultiFilterModel, NodePatch, NodeRef,
};
use owo_colors::OwoColorize;
use tracing::warn;

use super::model_file::{self, Editor};
use super::{CommandContext, CommandError, Result};
use crate::cli::{AddCommands, SetArgs, ValueType};

/// Executes `gf new`.
pub fn execute_new(ctx: &CommandContext, file: &Path, column: &str, force: bool) -> Result<()> {
    let editor = model_file::create(file, column, force, ctx.engine)?;
    report(ctx, "created", editor.root_id(), editor.model(), file)
}

/// Executes `gf add`.
pub fn execute_add(ctx: &CommandContext, file: &Path, node: &AddCommands) -> Result<()> {
    let mut editor = model_file::load(file, ctx.engine)?;

    let id = match node {
        AddCommands::Condition {
            column,
            operator,
            value,
            value_type,
            parent,
            disabled,
        } => {
            check_condition_operator(operator);
            let value = parse_value(value.as_deref(), *value_type, operator)?;
            let parent = parent_or_root(&editor, parent.as_deref());
            let id = editor.add_condition(&parent, column.clone(), ConditionFilter::new(operator.clone(), value))?;
            if *disabled {
                editor.set_enabled(&id, false)?;
            }
            id
        }
        AddCommands::Group { operator, parent } => {
            let operator = parse_operator(operator)?;
            let parent = parent_or_root(&editor, parent.as_deref());
            editor.add_group(&parent, operator)?
        }
        AddCommands::Formula { formula, parent } => {
            let parent = parent_or_root(&editor, parent.as_deref());
            let id = editor.add_formula(&parent, formula.clone())?;
            if let Some(NodeRef::Formula(node)) = editor.find(&id) {
                if let Some(error) = node.compile_error() {
                    warn!(id = %id, %error, "formula stored but does not compile");
                }
            }
            id
        }
        AddCommands::Natural { query, parent } => {
            let parent = parent_or_root(&editor, parent.as_deref());
            editor.add_natural(&parent, query.clone())?
        }
    };

    model_file::save(file, &mut editor)?;
    report(ctx, "added", &id, editor.model(), file)
}

/// Executes `gf remove`.
pub fn execute_remove(ctx: &CommandContext, file: &Path, id: &str) -> Result<()> {
    let mut editor = model_file::load(file, ctx.engine)?;
    editor.remove(id)?;
    model_file::save(file, &mut editor)?;
    report(ctx, "removed", id, editor.model(), file)
}

/// Executes `gf set`.
pub fn execute_set(ctx: &CommandContext, args: &SetArgs) -> Result<()> {
    let mut editor = model_file::load(&args.file, ctx.engine)?;
    let patch = build_patch(&editor, args)?;
    if patch.is_empty() {
        return Err(CommandError::InvalidInput(
            "nothing to change; pass at least one field flag".to_string(),
        ));
    }

    editor.update(&args.id, &patch)?;
    model_file::save(&args.file, &mut editor)?;
    report(ctx, "updated", &args.id, editor.model(), &args.file)
}

/// Executes `gf move`.
pub fn execute_move(
    ctx: &CommandContext,
    file: &Path,
    id: &str,
    parent: &str,
    index: Option<usize>,
) -> Result<()> {
    let mut editor = model_file::load(file, ctx.engine)?;
    editor.move_node(id, parent, index)?;
    model_file::save(file, &mut editor)?;
    report(ctx, "moved", id, editor.model(), file)
}

fn parent_or_root(editor: &Editor, parent: Option<&str>) -> String {
    parent.unwrap_or_else(|| editor.root_id()).to_string()
}

fn build_patch(editor: &Editor, args: &SetArgs) -> Result<NodePatch> {
    let mut patch = NodePatch::new();

    match (&args.operator, &args.logic) {
        (Some(operator), _) => patch = patch.operator(parse_operator(operator)?),
        (None, Some(_)) => patch = patch.operator(LogicalOperator::Custom),
        (None, None) => {}
    }
    if let Some(logic) = &args.logic {
        patch = patch.custom_logic(logic.clone());
    }
    if let Some(negated) = args.negated {
        patch = patch.negated(negated);
    }
    if let Some(enabled) = args.enabled {
        patch = patch.enabled(enabled);
    }
    if let Some(column) = &args.column {
        patch = patch.column_id(column.clone());
    }
    if args.condition_operator.is_some() || args.value.is_some() {
        let Some(NodeRef::Condition(current)) = editor.find(&args.id) else {
            return Err(CommandError::InvalidInput(format!(
                "--op and --value only apply to conditions; '{}' is not one",
                args.id
            )));
        };
        let operator = args
            .condition_operator
            .clone()
            .unwrap_or_else(|| current.filter.operator.clone());
        check_condition_operator(&operator);
        let value = match &args.value {
            Some(raw) => parse_value(Some(raw), args.value_type, &operator)?,
            None => current.filter.value.clone(),
        };
        patch = patch.filter(ConditionFilter::new(operator, value));
    }
    if let Some(weight) = args.weight {
        patch = patch.weight(weight);
    }
    if let Some(formula) = &args.formula {
        patch = patch.formula(formula.clone());
    }
    if let Some(query) = &args.query {
        patch = patch.query(query.clone());
    }
    if let Some(label) = &args.label {
        let mut metadata = editor
            .find(&args.id)
            .and_then(|node| node.metadata().cloned())
            .unwrap_or_default();
        metadata.label = Some(label.clone());
        patch = patch.metadata(Some(metadata));
    }

    Ok(patch)
}

/// Parses a logical operator name such as `and`, `IF_THEN` or `if-then-else`.
pub fn parse_operator(name: &str) -> Result<LogicalOperator> {
    LogicalOperator::from_name(name).ok_or_else(|| {
        let valid: Vec<&str> = LogicalOperator::ALL.iter().map(|op| op.as_str()).collect();
        CommandError::InvalidInput(format!(
            "unknown logical operator '{}'. Valid operators: {}",
            name,
            valid.join(", ")
        ))
    })
}

/// Warns about condition operators the query generators do not know.
fn check_condition_operator(name: &str) {
    if operators::lookup(name).is_some() {
        return;
    }
    match operators::suggest(name) {
        Some(suggestion) => warn!(operator = name, suggestion, "unknown condition operator"),
        None => warn!(operator = name, "unknown condition operator"),
    }
}

/// Turns a command-line value into a typed filter value.
pub fn parse_value(raw: Option<&str>, value_type: ValueType, operator: &str) -> Result<FilterValue> {
    let known = operators::lookup(operator);
    let Some(raw) = raw else {
        return if known.is_some_and(ConditionOperator::is_unary) {
            Ok(FilterValue::Text(String::new()))
        } else {
            Err(CommandError::InvalidInput(format!(
                "operator '{operator}' needs a value"
            )))
        };
    };

    let invalid = |kind: &str| CommandError::InvalidInput(format!("'{raw}' is not a valid {kind}"));
    let value = match value_type {
        ValueType::Text => FilterValue::Text(raw.to_string()),
        ValueType::Number => FilterValue::Number(raw.trim().parse().map_err(|_| invalid("number"))?),
        ValueType::Date => FilterValue::Date(parse_date(raw).ok_or_else(|| invalid("date"))?),
        ValueType::Bool => FilterValue::Boolean(parse_bool(raw).ok_or_else(|| invalid("boolean"))?),
        ValueType::Set => FilterValue::Set(split_list(raw)),
        ValueType::Auto => {
            let takes_list = matches!(
                known,
                Some(ConditionOperator::Between | ConditionOperator::In | ConditionOperator::NotIn)
            );
            if takes_list && raw.contains(',') {
                FilterValue::Set(split_list(raw))
            } else if let Ok(number) = raw.trim().parse::<f64>() {
                FilterValue::Number(number)
            } else if let Some(flag) = parse_bool(raw) {
                FilterValue::Boolean(flag)
            } else if let Some(date) = parse_date(raw) {
                FilterValue::Date(date)
            } else {
                FilterValue::Text(raw.to_string())
            }
        }
    };
    Ok(value)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn report(
    ctx: &CommandContext,
    action: &str,
    id: &str,
    model: &MultiFilterModel,
    file: &Path,
) -> Result<()> {
    if ctx.json_output {
        let output = serde_json::json!({
            "status": action,
            "id": id,
            "version": model.version(),
            "file": file.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if ctx.use_colors {
        ctx.print(format!("{} {} (version {})", action.green(), id.bold(), model.version()));
    } else {
        ctx.print(format!("{} {} (version {})", action, id, model.version()));
    }
    Ok(())
}
