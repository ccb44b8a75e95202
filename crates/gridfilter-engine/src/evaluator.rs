//! Evaluation of a filter tree against rows.
//!
//! The evaluator applies the same absence rules as the generators: disabled
//! conditions, uncompiled formulas and uninterpreted natural-language nodes
//! are absent, and a filter with nothing present matches every row.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde_json::Value;

use crate::codegen::operators::{self, ConditionOperator};
use crate::formula::FormulaExpr;
use crate::node::{ConditionFilter, FilterNode, FilterValue, GroupNode};
use crate::operator::LogicalOperator;

/// Decides single comparisons for a row.
pub trait ConditionResolver {
    /// Returns whether the row's `column_id` satisfies `filter`.
    fn matches(&self, column_id: &str, filter: &ConditionFilter) -> bool;
}

impl<F> ConditionResolver for F
where
    F: Fn(&str, &ConditionFilter) -> bool,
{
    fn matches(&self, column_id: &str, filter: &ConditionFilter) -> bool {
        self(column_id, filter)
    }
}

/// Evaluates one filter tree against any number of rows.
#[derive(Debug, Clone, Copy)]
pub struct FilterEvaluator<'a> {
    root: &'a GroupNode,
}

impl<'a> FilterEvaluator<'a> {
    pub fn new(root: &'a GroupNode) -> Self {
        Self { root }
    }

    /// Evaluates the tree; `None` when nothing in it is present.
    pub fn evaluate<R: ConditionResolver + ?Sized>(&self, row: &R) -> Option<bool> {
        evaluate_group(self.root, row)
    }

    /// Returns whether the row passes the filter.
    pub fn matches<R: ConditionResolver + ?Sized>(&self, row: &R) -> bool {
        self.evaluate(row).unwrap_or(true)
    }

    /// Keeps the rows that pass the filter.
    pub fn filter_rows<'r, R: ConditionResolver>(&self, rows: &'r [R]) -> Vec<&'r R> {
        rows.iter().filter(|row| self.matches(*row)).collect()
    }
}

fn evaluate_node<R: ConditionResolver + ?Sized>(node: &FilterNode, row: &R) -> Option<bool> {
    match node {
        FilterNode::Group(group) => evaluate_group(group, row),
        FilterNode::Condition(condition) => condition
            .enabled
            .then(|| row.matches(&condition.column_id, &condition.filter)),
        FilterNode::Formula(formula) => formula.compiled().map(|expr| evaluate_formula(expr, row)),
        FilterNode::Natural(natural) => natural
            .interpreted_group()
            .and_then(|group| evaluate_group(&group, row)),
    }
}

fn evaluate_group<R: ConditionResolver + ?Sized>(group: &GroupNode, row: &R) -> Option<bool> {
    let operands: Vec<Option<bool>> = group
        .children
        .iter()
        .map(|child| evaluate_node(child, row))
        .collect();

    let combined = match (group.operator, group.compiled_logic()) {
        (LogicalOperator::Custom, Some(expr)) => expr.evaluate(&operands)?,
        (operator, _) => {
            let present: Vec<bool> = operands.into_iter().flatten().collect();
            if present.is_empty() {
                return None;
            }
            let (effective, _) = match operator {
                LogicalOperator::Custom => (LogicalOperator::And, true),
                other => other.effective(present.len()),
            };
            effective.combine(&present)?
        }
    };
    Some(combined != group.negated)
}

fn evaluate_formula<R: ConditionResolver + ?Sized>(expr: &FormulaExpr, row: &R) -> bool {
    match expr {
        FormulaExpr::Compare(comparison) => row.matches(&comparison.column_id, &comparison.filter),
        FormulaExpr::Not(inner) => !evaluate_formula(inner, row),
        FormulaExpr::And(left, right) => evaluate_formula(left, row) && evaluate_formula(right, row),
        FormulaExpr::Or(left, right) => evaluate_formula(left, row) || evaluate_formula(right, row),
    }
}

/// A row backed by a JSON object, resolving the standard condition
/// operators. Text comparisons ignore case.
#[derive(Debug, Clone, Copy)]
pub struct JsonRow<'a>(pub &'a Value);

impl ConditionResolver for JsonRow<'_> {
    fn matches(&self, column_id: &str, filter: &ConditionFilter) -> bool {
        let Some(operator) = operators::lookup(&filter.operator) else {
            tracing::debug!(operator = %filter.operator, "unknown operator never matches");
            return false;
        };
        let actual = self.0.get(column_id).filter(|v| !v.is_null());
        let expected = &filter.value;

        match operator {
            ConditionOperator::IsEmpty => actual.map_or(true, is_blank),
            ConditionOperator::IsNotEmpty => !actual.map_or(true, is_blank),
            ConditionOperator::NotEquals => {
                actual.map_or(true, |v| compare(v, expected) != Some(Ordering::Equal))
            }
            ConditionOperator::NotContains => actual.map_or(true, |v| !contains(v, expected)),
            ConditionOperator::NotIn => actual.map_or(true, |v| !member_of(v, expected)),
            _ => actual.is_some_and(|v| test(operator, v, expected)),
        }
    }
}

fn test(operator: ConditionOperator, actual: &Value, expected: &FilterValue) -> bool {
    let ordering = || compare(actual, expected);
    match operator {
        ConditionOperator::Equals => ordering() == Some(Ordering::Equal),
        ConditionOperator::GreaterThan | ConditionOperator::After => {
            ordering() == Some(Ordering::Greater)
        }
        ConditionOperator::GreaterThanOrEqual => {
            matches!(ordering(), Some(Ordering::Greater | Ordering::Equal))
        }
        ConditionOperator::LessThan | ConditionOperator::Before => ordering() == Some(Ordering::Less),
        ConditionOperator::LessThanOrEqual => {
            matches!(ordering(), Some(Ordering::Less | Ordering::Equal))
        }
        ConditionOperator::Contains => contains(actual, expected),
        ConditionOperator::StartsWith => text_pair(actual, expected).is_some_and(|(a, e)| a.starts_with(&e)),
        ConditionOperator::EndsWith => text_pair(actual, expected).is_some_and(|(a, e)| a.ends_with(&e)),
        ConditionOperator::Between => between(actual, expected),
        ConditionOperator::In => member_of(actual, expected),
        ConditionOperator::IsEmpty
        | ConditionOperator::IsNotEmpty
        | ConditionOperator::NotEquals
        | ConditionOperator::NotContains
        | ConditionOperator::NotIn => false,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_lowercase()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?;
    // Accepts full timestamps by reading only the date part.
    NaiveDate::parse_from_str(text.get(..10).unwrap_or(text), "%Y-%m-%d").ok()
}

fn text_pair(actual: &Value, expected: &FilterValue) -> Option<(String, String)> {
    match expected {
        FilterValue::Text(text) => Some((as_text(actual)?, text.to_lowercase())),
        _ => None,
    }
}

fn compare(actual: &Value, expected: &FilterValue) -> Option<Ordering> {
    match expected {
        FilterValue::Number(n) => as_number(actual)?.partial_cmp(n),
        FilterValue::Text(text) => Some(as_text(actual)?.cmp(&text.to_lowercase())),
        FilterValue::Date(date) => Some(as_date(actual)?.cmp(date)),
        FilterValue::Boolean(b) => Some(actual.as_bool()?.cmp(b)),
        FilterValue::Set(_) => None,
    }
}

fn contains(actual: &Value, expected: &FilterValue) -> bool {
    match (actual, expected) {
        (Value::Array(items), _) => items.iter().any(|item| compare(item, expected) == Some(Ordering::Equal)),
        _ => text_pair(actual, expected).is_some_and(|(a, e)| a.contains(&e)),
    }
}

fn member_of(actual: &Value, expected: &FilterValue) -> bool {
    let FilterValue::Set(items) = expected else {
        return compare(actual, expected) == Some(Ordering::Equal);
    };
    let Some(actual) = as_text(actual) else {
        return false;
    };
    items.iter().any(|item| item.to_lowercase() == actual)
}

fn between(actual: &Value, expected: &FilterValue) -> bool {
    let FilterValue::Set(bounds) = expected else {
        return false;
    };
    let [low, high] = bounds.as_slice() else {
        return false;
    };
    if let (Some(value), Ok(low), Ok(high)) = (as_number(actual), low.parse::<f64>(), high.parse::<f64>()) {
        return low <= value && value <= high;
    }
    match (
        as_date(actual),
        NaiveDate::parse_from_str(low, "%Y-%m-%d"),
        NaiveDate::parse_from_str(high, "%Y-%m-%d"),
    ) {
        (Some(value), Ok(low), Ok(high)) => low <= value && value <= high,
        _ => false,
    }
}
