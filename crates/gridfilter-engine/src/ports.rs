//! Collaborators the engine is handed instead of reaching for ambient state.
//!
//! Time and id generation are injected so edits are reproducible in tests.
//! Natural-language interpretation and suggestions are asynchronous services
//! the engine never calls itself: a caller awaits them and hands the result
//! back through [`crate::FilterEditor::apply_natural_parse`] or
//! [`crate::FilterEditor::apply_suggestion`].

use std::cell::Cell;
use std::future::{self, Future};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MultiFilterModel;
use crate::node::{ConditionFilter, ConditionNode, GroupNode, NodeId};
use crate::operator::LogicalOperator;
use crate::tree::NodePatch;

/// Source of the current time.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of fresh node ids.
pub trait IdGenerator {
    /// Returns an id not returned before.
    fn next_id(&self) -> NodeId;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> NodeId {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `prefix-1`, `prefix-2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialIds {
    /// Creates a generator starting at 1.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> NodeId {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}-{}", self.prefix, n)
    }
}

/// One condition recognised in a natural-language query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCondition {
    pub column_id: String,
    pub filter: ConditionFilter,
}

/// Result of interpreting a natural-language query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedNaturalQuery {
    /// How the recognised conditions combine.
    pub operator: LogicalOperator,
    pub conditions: Vec<ParsedCondition>,
    /// The interpreter's own restatement of the query.
    pub interpretation: String,
    /// 0..=1
    pub confidence: f64,
}

impl ParsedNaturalQuery {
    /// An interpretation that recognised nothing.
    pub fn unrecognized(text: &str) -> Self {
        Self {
            operator: LogicalOperator::And,
            conditions: Vec::new(),
            interpretation: text.to_string(),
            confidence: 0.0,
        }
    }

    /// Builds a group holding one condition per recognised clause.
    ///
    /// Operators whose arity does not fit the clause count, and `CUSTOM`
    /// (which has no expression here), become `AND`.
    pub fn to_group(&self, id: NodeId, mut next_id: impl FnMut() -> NodeId) -> GroupNode {
        let operator = if self.operator != LogicalOperator::Custom
            && self.operator.arity().accepts(self.conditions.len())
        {
            self.operator
        } else {
            LogicalOperator::And
        };

        let mut group = GroupNode::new(id, operator);
        for condition in &self.conditions {
            group.children.push(Arc::new(
                ConditionNode::new(next_id(), condition.column_id.clone(), condition.filter.clone())
                    .into(),
            ));
        }
        group
    }
}

/// An edit proposed by a suggestion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SuggestionAction {
    /// Add a condition under a group.
    #[serde(rename_all = "camelCase")]
    AddCondition {
        parent_id: NodeId,
        column_id: String,
        filter: ConditionFilter,
    },
    /// Patch an existing node.
    #[serde(rename_all = "camelCase")]
    Update { node_id: NodeId, patch: NodePatch },
    /// Remove a node and its subtree.
    #[serde(rename_all = "camelCase")]
    Remove { node_id: NodeId },
}

/// A proposed improvement to a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    pub action: SuggestionAction,
}

/// Errors reported by external services.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    /// No service is configured.
    #[error("service unavailable")]
    Unavailable,

    /// The service answered with an error.
    #[error("service failed: {0}")]
    Failed(String),
}

/// Result type for external service calls.
pub type PortResult<T> = Result<T, PortError>;

/// Interprets free text into conditions.
pub trait NaturalLanguageInterpreter {
    /// Interprets `text`.
    fn interpret(&self, text: &str) -> impl Future<Output = PortResult<ParsedNaturalQuery>> + Send;
}

/// Proposes edits for a model.
pub trait SuggestionEngine {
    /// Returns suggestions for `model`.
    fn suggest(
        &self,
        model: &MultiFilterModel,
    ) -> impl Future<Output = PortResult<Vec<Suggestion>>> + Send;
}

/// Interpreter that recognises nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInterpreter;

impl NaturalLanguageInterpreter for NoopInterpreter {
    fn interpret(&self, text: &str) -> impl Future<Output = PortResult<ParsedNaturalQuery>> + Send {
        future::ready(Ok(ParsedNaturalQuery::unrecognized(text)))
    }
}

/// Suggestion engine that never suggests anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSuggestions;

impl SuggestionEngine for NoopSuggestions {
    fn suggest(
        &self,
        _model: &MultiFilterModel,
    ) -> impl Future<Output = PortResult<Vec<Suggestion>>> + Send {
        future::ready(Ok(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FilterValue;
    use chrono::TimeZone;

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("n");
        assert_eq!(ids.next_id(), "n-1");
        assert_eq!(ids.next_id(), "n-2");
    }

    #[test]
    fn test_uuid_ids_are_distinct() {
        let ids = UuidGenerator;
        assert_ne!(ids.next_id(), ids.next_id());
    }

    #[test]
    fn test_fixed_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(FixedClock(at).now(), at);
    }

    #[test]
    fn test_parsed_query_to_group() {
        let parsed = ParsedNaturalQuery {
            operator: LogicalOperator::Or,
            conditions: vec![
                ParsedCondition {
                    column_id: "city".to_string(),
                    filter: ConditionFilter::new("equals", FilterValue::Text("Oslo".into())),
                },
                ParsedCondition {
                    column_id: "city".to_string(),
                    filter: ConditionFilter::new("equals", FilterValue::Text("Bergen".into())),
                },
            ],
            interpretation: "city is Oslo or Bergen".to_string(),
            confidence: 0.9,
        };

        let ids = SequentialIds::new("p");
        let group = parsed.to_group("g".to_string(), || ids.next_id());
        assert_eq!(group.operator, LogicalOperator::Or);
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[1].id(), "p-2");
    }

    #[test]
    fn test_parsed_query_with_mismatched_arity_becomes_and() {
        let mut parsed = ParsedNaturalQuery::unrecognized("x");
        parsed.operator = LogicalOperator::Xor;
        let group = parsed.to_group("g".to_string(), || "unused".to_string());
        assert_eq!(group.operator, LogicalOperator::And);
    }

    #[tokio::test]
    async fn test_noop_interpreter() {
        let parsed = NoopInterpreter.interpret("rows from last week").await.unwrap();
        assert!(parsed.conditions.is_empty());
        assert_eq!(parsed.confidence, 0.0);
        assert_eq!(parsed.interpretation, "rows from last week");
    }

    #[tokio::test]
    async fn test_noop_suggestions() {
        let model = MultiFilterModel::new("col", Utc::now());
        let suggestions = NoopSuggestions.suggest(&model).await.unwrap();
        assert!(suggestions.is_empty());
    }
}
