use serde::{Deserialize, Serialize};

use super::{check_arity, TreeError, TreeResult};
use crate::custom_logic::LogicError;
use crate::node::{ConditionFilter, FilterNode, NodeKind, NodeMetadata, Position};
use crate::operator::LogicalOperator;
use crate::ports::ParsedNaturalQuery;

/// A partial update of one node.
///
/// Only the fields that are set are applied. Fields that do not exist on the
/// target node's kind are rejected rather than ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// `Some(None)` clears the metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Option<NodeMetadata>>,

    // Group fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<LogicalOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_logic: Option<String>,

    // Condition fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ConditionFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    // Formula fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,

    // Natural fields
    /// A new query discards the previous interpretation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedNaturalQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl NodePatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the node on the canvas.
    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Replaces the presentation metadata; `None` clears it.
    pub fn metadata(mut self, metadata: Option<NodeMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets a group's operator.
    pub fn operator(mut self, operator: LogicalOperator) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Sets a group's negation flag.
    pub fn negated(mut self, negated: bool) -> Self {
        self.negated = Some(negated);
        self
    }

    /// Sets a group's custom logic text.
    pub fn custom_logic(mut self, logic: impl Into<String>) -> Self {
        self.custom_logic = Some(logic.into());
        self
    }

    /// Points a condition at another column.
    pub fn column_id(mut self, column_id: impl Into<String>) -> Self {
        self.column_id = Some(column_id.into());
        self
    }

    /// Enables or disables a condition.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Replaces a condition's operator and value.
    pub fn filter(mut self, filter: ConditionFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets a condition's scoring weight.
    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Replaces a formula's text.
    pub fn formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Replaces a natural-language query.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Stores an interpreter's answer.
    pub fn parsed(mut self, parsed: ParsedNaturalQuery) -> Self {
        self.parsed = Some(parsed);
        self
    }

    /// Sets the interpreter's confidence.
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Returns true if the patch sets nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn set_fields(&self) -> [(&'static str, bool, NodeKind); 11] {
        [
            ("operator", self.operator.is_some(), NodeKind::Group),
            ("negated", self.negated.is_some(), NodeKind::Group),
            ("customLogic", self.custom_logic.is_some(), NodeKind::Group),
            ("columnId", self.column_id.is_some(), NodeKind::Condition),
            ("enabled", self.enabled.is_some(), NodeKind::Condition),
            ("filter", self.filter.is_some(), NodeKind::Condition),
            ("weight", self.weight.is_some(), NodeKind::Condition),
            ("formula", self.formula.is_some(), NodeKind::Formula),
            ("query", self.query.is_some(), NodeKind::Natural),
            ("parsed", self.parsed.is_some(), NodeKind::Natural),
            ("confidence", self.confidence.is_some(), NodeKind::Natural),
        ]
    }

    /// Applies the patch to a node in place.
    ///
    /// The node may be left half-patched on error; callers patch a copy.
    pub(crate) fn apply(&self, node: &mut FilterNode) -> TreeResult<()> {
        let kind = node.kind();
        if let Some((field, _, _)) = self
            .set_fields()
            .into_iter()
            .find(|(_, set, owner)| *set && *owner != kind)
        {
            return Err(TreeError::PatchMismatch {
                id: node.id().to_string(),
                field,
                kind,
            });
        }

        if let Some(position) = self.position {
            *node.position_mut() = position;
        }
        if let Some(metadata) = &self.metadata {
            *node.metadata_mut() = metadata.clone();
        }

        match node {
            FilterNode::Group(group) => {
                let operator = self.operator.unwrap_or(group.operator);
                if let Some(negated) = self.negated {
                    group.negated = negated;
                }

                let group_id = group.id.clone();
                let expression_error = |source: LogicError| TreeError::Expression {
                    group_id: group_id.clone(),
                    source,
                };
                if operator == LogicalOperator::Custom {
                    let logic = self
                        .custom_logic
                        .clone()
                        .or_else(|| group.custom_logic().map(str::to_string))
                        .ok_or_else(|| expression_error(LogicError::EmptyExpression))?;
                    group
                        .set_custom_logic(Some(logic))
                        .map_err(expression_error)?;
                } else if self.custom_logic.is_some() {
                    return Err(TreeError::InvalidField {
                        field: "customLogic",
                        reason: format!("{operator} groups do not take custom logic"),
                    });
                } else {
                    // Leaving CUSTOM drops the expression.
                    let _ = group.set_custom_logic(None);
                }

                group.operator = operator;
                check_arity(group)?;
            }
            FilterNode::Condition(condition) => {
                if let Some(column_id) = &self.column_id {
                    check_column(column_id)?;
                    condition.column_id = column_id.clone();
                }
                if let Some(enabled) = self.enabled {
                    condition.enabled = enabled;
                }
                if let Some(filter) = &self.filter {
                    condition.filter = filter.clone();
                }
                if let Some(weight) = self.weight {
                    check_weight(weight)?;
                    condition.weight = weight;
                }
            }
            FilterNode::Formula(formula) => {
                if let Some(text) = &self.formula {
                    // Stored even when it does not compile.
                    let _ = formula.set_formula(text.clone());
                }
            }
            FilterNode::Natural(natural) => {
                if let Some(query) = &self.query {
                    natural.query = query.clone();
                    natural.parsed = None;
                    natural.confidence = 0.0;
                }
                if let Some(parsed) = &self.parsed {
                    check_confidence(parsed.confidence)?;
                    natural.confidence = parsed.confidence;
                    natural.parsed = Some(parsed.clone());
                }
                if let Some(confidence) = self.confidence {
                    check_confidence(confidence)?;
                    natural.confidence = confidence;
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn check_column(column_id: &str) -> TreeResult<()> {
    if column_id.trim().is_empty() {
        return Err(TreeError::InvalidField {
            field: "columnId",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

pub(super) fn check_weight(weight: f64) -> TreeResult<()> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(TreeError::InvalidField {
            field: "weight",
            reason: format!("must be a positive number, got {weight}"),
        })
    }
}

pub(super) fn check_confidence(confidence: f64) -> TreeResult<()> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(TreeError::InvalidField {
            field: "confidence",
            reason: format!("must be between 0 and 1, got {confidence}"),
        })
    }
}
