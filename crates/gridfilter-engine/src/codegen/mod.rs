//! Translators from a filter tree into query forms.
//!
//! All generators share one depth-first walk:
//!
//! - disabled conditions are absent and dropped from their group;
//! - a group whose operands are all absent is itself absent;
//! - a fixed-arity operator that lost operands falls back to AND;
//! - `CUSTOM` groups are folded through their compiled expression;
//! - formulas are expanded into their comparisons;
//! - interpreted natural-language nodes are expanded into their conditions.
//!
//! Generators never fail on a valid tree. Anything they could not translate
//! faithfully is reported in [`Generated::warnings`].

pub mod document;
pub mod natural;
pub mod operators;
pub mod sql;

use std::fmt;

use serde::Serialize;

use crate::custom_logic::LogicExpr;
use crate::formula::FormulaExpr;
use crate::node::{ConditionFilter, FilterNode, GroupNode, NaturalNode, NodeId};
use crate::operator::LogicalOperator;

use self::operators::ConditionOperator;

pub use document::DocumentGenerator;
pub use natural::NaturalLanguageGenerator;
pub use sql::SqlGenerator;

/// Something a generator could not translate faithfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GenerationWarning {
    /// A condition operator has no mapping; `fallback` was used instead.
    #[serde(rename_all = "camelCase")]
    UnmappedOperator {
        node_id: NodeId,
        operator: String,
        fallback: &'static str,
        suggestion: Option<&'static str>,
    },
    /// A formula that does not compile was left out.
    #[serde(rename_all = "camelCase")]
    UncompiledFormula { node_id: NodeId },
    /// A natural-language node without an interpretation was left out or
    /// restated verbatim.
    #[serde(rename_all = "camelCase")]
    UninterpretedNatural { node_id: NodeId },
    /// A fixed-arity group lost operands to disabled children and was
    /// combined with AND instead.
    #[serde(rename_all = "camelCase")]
    ArityFallback {
        group_id: NodeId,
        operator: LogicalOperator,
    },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationWarning::UnmappedOperator {
                node_id,
                operator,
                fallback,
                suggestion,
            } => {
                write!(f, "{node_id}: unknown operator '{operator}', using '{fallback}'")?;
                if let Some(suggestion) = suggestion {
                    write!(f, " (did you mean '{suggestion}'?)")?;
                }
                Ok(())
            }
            GenerationWarning::UncompiledFormula { node_id } => {
                write!(f, "{node_id}: formula does not compile and was skipped")
            }
            GenerationWarning::UninterpretedNatural { node_id } => {
                write!(f, "{node_id}: natural-language query has no interpretation")
            }
            GenerationWarning::ArityFallback { group_id, operator } => write!(
                f,
                "{group_id}: {operator} lost operands to disabled children, combined with AND"
            ),
        }
    }
}

/// Generator output plus the fallbacks taken to produce it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated<T> {
    pub output: T,
    pub warnings: Vec<GenerationWarning>,
}

impl<T> Generated<T> {
    /// True when nothing had to be approximated.
    pub fn is_faithful(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Generated<U> {
        Generated {
            output: f(self.output),
            warnings: self.warnings,
        }
    }
}

/// One output form. The walker decides what is present and in which
/// combination; a dialect only renders.
pub trait Dialect {
    /// Rendered fragment.
    type Output: Clone;

    /// Operator name reported when a condition operator is unknown, or `None`
    /// if the dialect renders unknown operators verbatim.
    fn fallback(&self) -> Option<&'static str>;

    /// Renders one comparison. `operator` is `None` for unknown names.
    fn condition(
        &mut self,
        column_id: &str,
        operator: Option<ConditionOperator>,
        filter: &ConditionFilter,
    ) -> Self::Output;

    /// Combines present operands. `operator` is never `CUSTOM`, and fits the
    /// operand count.
    fn combine(&mut self, operator: LogicalOperator, operands: Vec<Self::Output>) -> Self::Output;

    /// Negates a fragment.
    fn negate(&mut self, inner: Self::Output) -> Self::Output;

    /// Output for a root with nothing present.
    fn empty(&mut self, root_operator: LogicalOperator) -> Self::Output;

    /// Renders a natural-language node nobody has interpreted yet, or `None`
    /// to leave it out.
    fn uninterpreted(&mut self, _node: &NaturalNode) -> Option<Self::Output> {
        None
    }
}

/// Runs `dialect` over the tree rooted at `root`.
pub fn generate<D: Dialect>(dialect: &mut D, root: &GroupNode) -> Generated<D::Output> {
    let mut walker = Walker {
        dialect,
        warnings: Vec::new(),
    };
    let output = match walker.group(root) {
        Some(output) => output,
        None => walker.dialect.empty(root.operator),
    };

    for warning in &walker.warnings {
        tracing::warn!(%warning, "generation fallback");
    }
    Generated {
        output,
        warnings: walker.warnings,
    }
}

struct Walker<'d, D: Dialect> {
    dialect: &'d mut D,
    warnings: Vec<GenerationWarning>,
}

impl<D: Dialect> Walker<'_, D> {
    fn node(&mut self, node: &FilterNode) -> Option<D::Output> {
        match node {
            FilterNode::Group(group) => self.group(group),
            FilterNode::Condition(condition) => condition
                .enabled
                .then(|| self.comparison(&condition.id, &condition.column_id, &condition.filter)),
            FilterNode::Formula(formula) => match formula.compiled() {
                Some(expr) => Some(self.formula(&formula.id, expr)),
                None => {
                    self.warnings.push(GenerationWarning::UncompiledFormula {
                        node_id: formula.id.clone(),
                    });
                    None
                }
            },
            FilterNode::Natural(natural) => match natural.interpreted_group() {
                Some(group) => self.group(&group),
                None => {
                    self.warnings.push(GenerationWarning::UninterpretedNatural {
                        node_id: natural.id.clone(),
                    });
                    self.dialect.uninterpreted(natural)
                }
            },
        }
    }

    fn group(&mut self, group: &GroupNode) -> Option<D::Output> {
        let operands: Vec<Option<D::Output>> =
            group.children.iter().map(|child| self.node(child)).collect();

        let combined = match (group.operator, group.compiled_logic()) {
            (LogicalOperator::Custom, Some(expr)) => self.fold(expr, &operands),
            (operator, _) => {
                let present: Vec<D::Output> = operands.into_iter().flatten().collect();
                if present.is_empty() {
                    return None;
                }
                let (effective, fell_back) = match operator {
                    LogicalOperator::Custom => (LogicalOperator::And, true),
                    other => other.effective(present.len()),
                };
                if fell_back {
                    self.warnings.push(GenerationWarning::ArityFallback {
                        group_id: group.id.clone(),
                        operator,
                    });
                }
                Some(self.dialect.combine(effective, present))
            }
        }?;

        Some(if group.negated {
            self.dialect.negate(combined)
        } else {
            combined
        })
    }

    /// Folds custom logic; absent operands drop out of their connective.
    fn fold(&mut self, expr: &LogicExpr, operands: &[Option<D::Output>]) -> Option<D::Output> {
        match expr {
            LogicExpr::Ref(index) => operands.get(*index).cloned().flatten(),
            LogicExpr::Not(inner) => {
                let inner = self.fold(inner, operands)?;
                Some(self.dialect.negate(inner))
            }
            LogicExpr::Binary(connective, left, right) => {
                match (self.fold(left, operands), self.fold(right, operands)) {
                    (Some(l), Some(r)) => Some(self.dialect.combine(connective.operator(), vec![l, r])),
                    (Some(v), None) | (None, Some(v)) => Some(v),
                    (None, None) => None,
                }
            }
        }
    }

    fn formula(&mut self, node_id: &str, expr: &FormulaExpr) -> D::Output {
        match expr {
            FormulaExpr::Compare(comparison) => {
                self.comparison(node_id, &comparison.column_id, &comparison.filter)
            }
            FormulaExpr::Not(inner) => {
                let inner = self.formula(node_id, inner);
                self.dialect.negate(inner)
            }
            FormulaExpr::And(left, right) | FormulaExpr::Or(left, right) => {
                let operator = if matches!(expr, FormulaExpr::And(..)) {
                    LogicalOperator::And
                } else {
                    LogicalOperator::Or
                };
                let operands = vec![self.formula(node_id, left), self.formula(node_id, right)];
                self.dialect.combine(operator, operands)
            }
        }
    }

    fn comparison(&mut self, node_id: &str, column_id: &str, filter: &ConditionFilter) -> D::Output {
        let operator = operators::lookup(&filter.operator);
        if let (None, Some(fallback)) = (operator, self.dialect.fallback()) {
            self.warnings.push(GenerationWarning::UnmappedOperator {
                node_id: node_id.to_string(),
                operator: filter.operator.clone(),
                fallback,
                suggestion: operators::suggest(&filter.operator),
            });
        }
        self.dialect.condition(column_id, operator, filter)
    }
}

#[cfg(test)]
mod tests;
