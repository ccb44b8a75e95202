//! SQL `WHERE` clause generation.
//!
//! Values are never inlined: every operand is a `?` placeholder for the
//! caller to bind. Operators SQL has no keyword for are lowered to
//! `AND`/`OR`/`NOT`.

use super::operators::ConditionOperator;
use super::{generate, Dialect, Generated};
use crate::node::{ConditionFilter, GroupNode};
use crate::operator::LogicalOperator;

/// A rendered predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFragment {
    text: String,
    /// Joined by `AND`/`OR`, so it needs parentheses when nested.
    compound: bool,
}

impl SqlFragment {
    fn atom(text: String) -> Self {
        Self {
            text,
            compound: false,
        }
    }

    fn nested(&self) -> String {
        if self.compound {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }

    fn join(keyword: &str, operands: &[SqlFragment]) -> Self {
        if let [single] = operands {
            return single.clone();
        }
        let text = operands
            .iter()
            .map(SqlFragment::nested)
            .collect::<Vec<_>>()
            .join(&format!(" {keyword} "));
        Self {
            text,
            compound: operands.len() > 1,
        }
    }

    fn and(operands: &[SqlFragment]) -> Self {
        Self::join("AND", operands)
    }

    fn or(operands: &[SqlFragment]) -> Self {
        Self::join("OR", operands)
    }

    fn not(&self) -> Self {
        Self::atom(format!("NOT {}", self.nested()))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Renders SQL predicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlGenerator;

impl SqlGenerator {
    /// Generates the `WHERE` clause body; an empty filter gives `""`.
    pub fn generate(root: &GroupNode) -> Generated<String> {
        generate(&mut SqlGenerator, root).map(|fragment| fragment.text)
    }
}

impl Dialect for SqlGenerator {
    type Output = SqlFragment;

    fn fallback(&self) -> Option<&'static str> {
        Some("=")
    }

    fn condition(
        &mut self,
        column_id: &str,
        operator: Option<ConditionOperator>,
        _filter: &ConditionFilter,
    ) -> SqlFragment {
        let predicate = operator.map_or("= ?", ConditionOperator::sql);
        SqlFragment::atom(format!("{column_id} {predicate}"))
    }

    fn combine(&mut self, operator: LogicalOperator, operands: Vec<SqlFragment>) -> SqlFragment {
        match (operator, operands.as_slice()) {
            (LogicalOperator::Or, _) => SqlFragment::or(&operands),
            (LogicalOperator::Not, _) => SqlFragment::and(&operands).not(),
            (LogicalOperator::Xor, [a, b]) => SqlFragment::and(&[
                SqlFragment::or(&[a.clone(), b.clone()]),
                SqlFragment::and(&[a.clone(), b.clone()]).not(),
            ]),
            (LogicalOperator::Nand, _) => SqlFragment::and(&operands).not(),
            (LogicalOperator::Nor, _) => SqlFragment::or(&operands).not(),
            (LogicalOperator::IfThen | LogicalOperator::Implies, [a, b]) => {
                SqlFragment::or(&[a.not(), b.clone()])
            }
            (LogicalOperator::Biconditional, [a, b]) => SqlFragment::or(&[
                SqlFragment::and(&[a.clone(), b.clone()]),
                SqlFragment::and(&[a.not(), b.not()]),
            ]),
            (LogicalOperator::IfThenElse, [a, b, c]) => SqlFragment::or(&[
                SqlFragment::and(&[a.clone(), b.clone()]),
                SqlFragment::and(&[a.not(), c.clone()]),
            ]),
            _ => SqlFragment::and(&operands),
        }
    }

    fn negate(&mut self, inner: SqlFragment) -> SqlFragment {
        inner.not()
    }

    fn empty(&mut self, _root_operator: LogicalOperator) -> SqlFragment {
        SqlFragment::atom(String::new())
    }
}
