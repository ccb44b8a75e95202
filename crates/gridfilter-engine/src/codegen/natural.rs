//! Plain-English restatement of a filter.

use super::operators::ConditionOperator;
use super::{generate, Dialect, Generated};
use crate::node::{ConditionFilter, FilterValue, GroupNode, NaturalNode};
use crate::operator::LogicalOperator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    text: String,
    compound: bool,
}

impl Phrase {
    fn atom(text: String) -> Self {
        Self {
            text,
            compound: false,
        }
    }

    fn compound(text: String) -> Self {
        Self {
            text,
            compound: true,
        }
    }

    fn nested(&self) -> String {
        if self.compound {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Renders natural-language descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalLanguageGenerator;

impl NaturalLanguageGenerator {
    /// Describes the filter; an empty filter gives `""`.
    pub fn generate(root: &GroupNode) -> Generated<String> {
        generate(&mut NaturalLanguageGenerator, root).map(|phrase| phrase.text)
    }
}

fn describe_value(operator: Option<ConditionOperator>, value: &FilterValue) -> String {
    match (operator, value) {
        (Some(ConditionOperator::Between), FilterValue::Set(bounds)) if bounds.len() == 2 => {
            format!("{} and {}", bounds[0], bounds[1])
        }
        _ => value.to_string(),
    }
}

impl Dialect for NaturalLanguageGenerator {
    type Output = Phrase;

    fn fallback(&self) -> Option<&'static str> {
        None
    }

    fn condition(
        &mut self,
        column_id: &str,
        operator: Option<ConditionOperator>,
        filter: &ConditionFilter,
    ) -> Phrase {
        let phrase = operator.map_or(filter.operator.as_str(), |op| op.phrase());
        if operator.is_some_and(ConditionOperator::is_unary) {
            return Phrase::atom(format!("{column_id} {phrase}"));
        }
        Phrase::atom(format!(
            "{column_id} {phrase} {}",
            describe_value(operator, &filter.value)
        ))
    }

    fn combine(&mut self, operator: LogicalOperator, operands: Vec<Phrase>) -> Phrase {
        if let [single] = operands.as_slice() {
            if operator != LogicalOperator::Not {
                return single.clone();
            }
        }
        let parts: Vec<String> = operands.iter().map(Phrase::nested).collect();
        match (operator, parts.as_slice()) {
            (LogicalOperator::And, _) => Phrase::compound(parts.join(" and ")),
            (LogicalOperator::Or, _) => Phrase::compound(parts.join(" or ")),
            (LogicalOperator::Not, _) => {
                let inner = self.combine(LogicalOperator::And, operands);
                self.negate(inner)
            }
            (LogicalOperator::IfThen, [a, b]) => Phrase::compound(format!("if {a} then {b}")),
            (LogicalOperator::IfThenElse, [a, b, c]) => {
                Phrase::compound(format!("if {a} then {b}, otherwise {c}"))
            }
            (LogicalOperator::Biconditional, [a, b]) => {
                Phrase::compound(format!("{a} if and only if {b}"))
            }
            (other, _) => {
                let word = other.as_str().to_ascii_lowercase().replace('_', " ");
                Phrase::compound(parts.join(&format!(" {word} ")))
            }
        }
    }

    fn negate(&mut self, inner: Phrase) -> Phrase {
        Phrase::atom(format!("not {}", inner.nested()))
    }

    fn empty(&mut self, _root_operator: LogicalOperator) -> Phrase {
        Phrase::atom(String::new())
    }

    fn uninterpreted(&mut self, node: &NaturalNode) -> Option<Phrase> {
        Some(Phrase::atom(format!("\"{}\"", node.query)))
    }
}
