//! Logical operator algebra for group nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of operators a group node can combine its children with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalOperator {
    /// All children true.
    And,
    /// Any child true.
    Or,
    /// Children combined with AND, then negated.
    Not,
    /// Exactly one of two children true.
    Xor,
    /// `NOT(c1 AND c2)`.
    Nand,
    /// `NOT(c1 OR c2)`.
    Nor,
    /// `c1 => c2`.
    IfThen,
    /// `c1 ? c2 : c3`.
    IfThenElse,
    /// Same truth table as [`LogicalOperator::IfThen`], worded differently.
    Implies,
    /// `c1 == c2`.
    Biconditional,
    /// A user-authored expression over the group's children.
    Custom,
}

/// How many children an operator requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// The group must have exactly this many children.
    Exactly(usize),
    /// Any number of children is structurally acceptable.
    Any,
}

impl Arity {
    /// Returns true if `count` children satisfy this arity.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => n == count,
            Arity::Any => true,
        }
    }
}

impl LogicalOperator {
    /// Every operator, in declaration order.
    pub const ALL: [LogicalOperator; 11] = [
        LogicalOperator::And,
        LogicalOperator::Or,
        LogicalOperator::Not,
        LogicalOperator::Xor,
        LogicalOperator::Nand,
        LogicalOperator::Nor,
        LogicalOperator::IfThen,
        LogicalOperator::IfThenElse,
        LogicalOperator::Implies,
        LogicalOperator::Biconditional,
        LogicalOperator::Custom,
    ];

    /// Returns the child-count rule for this operator.
    ///
    /// `AND` and `OR` are nominally "2 or more", but a group is allowed to hold
    /// fewer while it is being built up; the complexity report flags those.
    pub fn arity(self) -> Arity {
        match self {
            LogicalOperator::Xor
            | LogicalOperator::Nand
            | LogicalOperator::Nor
            | LogicalOperator::IfThen
            | LogicalOperator::Implies
            | LogicalOperator::Biconditional => Arity::Exactly(2),
            LogicalOperator::IfThenElse => Arity::Exactly(3),
            LogicalOperator::And
            | LogicalOperator::Or
            | LogicalOperator::Not
            | LogicalOperator::Custom => Arity::Any,
        }
    }

    /// The wire name (`AND`, `IF_THEN`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::Not => "NOT",
            LogicalOperator::Xor => "XOR",
            LogicalOperator::Nand => "NAND",
            LogicalOperator::Nor => "NOR",
            LogicalOperator::IfThen => "IF_THEN",
            LogicalOperator::IfThenElse => "IF_THEN_ELSE",
            LogicalOperator::Implies => "IMPLIES",
            LogicalOperator::Biconditional => "BICONDITIONAL",
            LogicalOperator::Custom => "CUSTOM",
        }
    }

    /// Parses a wire name, case-insensitively. Dashes and spaces are accepted
    /// in place of underscores (`if-then`, `if then`).
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|op| op.as_str() == normalized)
    }

    /// Combines already-evaluated child values.
    ///
    /// Returns `None` when the values do not fit the operator's arity or when
    /// the operator is [`LogicalOperator::Custom`], which is evaluated from its
    /// parsed expression instead.
    pub fn combine(self, values: &[bool]) -> Option<bool> {
        if !self.arity().accepts(values.len()) {
            return None;
        }

        match self {
            LogicalOperator::And => Some(values.iter().all(|v| *v)),
            LogicalOperator::Or => Some(values.iter().any(|v| *v)),
            LogicalOperator::Not => Some(!values.iter().all(|v| *v)),
            LogicalOperator::Xor => Some(values[0] != values[1]),
            LogicalOperator::Nand => Some(!(values[0] && values[1])),
            LogicalOperator::Nor => Some(!(values[0] || values[1])),
            LogicalOperator::IfThen | LogicalOperator::Implies => Some(!values[0] || values[1]),
            LogicalOperator::IfThenElse => Some(if values[0] { values[1] } else { values[2] }),
            LogicalOperator::Biconditional => Some(values[0] == values[1]),
            LogicalOperator::Custom => None,
        }
    }

    /// The operator to apply when only `present` operands are left after
    /// absent ones (disabled conditions, empty groups) are dropped.
    ///
    /// A fixed-arity operator that does not get its operand count falls back
    /// to AND; the flag reports the fallback.
    pub fn effective(self, present: usize) -> (LogicalOperator, bool) {
        match self.arity() {
            Arity::Exactly(n) if n != present => (LogicalOperator::And, true),
            _ => (self, false),
        }
    }

    /// Returns true for operators outside plain AND/OR/NOT.
    pub fn is_exotic(self) -> bool {
        !matches!(
            self,
            LogicalOperator::And | LogicalOperator::Or | LogicalOperator::Not
        )
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
