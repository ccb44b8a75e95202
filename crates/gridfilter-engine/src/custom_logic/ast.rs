//! Parse tree for custom logic expressions.

use std::collections::BTreeSet;
use std::fmt;

use crate::operator::LogicalOperator;

/// Binary connectives available in custom logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    /// `AND`, `&`, `&&`, `∧`
    And,
    /// `OR`, `|`, `||`, `∨`
    Or,
    /// `⊕`
    Xor,
    /// `⊼`
    Nand,
    /// `⊽`
    Nor,
    /// `->`, `→`, `⇒`
    Implies,
    /// `<->`, `↔`, `⇔`
    Iff,
}

impl Connective {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Connective::Iff => 1,
            Connective::Implies => 2,
            Connective::Or | Connective::Nor => 3,
            Connective::Xor => 4,
            Connective::And | Connective::Nand => 5,
        }
    }

    /// Implication groups to the right; everything else to the left.
    pub fn is_right_associative(self) -> bool {
        matches!(self, Connective::Implies)
    }

    /// Applies the connective to two values.
    pub fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Connective::And => left && right,
            Connective::Or => left || right,
            Connective::Xor => left != right,
            Connective::Nand => !(left && right),
            Connective::Nor => !(left || right),
            Connective::Implies => !left || right,
            Connective::Iff => left == right,
        }
    }

    /// The group operator with the same truth table.
    pub fn operator(self) -> LogicalOperator {
        match self {
            Connective::And => LogicalOperator::And,
            Connective::Or => LogicalOperator::Or,
            Connective::Xor => LogicalOperator::Xor,
            Connective::Nand => LogicalOperator::Nand,
            Connective::Nor => LogicalOperator::Nor,
            Connective::Implies => LogicalOperator::Implies,
            Connective::Iff => LogicalOperator::Biconditional,
        }
    }

    /// Canonical display symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Xor => "⊕",
            Connective::Nand => "⊼",
            Connective::Nor => "⊽",
            Connective::Implies => "→",
            Connective::Iff => "↔",
        }
    }
}

/// A compiled custom logic expression.
///
/// References are zero-based child positions: `A` is `Ref(0)`, `B` is `Ref(1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicExpr {
    /// A reference to the child at this position.
    Ref(usize),

    /// Logical NOT.
    Not(Box<LogicExpr>),

    /// A binary connective.
    Binary(Connective, Box<LogicExpr>, Box<LogicExpr>),
}

impl LogicExpr {
    /// Creates a reference from a position letter (`'A'` -> 0).
    pub fn letter(letter: char) -> Self {
        LogicExpr::Ref(letter_index(letter))
    }

    /// Creates an AND of two expressions.
    pub fn and(left: LogicExpr, right: LogicExpr) -> Self {
        Self::binary(Connective::And, left, right)
    }

    /// Creates an OR of two expressions.
    pub fn or(left: LogicExpr, right: LogicExpr) -> Self {
        Self::binary(Connective::Or, left, right)
    }

    /// Creates a NOT of an expression.
    pub fn negate(inner: LogicExpr) -> Self {
        LogicExpr::Not(Box::new(inner))
    }

    /// Creates a binary expression.
    pub fn binary(connective: Connective, left: LogicExpr, right: LogicExpr) -> Self {
        LogicExpr::Binary(connective, Box::new(left), Box::new(right))
    }

    /// Returns the set of child positions referenced by the expression.
    pub fn references(&self) -> BTreeSet<usize> {
        let mut refs = BTreeSet::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut BTreeSet<usize>) {
        match self {
            LogicExpr::Ref(index) => {
                refs.insert(*index);
            }
            LogicExpr::Not(inner) => inner.collect_references(refs),
            LogicExpr::Binary(_, left, right) => {
                left.collect_references(refs);
                right.collect_references(refs);
            }
        }
    }

    /// Evaluates the expression over child values.
    ///
    /// `None` marks an absent operand (for example a disabled condition). An
    /// absent operand is dropped from its connective, so `A AND B` with `B`
    /// absent is just `A`; `NOT` of an absent operand stays absent.
    pub fn evaluate(&self, operands: &[Option<bool>]) -> Option<bool> {
        match self {
            LogicExpr::Ref(index) => operands.get(*index).copied().flatten(),
            LogicExpr::Not(inner) => inner.evaluate(operands).map(|v| !v),
            LogicExpr::Binary(connective, left, right) => {
                match (left.evaluate(operands), right.evaluate(operands)) {
                    (Some(l), Some(r)) => Some(connective.apply(l, r)),
                    (Some(v), None) | (None, Some(v)) => Some(v),
                    (None, None) => None,
                }
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            LogicExpr::Binary(connective, _, _) => connective.precedence(),
            LogicExpr::Ref(_) | LogicExpr::Not(_) => u8::MAX,
        }
    }
}

/// Converts a position letter to a zero-based index.
pub fn letter_index(letter: char) -> usize {
    (letter as usize).saturating_sub('A' as usize)
}

/// Converts a zero-based index to its position letter, if it has one.
pub fn index_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| (b'A' + i) as char)
}

impl fmt::Display for LogicExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicExpr::Ref(index) => match index_letter(*index) {
                Some(letter) => write!(f, "{letter}"),
                None => write!(f, "#{index}"),
            },
            LogicExpr::Not(inner) => {
                if matches!(**inner, LogicExpr::Binary(..)) {
                    write!(f, "NOT ({inner})")
                } else {
                    write!(f, "NOT {inner}")
                }
            }
            LogicExpr::Binary(connective, left, right) => {
                let p = connective.precedence();
                let right_assoc = connective.is_right_associative();
                let left_parens =
                    left.precedence() < p || (left.precedence() == p && right_assoc);
                let right_parens =
                    right.precedence() < p || (right.precedence() == p && !right_assoc);

                if left_parens {
                    write!(f, "({left})")?;
                } else {
                    write!(f, "{left}")?;
                }
                write!(f, " {} ", connective.symbol())?;
                if right_parens {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_conversions() {
        assert_eq!(letter_index('A'), 0);
        assert_eq!(letter_index('C'), 2);
        assert_eq!(index_letter(0), Some('A'));
        assert_eq!(index_letter(25), Some('Z'));
        assert_eq!(index_letter(26), None);
    }

    #[test]
    fn test_references() {
        let expr = LogicExpr::and(
            LogicExpr::letter('A'),
            LogicExpr::or(LogicExpr::letter('C'), LogicExpr::letter('A')),
        );
        let refs: Vec<usize> = expr.references().into_iter().collect();
        assert_eq!(refs, vec![0, 2]);
    }

    #[test]
    fn test_evaluate_with_absent_operand() {
        let expr = LogicExpr::and(LogicExpr::letter('A'), LogicExpr::letter('B'));
        assert_eq!(expr.evaluate(&[Some(true), Some(false)]), Some(false));
        assert_eq!(expr.evaluate(&[Some(true), None]), Some(true));
        assert_eq!(expr.evaluate(&[None, None]), None);

        let not = LogicExpr::negate(LogicExpr::letter('A'));
        assert_eq!(not.evaluate(&[None]), None);
        assert_eq!(not.evaluate(&[Some(false)]), Some(true));
    }

    #[test]
    fn test_display_minimal_parens() {
        let expr = LogicExpr::and(
            LogicExpr::letter('A'),
            LogicExpr::or(LogicExpr::letter('B'), LogicExpr::letter('C')),
        );
        assert_eq!(expr.to_string(), "A AND (B OR C)");

        let chained = LogicExpr::and(
            LogicExpr::and(LogicExpr::letter('A'), LogicExpr::letter('B')),
            LogicExpr::letter('C'),
        );
        assert_eq!(chained.to_string(), "A AND B AND C");

        let negated = LogicExpr::negate(LogicExpr::or(
            LogicExpr::letter('A'),
            LogicExpr::letter('B'),
        ));
        assert_eq!(negated.to_string(), "NOT (A OR B)");
    }

    #[test]
    fn test_display_exotic_glyphs() {
        let expr = LogicExpr::binary(
            Connective::Implies,
            LogicExpr::letter('A'),
            LogicExpr::binary(Connective::Xor, LogicExpr::letter('B'), LogicExpr::letter('C')),
        );
        assert_eq!(expr.to_string(), "A → B ⊕ C");
    }
}
