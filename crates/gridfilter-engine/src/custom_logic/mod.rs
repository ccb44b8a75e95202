//! Custom logic expressions for `CUSTOM` groups.
//!
//! A custom expression combines a group's children by position letter: `A`
//! is the first child, `B` the second, and so on in document order.
//!
//! # Supported Syntax
//!
//! - `A`..`Z` - child references
//! - `AND`, `&`, `&&`, `∧` - conjunction
//! - `OR`, `|`, `||`, `∨` - disjunction
//! - `NOT`, `!`, `-`, `¬` - negation
//! - `⊕` XOR, `⊼` NAND, `⊽` NOR
//! - `->`, `→`, `⇒` implication; `<->`, `↔`, `⇔` equivalence
//! - `()` - grouping
//!
//! # Example
//!
//! ```
//! use gridfilter_engine::custom_logic::{compile, validate, LogicError};
//!
//! let expr = compile("A AND (B OR C)", 3).unwrap();
//! assert_eq!(expr.evaluate(&[Some(true), Some(false), Some(true)]), Some(true));
//!
//! assert!(validate("A AND (B OR B)", 2).valid);
//! assert_eq!(compile("A AND (B", 2), Err(LogicError::UnmatchedOpeningParen));
//! ```

mod ast;
mod error;
mod lexer;
mod parser;

use serde::{Deserialize, Serialize};

pub use ast::{index_letter, letter_index, Connective, LogicExpr};
pub use error::{LogicError, LogicResult};
pub use lexer::{Lexer, LexerResult, LogicToken, PositionedToken};
pub use parser::LogicParser;

/// Deepest combined nesting of parentheses and `NOT` chains.
pub const MAX_NESTING: usize = 256;

/// Most tokens one expression may hold.
pub const MAX_TOKENS: usize = 1024;

/// Outcome of validating a custom logic string, ready for inline display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the expression is valid for the group.
    pub valid: bool,
    /// Human-readable reason when invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    /// A failing result carrying the error's message.
    pub fn invalid(error: &LogicError) -> Self {
        Self {
            valid: false,
            message: Some(error.to_string()),
        }
    }
}

impl<T> From<&LogicResult<T>> for ValidationResult {
    fn from(result: &LogicResult<T>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => Self::invalid(e),
        }
    }
}

/// Compiles custom logic for a group with `child_count` children.
///
/// Validation runs in a fixed order: characters, parenthesis balance,
/// grammar, then references.
///
/// # Errors
///
/// - `LogicError::EmptyExpression` for blank input.
/// - `LogicError::InvalidCharacter` for the first character outside the
///   accepted alphabet.
/// - `LogicError::UnmatchedClosingParen` / `LogicError::UnmatchedOpeningParen`
///   for unbalanced parentheses.
/// - `LogicError::NestingTooDeep` past [`MAX_NESTING`] and
///   `LogicError::ExpressionTooLong` past [`MAX_TOKENS`].
/// - `LogicError::UnexpectedToken` / `LogicError::UnexpectedEndOfInput` for
///   grammar errors.
/// - `LogicError::UndefinedReference` for a letter past the last child.
pub fn compile(input: &str, child_count: usize) -> LogicResult<LogicExpr> {
    if input.trim().is_empty() {
        return Err(LogicError::EmptyExpression);
    }

    let lexed = Lexer::new(input).tokenize_with_errors();
    if let Some(error) = lexed.errors.first() {
        return Err(LogicError::InvalidCharacter {
            character: error.character,
            position: error.position,
        });
    }

    check_balance(&lexed.tokens)?;
    if lexed.tokens.len() > MAX_TOKENS {
        return Err(LogicError::ExpressionTooLong { limit: MAX_TOKENS });
    }

    let expr = LogicParser::parse_tokens(lexed.tokens)?;

    if let Some(&index) = expr.references().iter().find(|i| **i >= child_count) {
        return Err(LogicError::UndefinedReference {
            reference: index_letter(index).unwrap_or('?'),
            child_count,
        });
    }

    Ok(expr)
}

/// Validates custom logic without keeping the compiled form.
pub fn validate(input: &str, child_count: usize) -> ValidationResult {
    ValidationResult::from(&compile(input, child_count))
}

/// Running-counter parenthesis check, also bounding how deep the parser
/// will recurse.
fn check_balance(tokens: &[PositionedToken]) -> LogicResult<()> {
    let mut depth: usize = 0;
    let mut negations: usize = 0;
    for pt in tokens {
        match pt.token {
            LogicToken::OpenParen => depth += 1,
            LogicToken::CloseParen => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(LogicError::UnmatchedClosingParen {
                        position: pt.position,
                    })?;
            }
            _ => {}
        }
        // A run of NOTs nests like parentheses do; any operand ends it.
        match pt.token {
            LogicToken::Not => negations += 1,
            LogicToken::OpenParen => {}
            _ => negations = 0,
        }
        if depth + negations > MAX_NESTING {
            return Err(LogicError::NestingTooDeep { limit: MAX_NESTING });
        }
    }

    if depth > 0 {
        return Err(LogicError::UnmatchedOpeningParen);
    }
    Ok(())
}
