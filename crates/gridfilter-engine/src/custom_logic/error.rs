//! Error types for custom logic expressions.

use thiserror::Error;

/// A specialized Result type for custom logic parsing.
pub type LogicResult<T> = Result<T, LogicError>;

/// Errors that can occur while validating or parsing custom logic.
///
/// These are meant for inline display next to the expression being edited;
/// the text the user typed is never discarded because of them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogicError {
    /// The expression is empty or whitespace only.
    #[error("custom logic is empty")]
    EmptyExpression,

    /// A character outside the accepted alphabet was found.
    #[error("invalid character '{character}' at position {position}")]
    InvalidCharacter {
        /// The offending character.
        character: char,
        /// Byte offset of the character in the input.
        position: usize,
    },

    /// A `(` was never closed.
    #[error("unmatched opening parenthesis")]
    UnmatchedOpeningParen,

    /// A `)` appeared without a matching `(`.
    #[error("unmatched closing parenthesis at position {position}")]
    UnmatchedClosingParen {
        /// Byte offset of the closing parenthesis.
        position: usize,
    },

    /// A letter refers to a child the group does not have.
    #[error("reference {reference} is undefined: the group has {child_count} children")]
    UndefinedReference {
        /// The position letter that was referenced.
        reference: char,
        /// Number of children of the group.
        child_count: usize,
    },

    /// A token appeared where it is not allowed.
    #[error("unexpected token: {token}")]
    UnexpectedToken {
        /// Display form of the token.
        token: String,
    },

    /// The expression ended while an operand was still expected.
    #[error("unexpected end of expression")]
    UnexpectedEndOfInput,

    /// Parentheses and `NOT`s are nested deeper than the parser accepts.
    #[error("expression is nested more than {limit} levels deep")]
    NestingTooDeep {
        /// Deepest nesting accepted.
        limit: usize,
    },

    /// The expression has more tokens than the parser accepts.
    #[error("expression has more than {limit} tokens")]
    ExpressionTooLong {
        /// Largest token count accepted.
        limit: usize,
    },
}

impl LogicError {
    /// Creates an unexpected token error.
    pub fn unexpected_token(token: impl Into<String>) -> Self {
        LogicError::UnexpectedToken {
            token: token.into(),
        }
    }
}
