//! Compiler for formula node text.
//!
//! Formulas are comparisons of a column against a literal, combined with
//! boolean keywords:
//!
//! ```text
//! formula    ::= or_expr
//! or_expr    ::= and_expr ("OR" and_expr)*
//! and_expr   ::= unary_expr ("AND" unary_expr)*
//! unary_expr ::= "NOT" unary_expr | primary
//! primary    ::= "(" formula ")" | column op literal
//! op         ::= "=" | "==" | "!=" | "<>" | ">" | ">=" | "<" | "<=" | "~"
//! literal    ::= number | "'" text "'" | '"' text '"' | "true" | "false"
//! ```
//!
//! Keywords are case-insensitive. Each comparison compiles to the same
//! [`ConditionFilter`] a condition node would carry, so formulas evaluate and
//! generate through the regular condition operator tables.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

use crate::node::{ConditionFilter, FilterValue};

/// A specialized Result type for formula compilation.
pub type FormulaResult<T> = Result<T, FormulaError>;

/// Errors that can occur while compiling a formula.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormulaError {
    /// The formula is blank.
    #[error("formula is empty")]
    Empty,

    /// A character that starts no token.
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        character: char,
        /// Byte offset of the character.
        position: usize,
    },

    /// A quoted literal was not closed.
    #[error("unterminated string starting at position {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// A token in the wrong place.
    #[error("unexpected token: {token}")]
    UnexpectedToken {
        /// Display form of the token.
        token: String,
    },

    /// The formula ended early.
    #[error("unexpected end of formula")]
    UnexpectedEnd,

    /// Parentheses and `not`s are nested too deeply.
    #[error("formula is nested more than {limit} levels deep")]
    TooDeep {
        /// Deepest nesting accepted.
        limit: usize,
    },

    /// The formula has too many tokens.
    #[error("formula has more than {limit} tokens")]
    TooLong {
        /// Largest token count accepted.
        limit: usize,
    },
}

/// One `column op literal` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Column identifier on the left-hand side.
    pub column_id: String,
    /// Operator and literal, as a condition would carry them.
    pub filter: ConditionFilter,
}

/// A compiled formula.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// A single comparison.
    Compare(Comparison),
    /// Logical NOT.
    Not(Box<FormulaExpr>),
    /// Logical AND.
    And(Box<FormulaExpr>, Box<FormulaExpr>),
    /// Logical OR.
    Or(Box<FormulaExpr>, Box<FormulaExpr>),
}

impl FormulaExpr {
    /// Visits every comparison in document order.
    pub fn comparisons(&self) -> Vec<&Comparison> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Comparison>) {
        match self {
            FormulaExpr::Compare(c) => out.push(c),
            FormulaExpr::Not(inner) => inner.collect(out),
            FormulaExpr::And(l, r) | FormulaExpr::Or(l, r) => {
                l.collect(out);
                r.collect(out);
            }
        }
    }
}

/// Compiles formula text.
///
/// # Errors
///
/// Returns a [`FormulaError`] describing the first problem found.
pub fn compile(input: &str) -> FormulaResult<FormulaExpr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    if tokens.len() > MAX_TOKENS {
        return Err(FormulaError::TooLong { limit: MAX_TOKENS });
    }

    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(FormulaError::UnexpectedToken {
            token: token.describe(),
        });
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Text(String),
    Number(f64),
    Bool(bool),
    Op(&'static str),
    And,
    Or,
    Not,
    OpenParen,
    CloseParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::Text(s) => format!("'{s}'"),
            Token::Number(n) => n.to_string(),
            Token::Bool(b) => b.to_string(),
            Token::Op(op) => (*op).to_string(),
            Token::And => "AND".to_string(),
            Token::Or => "OR".to_string(),
            Token::Not => "NOT".to_string(),
            Token::OpenParen => "(".to_string(),
            Token::CloseParen => ")".to_string(),
        }
    }
}

/// Maps a comparison symbol to its condition operator name.
fn operator_name(symbol: &str) -> &'static str {
    match symbol {
        "!=" | "<>" => "notEquals",
        ">" => "greaterThan",
        ">=" => "greaterThanOrEqual",
        "<" => "lessThan",
        "<=" => "lessThanOrEqual",
        "~" => "contains",
        _ => "equals",
    }
}

fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    let mut chars: Peekable<CharIndices<'_>> = input.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        match c {
            '(' => {
                chars.next();
                tokens.push(Token::OpenParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::CloseParen);
            }
            '\'' | '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    if ch == c {
                        closed = true;
                        break;
                    }
                    if ch == '\\' {
                        if let Some((_, escaped)) = chars.next() {
                            text.push(escaped);
                        }
                    } else {
                        text.push(ch);
                    }
                }
                if !closed {
                    return Err(FormulaError::UnterminatedString { position });
                }
                tokens.push(Token::Text(text));
            }
            '=' | '!' | '<' | '>' | '~' => {
                chars.next();
                let next = chars.peek().map(|(_, ch)| *ch);
                let symbol = match (c, next) {
                    ('=', Some('=')) => {
                        chars.next();
                        "=="
                    }
                    ('!', Some('=')) => {
                        chars.next();
                        "!="
                    }
                    ('<', Some('>')) => {
                        chars.next();
                        "<>"
                    }
                    ('<', Some('=')) => {
                        chars.next();
                        "<="
                    }
                    ('>', Some('=')) => {
                        chars.next();
                        ">="
                    }
                    ('=', _) => "=",
                    ('<', _) => "<",
                    ('>', _) => ">",
                    ('~', _) => "~",
                    _ => {
                        return Err(FormulaError::UnexpectedCharacter {
                            character: c,
                            position,
                        })
                    }
                };
                tokens.push(Token::Op(symbol));
            }
            _ if c.is_ascii_digit() || c == '-' => {
                let mut literal = String::new();
                literal.push(c);
                chars.next();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        literal.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| FormulaError::UnexpectedCharacter {
                        character: c,
                        position,
                    })?;
                tokens.push(Token::Number(number));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                        word.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    _ => Token::Ident(word),
                };
                tokens.push(token);
            }
            _ => {
                return Err(FormulaError::UnexpectedCharacter {
                    character: c,
                    position,
                })
            }
        }
    }

    Ok(tokens)
}

const MAX_NESTING: usize = 256;
const MAX_TOKENS: usize = 1024;

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Open parentheses and pending `not`s on the current path.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn descend(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(FormulaError::TooDeep { limit: MAX_NESTING });
        }
        Ok(())
    }

    fn parse_or(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = FormulaExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_unary()?;
            left = FormulaExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(FormulaExpr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.advance().ok_or(FormulaError::UnexpectedEnd)? {
            Token::OpenParen => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token::CloseParen) => Ok(inner),
                    Some(other) => Err(FormulaError::UnexpectedToken {
                        token: other.describe(),
                    }),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            Token::Ident(column_id) => {
                let symbol = match self.advance().ok_or(FormulaError::UnexpectedEnd)? {
                    Token::Op(symbol) => symbol,
                    other => {
                        return Err(FormulaError::UnexpectedToken {
                            token: other.describe(),
                        })
                    }
                };
                let value = match self.advance().ok_or(FormulaError::UnexpectedEnd)? {
                    Token::Text(text) => FilterValue::Text(text),
                    Token::Number(n) => FilterValue::Number(n),
                    Token::Bool(b) => FilterValue::Boolean(b),
                    other => {
                        return Err(FormulaError::UnexpectedToken {
                            token: other.describe(),
                        })
                    }
                };
                Ok(FormulaExpr::Compare(Comparison {
                    column_id,
                    filter: ConditionFilter::new(operator_name(symbol), value),
                }))
            }
            other => Err(FormulaError::UnexpectedToken {
                token: other.describe(),
            }),
        }
    }
}
