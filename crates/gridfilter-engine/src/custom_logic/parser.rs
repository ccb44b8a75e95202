//! Recursive descent parser for custom logic expressions.

use super::ast::{Connective, LogicExpr};
use super::error::{LogicError, LogicResult};
use super::lexer::{LogicToken, PositionedToken};

/// Parser over a validated token stream.
///
/// # Grammar
///
/// ```text
/// expression  ::= iff_expr
/// iff_expr    ::= imp_expr ("↔" imp_expr)*
/// imp_expr    ::= or_expr ("→" imp_expr)?
/// or_expr     ::= xor_expr (("OR" | "⊽") xor_expr)*
/// xor_expr    ::= and_expr ("⊕" and_expr)*
/// and_expr    ::= unary_expr (("AND" | "⊼") unary_expr)*
/// unary_expr  ::= "NOT" unary_expr | primary
/// primary     ::= "(" expression ")" | letter
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. `NOT`
/// 2. `AND`, `⊼`
/// 3. `⊕`
/// 4. `OR`, `⊽`
/// 5. `→` (right-associative)
/// 6. `↔`
pub struct LogicParser {
    tokens: Vec<LogicToken>,
    position: usize,
}

impl LogicParser {
    /// Parses a token stream into a [`LogicExpr`].
    ///
    /// # Errors
    ///
    /// Returns `LogicError::EmptyExpression` if there are no tokens,
    /// `LogicError::UnexpectedToken` for a misplaced token and
    /// `LogicError::UnexpectedEndOfInput` if an operand is missing.
    pub fn parse_tokens(tokens: Vec<PositionedToken>) -> LogicResult<LogicExpr> {
        if tokens.is_empty() {
            return Err(LogicError::EmptyExpression);
        }

        let mut parser = Self {
            tokens: tokens.into_iter().map(|pt| pt.token).collect(),
            position: 0,
        };
        let expr = parser.parse_expression()?;

        if let Some(remaining) = parser.peek() {
            return Err(LogicError::unexpected_token(remaining.describe()));
        }

        Ok(expr)
    }

    fn peek(&self) -> Option<&LogicToken> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&LogicToken> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn check(&self, expected: &LogicToken) -> bool {
        self.peek() == Some(expected)
    }

    fn parse_expression(&mut self) -> LogicResult<LogicExpr> {
        self.parse_iff_expr()
    }

    fn parse_iff_expr(&mut self) -> LogicResult<LogicExpr> {
        let mut left = self.parse_implies_expr()?;

        while self.check(&LogicToken::Iff) {
            self.advance();
            let right = self.parse_implies_expr()?;
            left = LogicExpr::binary(Connective::Iff, left, right);
        }

        Ok(left)
    }

    fn parse_implies_expr(&mut self) -> LogicResult<LogicExpr> {
        let left = self.parse_or_expr()?;

        if self.check(&LogicToken::Implies) {
            self.advance();
            let right = self.parse_implies_expr()?;
            return Ok(LogicExpr::binary(Connective::Implies, left, right));
        }

        Ok(left)
    }

    fn parse_or_expr(&mut self) -> LogicResult<LogicExpr> {
        let mut left = self.parse_xor_expr()?;

        loop {
            let connective = match self.peek() {
                Some(LogicToken::Or) => Connective::Or,
                Some(LogicToken::Nor) => Connective::Nor,
                _ => break,
            };
            self.advance();
            let right = self.parse_xor_expr()?;
            left = LogicExpr::binary(connective, left, right);
        }

        Ok(left)
    }

    fn parse_xor_expr(&mut self) -> LogicResult<LogicExpr> {
        let mut left = self.parse_and_expr()?;

        while self.check(&LogicToken::Xor) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = LogicExpr::binary(Connective::Xor, left, right);
        }

        Ok(left)
    }

    fn parse_and_expr(&mut self) -> LogicResult<LogicExpr> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let connective = match self.peek() {
                Some(LogicToken::And) => Connective::And,
                Some(LogicToken::Nand) => Connective::Nand,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = LogicExpr::binary(connective, left, right);
        }

        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> LogicResult<LogicExpr> {
        if self.check(&LogicToken::Not) {
            self.advance();
            let inner = self.parse_unary_expr()?;
            return Ok(LogicExpr::negate(inner));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> LogicResult<LogicExpr> {
        let token = self
            .advance()
            .cloned()
            .ok_or(LogicError::UnexpectedEndOfInput)?;

        match token {
            LogicToken::OpenParen => {
                let inner = self.parse_expression()?;
                match self.advance() {
                    Some(LogicToken::CloseParen) => Ok(inner),
                    Some(other) => Err(LogicError::unexpected_token(other.describe())),
                    None => Err(LogicError::UnmatchedOpeningParen),
                }
            }
            LogicToken::Ref(letter) => Ok(LogicExpr::letter(letter)),
            other => Err(LogicError::unexpected_token(other.describe())),
        }
    }
}
