//! Lexer for custom logic expressions.

use std::iter::Peekable;
use std::str::CharIndices;

/// A character the lexer could not place in any token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    /// The character that could not be tokenized.
    pub character: char,
    /// Byte offset of the character.
    pub position: usize,
}

/// Output of [`Lexer::tokenize_with_errors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerResult {
    /// Tokens recognised, in input order.
    pub tokens: Vec<PositionedToken>,
    /// Characters that were skipped as invalid.
    pub errors: Vec<LexerError>,
}

/// A token with its byte offset in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: LogicToken,
    /// Byte offset where the token starts.
    pub position: usize,
}

/// A token in a custom logic expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicToken {
    /// A single position letter (`A`, `B`, ...).
    Ref(char),
    /// A run of several uppercase letters that is not a keyword.
    Word(String),
    /// `AND`, `&`, `&&`, `∧`
    And,
    /// `OR`, `|`, `||`, `∨`
    Or,
    /// `NOT`, `!`, `-`, `¬`
    Not,
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
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
}

impl LogicToken {
    /// Display form used in error messages.
    pub fn describe(&self) -> String {
        match self {
            LogicToken::Ref(c) => c.to_string(),
            LogicToken::Word(w) => w.clone(),
            LogicToken::And => "AND".to_string(),
            LogicToken::Or => "OR".to_string(),
            LogicToken::Not => "NOT".to_string(),
            LogicToken::Xor => "⊕".to_string(),
            LogicToken::Nand => "⊼".to_string(),
            LogicToken::Nor => "⊽".to_string(),
            LogicToken::Implies => "→".to_string(),
            LogicToken::Iff => "↔".to_string(),
            LogicToken::OpenParen => "(".to_string(),
            LogicToken::CloseParen => ")".to_string(),
        }
    }
}

/// Lexer for custom logic expressions.
pub struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    errors: Vec<LexerError>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            errors: Vec::new(),
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    /// Consumes the next character if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    /// Reads a run of uppercase ASCII letters.
    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_ascii_uppercase() {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        word
    }

    /// Returns the next token, or None at end of input.
    ///
    /// Invalid characters are recorded and skipped.
    pub fn next_token(&mut self) -> Option<PositionedToken> {
        loop {
            self.skip_whitespace();

            let (position, c) = *self.chars.peek()?;

            let token = match c {
                'A'..='Z' => {
                    let word = self.read_word();
                    match word.as_str() {
                        "AND" => LogicToken::And,
                        "OR" => LogicToken::Or,
                        "NOT" => LogicToken::Not,
                        _ if word.len() == 1 => LogicToken::Ref(c),
                        _ => LogicToken::Word(word),
                    }
                }
                '(' => {
                    self.chars.next();
                    LogicToken::OpenParen
                }
                ')' => {
                    self.chars.next();
                    LogicToken::CloseParen
                }
                '&' => {
                    self.chars.next();
                    self.eat('&');
                    LogicToken::And
                }
                '|' => {
                    self.chars.next();
                    self.eat('|');
                    LogicToken::Or
                }
                '!' | '¬' => {
                    self.chars.next();
                    LogicToken::Not
                }
                '-' => {
                    self.chars.next();
                    if self.eat('>') {
                        LogicToken::Implies
                    } else {
                        LogicToken::Not
                    }
                }
                '<' => {
                    self.chars.next();
                    if self.eat('-') && self.eat('>') {
                        LogicToken::Iff
                    } else {
                        self.errors.push(LexerError {
                            character: '<',
                            position,
                        });
                        continue;
                    }
                }
                '∧' => {
                    self.chars.next();
                    LogicToken::And
                }
                '∨' => {
                    self.chars.next();
                    LogicToken::Or
                }
                '⊕' => {
                    self.chars.next();
                    LogicToken::Xor
                }
                '⊼' => {
                    self.chars.next();
                    LogicToken::Nand
                }
                '⊽' => {
                    self.chars.next();
                    LogicToken::Nor
                }
                '→' | '⇒' => {
                    self.chars.next();
                    LogicToken::Implies
                }
                '↔' | '⇔' => {
                    self.chars.next();
                    LogicToken::Iff
                }
                _ => {
                    self.chars.next();
                    self.errors.push(LexerError {
                        character: c,
                        position,
                    });
                    continue;
                }
            };

            return Some(PositionedToken { token, position });
        }
    }

    /// Collects all tokens (without positions).
    #[cfg(test)]
    pub fn tokenize(self) -> Vec<LogicToken> {
        self.tokenize_with_errors()
            .tokens
            .into_iter()
            .map(|pt| pt.token)
            .collect()
    }

    /// Collects all tokens and any invalid characters encountered.
    pub fn tokenize_with_errors(mut self) -> LexerResult {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        LexerResult {
            tokens,
            errors: self.errors,
        }
    }
}
