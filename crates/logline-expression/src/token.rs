//! Lexer: expression text to token stream.

use std::fmt;

use crate::ast::Literal;
use crate::error::LexError;

const THREE_CHAR_OPERATORS: [&str; 2] = ["===", "!=="];
const TWO_CHAR_OPERATORS: [&str; 6] = ["==", "!=", "<=", ">=", "&&", "||"];
const ONE_CHAR_OPERATORS: [&str; 16] = [
    "+", "-", "*", "/", "%", "!", "<", ">", "(", ")", "[", "]", ".", ",", "?", ":",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    String(String),
    Number(f64),
    Identifier(String),
    /// `true`, `false`, `null` or `undefined`.
    Literal(Literal),
    Operator(&'static str),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::String(s) => write!(f, "STRING ({s:?})"),
            TokenKind::Number(n) => write!(f, "NUMBER ({})", crate::util::format_number(*n)),
            TokenKind::Identifier(name) => write!(f, "IDENTIFIER ({name})"),
            TokenKind::Literal(lit) => write!(f, "LITERAL ({lit})"),
            TokenKind::Operator(op) => write!(f, "OPERATOR ({op})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token in the source text.
    pub offset: usize,
}

impl Token {
    pub fn is_operator(&self, op: &str) -> bool {
        matches!(self.kind, TokenKind::Operator(o) if o == op)
    }
}

/// Turn expression text into tokens, in source order.
///
/// # Example
///
/// ```
/// use logline_expression::{tokenize, TokenKind};
///
/// let tokens = tokenize("user.age >= 18").unwrap();
/// assert_eq!(tokens.len(), 5);
/// assert_eq!(tokens[0].kind, TokenKind::Identifier("user".into()));
/// assert_eq!(tokens[3].kind, TokenKind::Operator(">="));
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer { src: source, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(c) = lexer.peek() {
        let offset = lexer.pos;
        if c.is_whitespace() {
            lexer.bump();
            continue;
        }
        let kind = if c == '"' || c == '\'' {
            lexer.string(c)?
        } else if c.is_ascii_digit() {
            lexer.number()
        } else if is_ident_start(c) {
            lexer.word()
        } else {
            lexer.operator(c)?
        };
        tokens.push(Token { kind, offset });
    }
    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Quoted literal. A backslash escapes the closing quote character only;
    /// any other backslash is kept verbatim.
    fn string(&mut self, quote: char) -> Result<TokenKind, LexError> {
        let offset = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedString { offset }),
                Some('\\') if self.peek() == Some(quote) => {
                    self.bump();
                    value.push(quote);
                }
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }
        Ok(TokenKind::String(value))
    }

    /// Digits with at most one decimal point. Signs are unary operators.
    fn number(&mut self) -> TokenKind {
        let start = self.pos;
        self.eat_digits();
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.eat_digits();
        }
        let text = &self.src[start..self.pos];
        TokenKind::Number(text.parse().unwrap_or(f64::NAN))
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn word(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "true" => TokenKind::Literal(Literal::Bool(true)),
            "false" => TokenKind::Literal(Literal::Bool(false)),
            "null" => TokenKind::Literal(Literal::Null),
            "undefined" => TokenKind::Literal(Literal::Undefined),
            name => TokenKind::Identifier(name.to_string()),
        }
    }

    fn operator(&mut self, c: char) -> Result<TokenKind, LexError> {
        let rest = self.rest();
        let op = THREE_CHAR_OPERATORS
            .iter()
            .chain(TWO_CHAR_OPERATORS.iter())
            .chain(ONE_CHAR_OPERATORS.iter())
            .find(|op| rest.starts_with(**op))
            .copied()
            .ok_or(LexError::UnexpectedChar {
                ch: c,
                offset: self.pos,
            })?;
        self.pos += op.len();
        Ok(TokenKind::Operator(op))
    }
}
