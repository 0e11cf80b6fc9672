//! Recursive-descent expression parser.
//!
//! Precedence, lowest to highest: ternary, `||`, `&&`, equality, relational,
//! additive, multiplicative, prefix unary, postfix (`.`, `[]`, `()`), primary.

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

/// Default maximum nesting of sub-expressions.
pub const DEFAULT_MAX_DEPTH: usize = 64;

const EQUALITY: [&str; 4] = ["===", "!==", "==", "!="];
const RELATIONAL: [&str; 4] = ["<", ">", "<=", ">="];
const ADDITIVE: [&str; 2] = ["+", "-"];
const MULTIPLICATIVE: [&str; 3] = ["*", "/", "%"];
const PREFIX: [&str; 3] = ["!", "-", "+"];
const POSTFIX: [&str; 3] = [".", "[", "("];

/// Expression parser over a token slice.
pub struct ExpressionParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'t> ExpressionParser<'t> {
    /// Parse a complete expression. Trailing tokens are an error.
    pub fn parse(tokens: &'t [Token]) -> Result<Expr, ParseError> {
        Self::parse_with_depth(tokens, DEFAULT_MAX_DEPTH)
    }

    pub fn parse_with_depth(tokens: &'t [Token], max_depth: usize) -> Result<Expr, ParseError> {
        let mut parser = Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        };
        let expr = parser.parse_expression()?;
        if let Some(token) = parser.peek() {
            return Err(ParseError::Expected {
                expected: "end of expression".to_string(),
                found: token.kind.to_string(),
            });
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let expr = self.parse_ternary();
        self.depth -= 1;
        expr
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_logical_or()?;
        if !self.eat_operator("?") {
            return Ok(condition);
        }
        let when_true = self.parse_expression()?;
        self.expect_operator(":")?;
        let when_false = self.parse_expression()?;
        Ok(Expr::ternary(condition, when_true, when_false))
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_and()?;
        let mut links = 0;
        while self.eat_operator("||") {
            self.link(&mut links)?;
            let right = self.parse_logical_and()?;
            left = Expr::binary(BinaryOp::Or, left, right);
        }
        self.depth -= links;
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_binary_level(&EQUALITY)?;
        let mut links = 0;
        while self.eat_operator("&&") {
            self.link(&mut links)?;
            let right = self.parse_binary_level(&EQUALITY)?;
            left = Expr::binary(BinaryOp::And, left, right);
        }
        self.depth -= links;
        Ok(left)
    }

    /// Left-associative binary levels from equality down to multiplicative.
    fn parse_binary_level(&mut self, ops: &[&str]) -> Result<Expr, ParseError> {
        let mut left = self.parse_next_level(ops)?;
        let mut links = 0;
        while let Some(op) = self.peek_operator_in(ops) {
            self.pos += 1;
            self.link(&mut links)?;
            let right = self.parse_next_level(ops)?;
            left = Expr::binary(op, left, right);
        }
        self.depth -= links;
        Ok(left)
    }

    fn parse_next_level(&mut self, ops: &[&str]) -> Result<Expr, ParseError> {
        if ops == EQUALITY {
            self.parse_binary_level(&RELATIONAL)
        } else if ops == RELATIONAL {
            self.parse_binary_level(&ADDITIVE)
        } else if ops == ADDITIVE {
            self.parse_binary_level(&MULTIPLICATIVE)
        } else {
            self.parse_unary()
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token {
                kind: TokenKind::Operator(symbol),
                ..
            }) if PREFIX.contains(symbol) => UnaryOp::from_symbol(symbol),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.parse_unary();
        self.depth -= 1;
        Ok(Expr::unary(op, operand?))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        let mut links = 0;
        while let Some(op) = self.peek_postfix() {
            self.pos += 1;
            self.link(&mut links)?;
            expr = match op {
                "." => Expr::member(expr, self.expect_identifier()?),
                "[" => {
                    let property = self.parse_expression()?;
                    self.expect_operator("]")?;
                    Expr::computed(expr, property)
                }
                _ => Expr::call(expr, self.parse_arguments()?),
            };
        }
        self.depth -= links;
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut arguments = Vec::new();
        if self.eat_operator(")") {
            return Ok(arguments);
        }
        arguments.push(self.parse_expression()?);
        while self.eat_operator(",") {
            arguments.push(self.parse_expression()?);
        }
        self.expect_operator(")")?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        let expr = match &token.kind {
            TokenKind::Number(n) => Expr::literal(Literal::Number(*n)),
            TokenKind::String(s) => Expr::literal(Literal::String(s.clone())),
            TokenKind::Literal(lit) => Expr::literal(lit.clone()),
            TokenKind::Identifier(name) => Expr::identifier(name.clone()),
            TokenKind::Operator("(") => {
                self.pos += 1;
                let expr = self.parse_expression()?;
                self.expect_operator(")")?;
                return Ok(expr);
            }
            other => return Err(ParseError::UnexpectedToken(other.to_string())),
        };
        self.pos += 1;
        Ok(expr)
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.max_depth {
            return Err(ParseError::TooDeep(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    /// Each link of a left-deep chain nests the tree one level further.
    fn link(&mut self, links: &mut usize) -> Result<(), ParseError> {
        self.enter()?;
        *links += 1;
        Ok(())
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_operator_in(&self, ops: &[&str]) -> Option<BinaryOp> {
        match self.peek()?.kind {
            TokenKind::Operator(symbol) if ops.contains(&symbol) => BinaryOp::from_symbol(symbol),
            _ => None,
        }
    }

    fn peek_postfix(&self) -> Option<&'static str> {
        match self.peek()?.kind {
            TokenKind::Operator(symbol) if POSTFIX.contains(&symbol) => Some(symbol),
            _ => None,
        }
    }

    fn eat_operator(&mut self, op: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_operator(op)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_operator(&mut self, op: &str) -> Result<(), ParseError> {
        if self.eat_operator(op) {
            return Ok(());
        }
        Err(ParseError::Expected {
            expected: format!("OPERATOR ({op})"),
            found: self.found(),
        })
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Some(Token {
            kind: TokenKind::Identifier(name),
            ..
        }) = self.peek()
        {
            self.pos += 1;
            return Ok(name.clone());
        }
        Err(ParseError::Expected {
            expected: "IDENTIFIER".to_string(),
            found: self.found(),
        })
    }

    fn found(&self) -> String {
        self.peek()
            .map(|t| t.kind.to_string())
            .unwrap_or_else(|| "end of input".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn parse(src: &str) -> Result<Expr, ParseError> {
        ExpressionParser::parse(&tokenize(src).unwrap())
    }

    fn num(n: f64) -> Expr {
        Expr::literal(Literal::Number(n))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::binary(
                BinaryOp::Add,
                num(1.0),
                Expr::binary(BinaryOp::Mul, num(2.0), num(3.0))
            )
        );
        assert_eq!(
            parse("a || b && c").unwrap(),
            Expr::binary(
                BinaryOp::Or,
                Expr::identifier("a"),
                Expr::binary(BinaryOp::And, Expr::identifier("b"), Expr::identifier("c"))
            )
        );
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(
            parse("10 - 3 - 2").unwrap(),
            Expr::binary(
                BinaryOp::Sub,
                Expr::binary(BinaryOp::Sub, num(10.0), num(3.0)),
                num(2.0)
            )
        );
    }

    #[test]
    fn test_ternary_right_associative() {
        assert_eq!(
            parse("a ? 1 : b ? 2 : 3").unwrap(),
            Expr::ternary(
                Expr::identifier("a"),
                num(1.0),
                Expr::ternary(Expr::identifier("b"), num(2.0), num(3.0))
            )
        );
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(
            parse("user.tags[0].trim()").unwrap(),
            Expr::call(
                Expr::member(
                    Expr::computed(Expr::member(Expr::identifier("user"), "tags"), num(0.0)),
                    "trim"
                ),
                vec![]
            )
        );
    }

    #[test]
    fn test_call_arguments() {
        assert_eq!(
            parse("includes(items, 'a')").unwrap(),
            Expr::call(
                Expr::identifier("includes"),
                vec![
                    Expr::identifier("items"),
                    Expr::literal(Literal::String("a".into()))
                ]
            )
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            parse("!!a").unwrap(),
            Expr::unary(UnaryOp::Not, Expr::unary(UnaryOp::Not, Expr::identifier("a")))
        );
        assert_eq!(parse("-2 * 3").unwrap(), Expr::binary(
            BinaryOp::Mul,
            Expr::unary(UnaryOp::Neg, num(2.0)),
            num(3.0)
        ));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("1 +"), Err(ParseError::UnexpectedEnd));
        assert_eq!(
            parse("(1 + 2"),
            Err(ParseError::Expected {
                expected: "OPERATOR ())".to_string(),
                found: "end of input".to_string()
            })
        );
        assert!(matches!(parse("a ? b"), Err(ParseError::Expected { .. })));
        assert!(matches!(parse("a.1"), Err(ParseError::Expected { .. })));
        assert!(matches!(parse("1 2"), Err(ParseError::Expected { .. })));
        assert!(matches!(parse(")"), Err(ParseError::UnexpectedToken(_))));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(parse(&deep), Err(ParseError::TooDeep(DEFAULT_MAX_DEPTH)));
        let bangs = format!("{}a", "!".repeat(200));
        assert_eq!(parse(&bangs), Err(ParseError::TooDeep(DEFAULT_MAX_DEPTH)));
        let shallow = format!("{}1{}", "(".repeat(10), ")".repeat(10));
        assert!(parse(&shallow).is_ok());
    }

    #[test]
    fn test_depth_limit_counts_chains() {
        let sum = vec!["1"; 200].join(" + ");
        assert_eq!(parse(&sum), Err(ParseError::TooDeep(DEFAULT_MAX_DEPTH)));
        let ors = vec!["a"; 200].join(" || ");
        assert_eq!(parse(&ors), Err(ParseError::TooDeep(DEFAULT_MAX_DEPTH)));
        let members = format!("a{}", ".b".repeat(200));
        assert_eq!(parse(&members), Err(ParseError::TooDeep(DEFAULT_MAX_DEPTH)));
        let calls = format!("f{}", "()".repeat(200));
        assert_eq!(parse(&calls), Err(ParseError::TooDeep(DEFAULT_MAX_DEPTH)));
        assert!(parse(&vec!["1"; 20].join(" + ")).is_ok());
        assert!(parse("a.b.c[0].d && x.y || z").is_ok());
    }
}
