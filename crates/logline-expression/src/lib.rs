//! Sandboxed expression language for LogLine bindings.
//!
//! Expressions are small, side-effect free formulas evaluated against a JSON
//! context: `user.age >= 18 ? 'adult' : 'minor'`, `items.includes('x')`,
//! `price * 1.1`. There is no assignment, no loop and no way to define or
//! call arbitrary functions: calls are limited to an allow-list of built-ins
//! plus host functions registered on the [`Vars`].
//!
//! The pipeline is [`tokenize`] → [`ExpressionParser`] → [`evaluate`].
//! [`ExpressionEngine`] wraps it with memoization and the fail-closed
//! `evaluate`/`interpolate` surface used by UI bindings.

pub mod ast;
pub mod engine;
pub mod error;
pub mod eval_ctx;
pub mod evaluate;
pub mod functions;
pub mod parser;
pub mod token;
pub mod types;
pub mod util;
pub mod validate;
pub mod vars;

pub use ast::{BinaryOp, Expr, Literal, UnaryOp};
pub use engine::{interpolation_regex, CacheStats, EngineOptions, ExpressionEngine};
pub use error::{EvalError, ExpressionError, LexError, ParseError};
pub use eval_ctx::EvalCtx;
pub use evaluate::evaluate;
pub use functions::{builtins, functions_map, Callable, FunctionDefinition, FunctionMap};
pub use parser::ExpressionParser;
pub use token::{tokenize, Token, TokenKind};
pub use types::JsValue;
pub use validate::{find_dangerous_pattern, is_dangerous, validate_expression};
pub use vars::Vars;

/// Tokenize and parse expression text.
pub fn parse_expression(text: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(text)?;
    Ok(ExpressionParser::parse(&tokens)?)
}
