//! Core logic behind the command-line tools:
//! - `logline-parse` prints a LogLine document as JSON
//! - `logline-eval` evaluates one expression against a JSON context

use logline_expression::{ExpressionEngine, ExpressionError, Vars};
use logline_parser::{LogLineParser, SyntaxError};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ConfigError, RuntimeConfig};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    #[error("{0}")]
    Expression(#[from] ExpressionError),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Usage(String),
}

/// Parse LogLine source into a pretty-printed JSON document.
pub fn run_parse(source: &str, config: &RuntimeConfig) -> Result<String, CliError> {
    let mut parser = LogLineParser::with_options(config.parser.clone());
    let doc = parser.parse(source)?;
    for issue in &doc.errors {
        tracing::warn!(line = ?issue.line, "{}", issue.message);
    }
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Evaluate `expression` against a JSON context (blank means `{}`).
///
/// Without `strict` the result is fail-closed: any error prints `false`.
pub fn run_eval(
    expression: &str,
    context: &str,
    strict: bool,
    config: &RuntimeConfig,
) -> Result<String, CliError> {
    let env: Value = if context.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(context)?
    };
    let vars = Vars::new(env);
    let mut engine = ExpressionEngine::with_options(config.engine.clone());
    let result = if strict {
        engine.try_evaluate(expression, &vars)?
    } else {
        engine.evaluate(expression, &vars)
    };
    Ok(serde_json::to_string(&result.into_json())?)
}

/// Pull `--config <file>` out of `args`.
pub fn take_config(args: &mut Vec<String>) -> Result<RuntimeConfig, CliError> {
    let Some(idx) = args.iter().position(|a| a == "--config") else {
        return Ok(RuntimeConfig::default());
    };
    args.remove(idx);
    if idx >= args.len() {
        return Err(CliError::Usage("--config needs a file path".into()));
    }
    let path = args.remove(idx);
    Ok(RuntimeConfig::from_file(path)?)
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
