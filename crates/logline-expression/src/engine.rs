//! Memoizing expression engine with a fail-closed public surface.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ast::Expr;
use crate::error::ExpressionError;
use crate::eval_ctx::EvalCtx;
use crate::evaluate::evaluate;
use crate::functions::{functions_map, FunctionMap};
use crate::parser::{ExpressionParser, DEFAULT_MAX_DEPTH};
use crate::token::tokenize;
use crate::types::JsValue;
use crate::util::to_display_string;
use crate::validate::find_dangerous_pattern;
use crate::vars::Vars;

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Results are cached only when the serialized context is shorter than this.
    pub cache_context_limit: usize,
    /// Maximum entries in each memo table; the oldest entry goes first.
    pub cache_capacity: usize,
    /// Maximum expression nesting depth.
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_context_limit: 1000,
            cache_capacity: 4096,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Counters for the memo tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of times expression text was actually tokenized and parsed.
    pub parses: u64,
    pub ast_hits: u64,
    pub result_hits: u64,
}

/// Owns the built-in functions and two memo tables: parsed trees keyed by
/// expression text, and results keyed by expression text plus serialized
/// context.
///
/// # Example
///
/// ```
/// use logline_expression::{ExpressionEngine, JsValue, Vars};
/// use serde_json::json;
///
/// let mut engine = ExpressionEngine::new();
/// let vars = Vars::new(json!({"user": {"name": "Maria", "age": 25}}));
/// assert_eq!(
///     engine.interpolate("{{user.name}} tem {{user.age}} anos.", &vars),
///     "Maria tem 25 anos."
/// );
/// assert_eq!(engine.evaluate("user.age > 18", &vars), JsValue::from(true));
/// // Failures are fail-closed.
/// assert_eq!(engine.evaluate("alert(1)", &vars), JsValue::from(false));
/// ```
pub struct ExpressionEngine {
    options: EngineOptions,
    functions: Arc<FunctionMap>,
    asts: IndexMap<String, Arc<Expr>>,
    results: IndexMap<String, JsValue>,
    stats: CacheStats,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEngine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            functions: Arc::new(functions_map()),
            asts: IndexMap::new(),
            results: IndexMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parse expression text, reusing an earlier parse of the same text.
    pub fn compile(&mut self, text: &str) -> Result<Arc<Expr>, ExpressionError> {
        if let Some(expr) = self.asts.get(text) {
            self.stats.ast_hits += 1;
            return Ok(expr.clone());
        }
        let tokens = tokenize(text)?;
        let expr = Arc::new(ExpressionParser::parse_with_depth(
            &tokens,
            self.options.max_depth,
        )?);
        self.stats.parses += 1;
        self.asts.insert(text.to_string(), expr.clone());
        evict_oldest(&mut self.asts, self.options.cache_capacity);
        Ok(expr)
    }

    /// Evaluate expression text, reporting any failure.
    ///
    /// Blank text evaluates to itself. Denylisted text is refused before it
    /// is parsed.
    pub fn try_evaluate(&mut self, text: &str, vars: &Vars) -> Result<JsValue, ExpressionError> {
        if text.trim().is_empty() {
            return Ok(JsValue::from(text));
        }
        if let Some(pattern) = find_dangerous_pattern(text) {
            return Err(ExpressionError::Unsafe(pattern));
        }
        let key = self.result_key(text, vars);
        if let Some(hit) = key.as_ref().and_then(|k| self.results.get(k)) {
            self.stats.result_hits += 1;
            return Ok(hit.clone());
        }
        let expr = self.compile(text)?;
        let ctx = EvalCtx::new(vars, self.functions.clone());
        let value = evaluate(&expr, &ctx)?;
        if let Some(key) = key {
            self.results.insert(key, value.clone());
            evict_oldest(&mut self.results, self.options.cache_capacity);
        }
        Ok(value)
    }

    /// Evaluate expression text. Any failure yields `false`.
    pub fn evaluate(&mut self, text: &str, vars: &Vars) -> JsValue {
        match self.try_evaluate(text, vars) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(expression = text, error = %err, "expression failed, returning false");
                JsValue::from(false)
            }
        }
    }

    /// Evaluate a text value as an expression; anything else passes through.
    pub fn evaluate_value(&mut self, value: &Value, vars: &Vars) -> JsValue {
        match value {
            Value::String(text) => self.evaluate(text, vars),
            other => JsValue::Json(other.clone()),
        }
    }

    /// Replace every `{{ expr }}` span with its rendered value. A span that
    /// fails to evaluate is left as written.
    pub fn interpolate(&mut self, template: &str, vars: &Vars) -> String {
        interpolation_regex()
            .replace_all(template, |caps: &Captures| {
                let text = caps[1].trim();
                match self.try_evaluate(text, vars) {
                    Ok(value) => to_display_string(&value),
                    Err(err) => {
                        tracing::debug!(expression = text, error = %err, "interpolation failed, keeping placeholder");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    pub fn validate_expression(&self, text: &str) -> bool {
        crate::validate::validate_expression(text)
    }

    /// Empty both memo tables.
    pub fn clear_cache(&mut self) {
        self.asts.clear();
        self.results.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of cached results.
    pub fn cache_len(&self) -> usize {
        self.results.len()
    }

    /// Number of cached parse trees.
    pub fn ast_cache_len(&self) -> usize {
        self.asts.len()
    }

    fn result_key(&self, text: &str, vars: &Vars) -> Option<String> {
        if vars.has_functions() {
            return None;
        }
        let fingerprint = vars.fingerprint();
        if fingerprint.len() >= self.options.cache_context_limit {
            return None;
        }
        Some(format!("{text}::{fingerprint}"))
    }
}

/// `{{ ... }}` spans, as used in templates and LogLine property values.
pub fn interpolation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap())
}

fn evict_oldest<V>(map: &mut IndexMap<String, V>, capacity: usize) {
    while map.len() > capacity {
        map.shift_remove_index(0);
    }
}
