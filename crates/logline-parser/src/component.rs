//! Component registry and expansion.

use std::collections::HashMap;

use logline_expression::{interpolation_regex, parse_expression, Expr, ExpressionEngine, JsValue, Vars};
use regex::Captures;
use serde_json::{Map, Value};

use crate::block::Block;
use crate::error::{IssueKind, ParseIssue};

/// Name of the binding that exposes an instance's properties to its template.
pub const PROPS: &str = "props";

/// Named block templates.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    templates: HashMap<String, Vec<Block>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a template, replacing any earlier one with the same name.
    pub fn register(&mut self, name: impl Into<String>, template: Vec<Block>) {
        self.templates.insert(name.into(), template);
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.templates.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&[Block]> {
        self.templates.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Expands component instances in place.
///
/// An instance keeps its type and properties and receives a fresh copy of
/// the template blocks as children, ahead of its own children. Template
/// properties are substituted against `props`, the instance's properties.
/// A component already on the current expansion path is reported as a
/// circular reference and left unexpanded.
pub(crate) struct Expander<'a> {
    registry: &'a ComponentRegistry,
    engine: &'a mut ExpressionEngine,
    issues: &'a mut Vec<ParseIssue>,
    stack: Vec<String>,
}

impl<'a> Expander<'a> {
    pub(crate) fn new(
        registry: &'a ComponentRegistry,
        engine: &'a mut ExpressionEngine,
        issues: &'a mut Vec<ParseIssue>,
    ) -> Self {
        Expander {
            registry,
            engine,
            issues,
            stack: Vec::new(),
        }
    }

    pub(crate) fn expand_all(&mut self, blocks: &mut [Block]) {
        for block in blocks {
            self.expand(block);
        }
    }

    fn expand(&mut self, block: &mut Block) {
        if block.component {
            // Instances inside a registered template were expanded at
            // registration; components registered since may sit below them.
            if !self.closes_cycle(&block.block_type) {
                self.stack.push(block.block_type.clone());
                self.expand_all(&mut block.children);
                self.stack.pop();
            }
            return;
        }
        let registry = self.registry;
        let Some(template) = registry.get(&block.block_type) else {
            self.expand_all(&mut block.children);
            return;
        };
        self.expand_all(&mut block.children);
        if self.closes_cycle(&block.block_type) {
            return;
        }

        let mut env = Map::new();
        env.insert(PROPS.to_string(), Value::Object(block.properties.clone()));
        let vars = Vars::new(Value::Object(env));
        let mut instance = template.to_vec();
        for child in &mut instance {
            substitute_props(child, &vars, self.engine);
        }
        self.stack.push(block.block_type.clone());
        self.expand_all(&mut instance);
        self.stack.pop();

        let own_children = std::mem::take(&mut block.children);
        block.children = instance;
        block.children.extend(own_children);
        block.component = true;
    }

    /// Report `name` if it is already on the expansion path.
    fn closes_cycle(&mut self, name: &str) -> bool {
        let Some(start) = self.stack.iter().position(|entry| entry == name) else {
            return false;
        };
        let path = self.stack[start..].join(" -> ");
        let message = format!("circular component reference: {path} -> {name}");
        tracing::warn!(component = %name, "{}", message);
        self.issues.push(ParseIssue {
            kind: IssueKind::CircularReference,
            message,
            line: None,
        });
        true
    }
}

fn substitute_props(block: &mut Block, vars: &Vars, engine: &mut ExpressionEngine) {
    for value in block.properties.values_mut() {
        if let Value::String(text) = value {
            if let Some(substituted) = substitute_text(text, vars, engine) {
                *value = substituted;
            }
        }
    }
    for child in &mut block.children {
        substitute_props(child, vars, engine);
    }
}

/// `None` when the text has no span that reads only from `props`.
fn substitute_text(text: &str, vars: &Vars, engine: &mut ExpressionEngine) -> Option<Value> {
    let re = interpolation_regex();
    let caps = re.captures(text)?;
    if caps.get(0).is_some_and(|m| m.start() == 0 && m.end() == text.len()) {
        let expr = caps[1].trim();
        if !reads_only_props(expr) {
            return None;
        }
        return match engine.try_evaluate(expr, vars) {
            Ok(JsValue::Undefined) => Some(Value::String(String::new())),
            Ok(value) => Some(value.into_json()),
            Err(err) => {
                tracing::debug!(expression = expr, error = %err, "component property not substituted");
                None
            }
        };
    }
    if !re.captures_iter(text).any(|c| reads_only_props(c[1].trim())) {
        return None;
    }
    let replaced = re.replace_all(text, |caps: &Captures| {
        let expr = caps[1].trim();
        if !reads_only_props(expr) {
            return caps[0].to_string();
        }
        match engine.try_evaluate(expr, vars) {
            Ok(value) => logline_expression::util::to_display_string(&value),
            Err(_) => caps[0].to_string(),
        }
    });
    Some(Value::String(replaced.into_owned()))
}

/// Whether every variable the expression reads is rooted at `props`.
fn reads_only_props(expr: &str) -> bool {
    let Ok(ast) = parse_expression(expr) else {
        return false;
    };
    let mut roots = Vec::new();
    collect_roots(&ast, &mut roots);
    !roots.is_empty() && roots.iter().all(|root| *root == PROPS)
}

fn collect_roots<'e>(expr: &'e Expr, out: &mut Vec<&'e str>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Identifier(name) => out.push(name.split('.').next().unwrap_or(name)),
        Expr::Member { object, .. } => collect_roots(object, out),
        Expr::Computed { object, property } => {
            collect_roots(object, out);
            collect_roots(property, out);
        }
        Expr::Unary { operand, .. } => collect_roots(operand, out),
        Expr::Binary { left, right, .. } => {
            collect_roots(left, out);
            collect_roots(right, out);
        }
        Expr::Ternary {
            condition,
            when_true,
            when_false,
        } => {
            collect_roots(condition, out);
            collect_roots(when_true, out);
            collect_roots(when_false, out);
        }
        Expr::Call { callee, arguments } => {
            // A bare built-in name is not a variable read.
            if !matches!(callee.as_ref(), Expr::Identifier(_)) {
                collect_roots(callee, out);
            }
            for argument in arguments {
                collect_roots(argument, out);
            }
        }
    }
}
