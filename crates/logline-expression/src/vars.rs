use std::collections::HashMap;

use serde_json::Value;

use crate::error::EvalError;
use crate::functions::Callable;
use crate::types::JsValue;

/// Evaluation context: the data an expression reads, plus any host
/// functions it may call.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    env: Value,
    functions: HashMap<String, Callable>,
}

impl Vars {
    pub fn new(env: Value) -> Self {
        Vars {
            env,
            functions: HashMap::new(),
        }
    }

    /// Register a host function under a (possibly dotted) name.
    pub fn with_function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[JsValue]) -> Result<JsValue, EvalError> + Send + Sync + 'static,
    {
        self.set_function(name, f);
        self
    }

    pub fn set_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[JsValue]) -> Result<JsValue, EvalError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Callable::host(f));
    }

    pub fn function(&self, name: &str) -> Option<&Callable> {
        self.functions.get(name)
    }

    pub fn has_functions(&self) -> bool {
        !self.functions.is_empty()
    }

    pub fn env(&self) -> &Value {
        &self.env
    }

    /// Serialized data, used as part of the result-cache key.
    pub fn fingerprint(&self) -> String {
        self.env.to_string()
    }

    /// Value stored under exactly `name` at the top level.
    pub fn get_exact(&self, name: &str) -> Option<&Value> {
        self.env.as_object()?.get(name)
    }

    /// Resolve a variable name.
    ///
    /// An exact top-level key wins. Otherwise a dotted name descends through
    /// nested objects; a missing key or a non-object along the way gives
    /// `undefined`.
    pub fn resolve(&self, name: &str) -> JsValue {
        if let Some(value) = self.get_exact(name) {
            return JsValue::Json(value.clone());
        }
        let mut current = &self.env;
        for segment in name.split('.') {
            match current {
                Value::Object(map) => match map.get(segment) {
                    Some(next) => current = next,
                    None => return JsValue::Undefined,
                },
                _ => return JsValue::Undefined,
            }
        }
        JsValue::Json(current.clone())
    }
}

impl From<Value> for Vars {
    fn from(env: Value) -> Self {
        Vars::new(env)
    }
}
