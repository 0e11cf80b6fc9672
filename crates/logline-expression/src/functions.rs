//! Callable values: the built-in allow-list and host-registered functions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::EvalError;
use crate::types::JsValue;
use crate::util::{strict_equals, text_length, to_js_string, to_number};

/// Signature of a built-in function. Arguments are already evaluated; in
/// method position the receiver is the first argument.
pub type FunctionFn = fn(&[JsValue]) -> Result<JsValue, EvalError>;

/// Signature of a host-provided function.
pub type HostFn = dyn Fn(&[JsValue]) -> Result<JsValue, EvalError> + Send + Sync;

/// A built-in function definition.
pub struct FunctionDefinition {
    pub name: &'static str,
    pub eval_fn: FunctionFn,
}

/// Anything an expression is allowed to call.
#[derive(Clone)]
pub enum Callable {
    Builtin(Arc<FunctionDefinition>),
    Host(Arc<HostFn>),
}

impl Callable {
    pub fn host<F>(f: F) -> Self
    where
        F: Fn(&[JsValue]) -> Result<JsValue, EvalError> + Send + Sync + 'static,
    {
        Callable::Host(Arc::new(f))
    }

    pub fn invoke(&self, args: &[JsValue]) -> Result<JsValue, EvalError> {
        match self {
            Callable::Builtin(def) => (def.eval_fn)(args),
            Callable::Host(f) => f(args),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Builtin(def) => write!(f, "Builtin({})", def.name),
            Callable::Host(_) => f.write_str("Host(..)"),
        }
    }
}

pub type FunctionMap = HashMap<String, Callable>;

pub fn functions_to_map(defs: Vec<Arc<FunctionDefinition>>) -> FunctionMap {
    defs.into_iter()
        .map(|def| (def.name.to_string(), Callable::Builtin(def)))
        .collect()
}

/// The built-in allow-list.
pub fn builtins() -> Vec<Arc<FunctionDefinition>> {
    vec![
        def("includes", includes),
        def("length", length),
        def("toString", to_string),
        def("toLowerCase", to_lower_case),
        def("toUpperCase", to_upper_case),
        def("trim", trim),
        def("parseInt", parse_int),
        def("parseFloat", parse_float),
    ]
}

/// Map of the built-in allow-list, keyed by name.
pub fn functions_map() -> FunctionMap {
    functions_to_map(builtins())
}

fn def(name: &'static str, eval_fn: FunctionFn) -> Arc<FunctionDefinition> {
    Arc::new(FunctionDefinition { name, eval_fn })
}

fn arg(args: &[JsValue], i: usize) -> &JsValue {
    args.get(i).unwrap_or(&crate::types::UNDEFINED)
}

/// Text receiver of a string method. `null` and `undefined` have no methods.
fn receiver_text(name: &str, args: &[JsValue]) -> Result<String, EvalError> {
    match arg(args, 0) {
        JsValue::Undefined | JsValue::Json(Value::Null) => Err(EvalError::host(
            name,
            "cannot read properties of null or undefined",
        )),
        other => Ok(to_js_string(other)),
    }
}

fn includes(args: &[JsValue]) -> Result<JsValue, EvalError> {
    let needle = arg(args, 1);
    let found = match arg(args, 0) {
        JsValue::Json(Value::Array(items)) => items
            .iter()
            .any(|item| strict_equals(&JsValue::Json(item.clone()), needle)),
        JsValue::Json(Value::String(s)) => s.contains(&to_js_string(needle)),
        JsValue::Undefined | JsValue::Json(Value::Null) => {
            return Err(EvalError::host(
                "includes",
                "cannot read properties of null or undefined",
            ))
        }
        _ => false,
    };
    Ok(JsValue::from(found))
}

fn length(args: &[JsValue]) -> Result<JsValue, EvalError> {
    let n = match arg(args, 0) {
        JsValue::Json(Value::Array(items)) => items.len() as f64,
        JsValue::Json(Value::String(s)) => text_length(s) as f64,
        JsValue::Json(Value::Object(map)) => map
            .get("length")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(JsValue::from_f64(n))
}

fn to_string(args: &[JsValue]) -> Result<JsValue, EvalError> {
    receiver_text("toString", args).map(JsValue::from)
}

fn to_lower_case(args: &[JsValue]) -> Result<JsValue, EvalError> {
    receiver_text("toLowerCase", args).map(|s| JsValue::from(s.to_lowercase()))
}

fn to_upper_case(args: &[JsValue]) -> Result<JsValue, EvalError> {
    receiver_text("toUpperCase", args).map(|s| JsValue::from(s.to_uppercase()))
}

fn trim(args: &[JsValue]) -> Result<JsValue, EvalError> {
    receiver_text("trim", args).map(|s| JsValue::from(s.trim()))
}

/// Leading decimal integer of the text. The radix is always 10; a second
/// argument is ignored.
fn parse_int(args: &[JsValue]) -> Result<JsValue, EvalError> {
    let text = to_js_string(arg(args, 0));
    let mut s = text.trim_start();
    let negative = s.starts_with('-');
    if negative || s.starts_with('+') {
        s = &s[1..];
    }
    let mut value: f64 = 0.0;
    let mut digits = 0;
    for d in s.chars().map_while(|c| c.to_digit(10)) {
        value = value * 10.0 + f64::from(d);
        digits += 1;
    }
    if digits == 0 {
        return Ok(JsValue::from_f64(f64::NAN));
    }
    Ok(JsValue::from_f64(if negative { -value } else { value }))
}

/// Longest decimal prefix of the text.
fn parse_float(args: &[JsValue]) -> Result<JsValue, EvalError> {
    let text = to_js_string(arg(args, 0));
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        let inf = if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        return Ok(JsValue::from_f64(inf));
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return Ok(JsValue::from_f64(f64::NAN));
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    Ok(JsValue::from_f64(s[..end].parse().unwrap_or(f64::NAN)))
}
