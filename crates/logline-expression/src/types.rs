use serde_json::{Number, Value};

/// Largest integer magnitude that round-trips through `f64` exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Any value an expression can produce.
///
/// JSON cannot hold `undefined`, `NaN` or the infinities, so those get
/// their own variants.
#[derive(Debug, Clone)]
pub enum JsValue {
    /// Absent value: a missing key, a missing index, `undefined`.
    Undefined,
    /// Any JSON-compatible value.
    Json(Value),
    /// `NaN`, `Infinity` or `-Infinity`.
    NonFinite(f64),
}

pub static UNDEFINED: JsValue = JsValue::Undefined;

impl JsValue {
    /// Number value. Integral values are stored as JSON integers so they
    /// serialize without a fractional part.
    pub fn from_f64(n: f64) -> Self {
        if !n.is_finite() {
            return JsValue::NonFinite(n);
        }
        if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
            // -0 collapses to 0.
            return JsValue::Json(Value::Number(Number::from(n as i64)));
        }
        match Number::from_f64(n) {
            Some(num) => JsValue::Json(Value::Number(num)),
            None => JsValue::NonFinite(n),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            JsValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    /// Numeric payload, if the value is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsValue::Json(Value::Number(n)) => n.as_f64(),
            JsValue::NonFinite(n) => Some(*n),
            _ => None,
        }
    }

    /// Convert to JSON. `undefined` and non-finite numbers become `null`,
    /// as `JSON.stringify` does.
    pub fn into_json(self) -> Value {
        match self {
            JsValue::Json(v) => v,
            JsValue::Undefined | JsValue::NonFinite(_) => Value::Null,
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Json(Value::Number(a)), JsValue::Json(Value::Number(b))) => {
                a.as_f64() == b.as_f64()
            }
            (JsValue::Json(a), JsValue::Json(b)) => a == b,
            (JsValue::NonFinite(a), JsValue::NonFinite(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            _ => false,
        }
    }
}

impl From<Value> for JsValue {
    fn from(v: Value) -> Self {
        JsValue::Json(v)
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Json(Value::Bool(b))
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::from_f64(n)
    }
}

impl From<i64> for JsValue {
    fn from(n: i64) -> Self {
        JsValue::Json(Value::Number(Number::from(n)))
    }
}

impl From<usize> for JsValue {
    fn from(n: usize) -> Self {
        JsValue::from_f64(n as f64)
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::Json(Value::String(s))
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::Json(Value::String(s.to_string()))
    }
}
