//! Value coercion and comparison helpers shared by the evaluator and the
//! built-in functions.

use std::cmp::Ordering;

use logline_path::is_valid_index;
use serde_json::Value;

use crate::types::JsValue;

// ------------------------------------------------------------------ Coercion

/// Truthiness of a value.
pub fn is_truthy(value: &JsValue) -> bool {
    match value {
        JsValue::Undefined => false,
        JsValue::NonFinite(n) => !n.is_nan(),
        JsValue::Json(v) => match v {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        },
    }
}

/// Numeric conversion. Text that is not a complete number gives `NaN`.
pub fn to_number(value: &JsValue) -> f64 {
    match value {
        JsValue::Undefined => f64::NAN,
        JsValue::NonFinite(n) => *n,
        JsValue::Json(v) => match v {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => str_to_number(s),
            Value::Array(_) => str_to_number(&to_js_string(value)),
            Value::Object(_) => f64::NAN,
        },
    }
}

fn str_to_number(s: &str) -> f64 {
    let s = s.trim();
    match s {
        "" => return 0.0,
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    // `f64::from_str` also accepts "inf" and "nan"; those are not numbers here.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Text conversion, as `String(value)` would produce it.
pub fn to_js_string(value: &JsValue) -> String {
    match value {
        JsValue::Undefined => "undefined".to_string(),
        JsValue::NonFinite(n) => format_number(*n),
        JsValue::Json(v) => json_to_string(v),
    }
}

fn json_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => json_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Text used when a value is rendered into a template. Absent renders empty.
pub fn to_display_string(value: &JsValue) -> String {
    match value {
        JsValue::Undefined => String::new(),
        other => to_js_string(other),
    }
}

/// Render a number with at most 15 significant digits.
///
/// # Example
///
/// ```
/// use logline_expression::util::format_number;
///
/// assert_eq!(format_number(1200.0 * 1.1), "1320");
/// assert_eq!(format_number(0.1 + 0.2), "0.3");
/// assert_eq!(format_number(-2.5), "-2.5");
/// assert_eq!(format_number(f64::NAN), "NaN");
/// assert_eq!(format_number(1e21), "1e+21");
/// ```
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let rounded: f64 = format!("{n:.14e}").parse().unwrap_or(n);
    let abs = rounded.abs();
    if abs >= 1e21 {
        let text = format!("{rounded:e}");
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }
    if rounded.fract() == 0.0 {
        return format!("{rounded:.0}");
    }
    if abs < 1e-6 {
        return format!("{rounded:e}");
    }
    format!("{rounded}")
}

/// Reduce containers to text, leave primitives alone.
fn to_primitive(value: &JsValue) -> JsValue {
    match value {
        JsValue::Json(Value::Array(_) | Value::Object(_)) => JsValue::from(to_js_string(value)),
        other => other.clone(),
    }
}

fn is_string(value: &JsValue) -> bool {
    matches!(value, JsValue::Json(Value::String(_)))
}

fn is_number(value: &JsValue) -> bool {
    matches!(value, JsValue::Json(Value::Number(_)) | JsValue::NonFinite(_))
}

fn is_nullish(value: &JsValue) -> bool {
    matches!(value, JsValue::Undefined | JsValue::Json(Value::Null))
}

fn is_container(value: &JsValue) -> bool {
    matches!(value, JsValue::Json(Value::Array(_) | Value::Object(_)))
}

// ---------------------------------------------------------------- Operators

/// `===`: same type and value. Containers compare structurally, `NaN` is
/// never equal to anything.
pub fn strict_equals(a: &JsValue, b: &JsValue) -> bool {
    if is_number(a) && is_number(b) {
        return to_number(a) == to_number(b);
    }
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Json(x), JsValue::Json(y)) => json_equals(x, y),
        _ => false,
    }
}

fn json_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| json_equals(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| json_equals(v, other)))
        }
        _ => a == b,
    }
}

/// `==`: `null` and `undefined` are equal to each other only; otherwise
/// booleans and text are coerced to numbers and containers to text.
pub fn loose_equals(a: &JsValue, b: &JsValue) -> bool {
    if is_nullish(a) || is_nullish(b) {
        return is_nullish(a) && is_nullish(b);
    }
    if let JsValue::Json(Value::Bool(x)) = a {
        return loose_equals(&JsValue::from(f64::from(u8::from(*x))), b);
    }
    if let JsValue::Json(Value::Bool(y)) = b {
        return loose_equals(a, &JsValue::from(f64::from(u8::from(*y))));
    }
    if is_container(a) && is_container(b) {
        return strict_equals(a, b);
    }
    if is_container(a) || is_container(b) {
        return loose_equals(&to_primitive(a), &to_primitive(b));
    }
    if is_string(a) && is_string(b) {
        return a == b;
    }
    to_number(a) == to_number(b)
}

/// `+`: concatenation when either operand is text, addition otherwise.
pub fn add(a: &JsValue, b: &JsValue) -> JsValue {
    let (a, b) = (to_primitive(a), to_primitive(b));
    if is_string(&a) || is_string(&b) {
        let mut out = to_js_string(&a);
        out.push_str(&to_js_string(&b));
        return JsValue::from(out);
    }
    JsValue::from_f64(to_number(&a) + to_number(&b))
}

/// Relational comparison. Two texts compare lexicographically, anything else
/// numerically; `None` when either side is `NaN`.
pub fn compare(a: &JsValue, b: &JsValue) -> Option<Ordering> {
    let (a, b) = (to_primitive(a), to_primitive(b));
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    to_number(&a).partial_cmp(&to_number(&b))
}

// ---------------------------------------------------------- Member access

/// Property name for a computed access key.
pub fn property_key(key: &JsValue) -> String {
    to_js_string(key)
}

/// Length of text in UTF-16 code units.
pub fn text_length(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Read `property` of `base`. Anything that does not exist is `undefined`.
///
/// Objects are read by key, sequences by index or `length`, text by
/// UTF-16 code unit index or `length`.
pub fn get_member(base: &JsValue, property: &str) -> JsValue {
    match base {
        JsValue::Json(Value::Object(map)) => map
            .get(property)
            .map(|v| JsValue::Json(v.clone()))
            .unwrap_or(JsValue::Undefined),
        JsValue::Json(Value::Array(items)) => {
            if property == "length" {
                return JsValue::from(items.len());
            }
            index_of(property)
                .and_then(|i| items.get(i))
                .map(|v| JsValue::Json(v.clone()))
                .unwrap_or(JsValue::Undefined)
        }
        JsValue::Json(Value::String(s)) => {
            if property == "length" {
                return JsValue::from(text_length(s));
            }
            index_of(property)
                .and_then(|i| s.encode_utf16().nth(i))
                .map(|unit| JsValue::from(String::from_utf16_lossy(&[unit])))
                .unwrap_or(JsValue::Undefined)
        }
        _ => JsValue::Undefined,
    }
}

fn index_of(property: &str) -> Option<usize> {
    if !is_valid_index(property) {
        return None;
    }
    property.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(value: Value) -> JsValue {
        JsValue::from(value)
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&JsValue::Undefined));
        assert!(!is_truthy(&v(json!(""))));
        assert!(!is_truthy(&v(json!(0))));
        assert!(!is_truthy(&JsValue::from_f64(f64::NAN)));
        assert!(is_truthy(&v(json!([]))));
        assert!(is_truthy(&v(json!({}))));
        assert!(is_truthy(&v(json!("0"))));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&v(json!(" 42 "))), 42.0);
        assert_eq!(to_number(&v(json!(""))), 0.0);
        assert_eq!(to_number(&v(json!("0x1f"))), 31.0);
        assert_eq!(to_number(&v(json!(true))), 1.0);
        assert_eq!(to_number(&v(json!(null))), 0.0);
        assert_eq!(to_number(&v(json!([7]))), 7.0);
        assert!(to_number(&v(json!("inf"))).is_nan());
        assert!(to_number(&v(json!("12px"))).is_nan());
        assert!(to_number(&JsValue::Undefined).is_nan());
    }

    #[test]
    fn test_to_js_string() {
        assert_eq!(to_js_string(&v(json!([1, null, "a"]))), "1,,a");
        assert_eq!(to_js_string(&v(json!({"a": 1}))), "[object Object]");
        assert_eq!(to_js_string(&v(json!(2.0))), "2");
        assert_eq!(to_display_string(&JsValue::Undefined), "");
        assert_eq!(to_display_string(&v(json!(null))), "null");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(25.0), "25");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(123456789012.0), "123456789012");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_equality() {
        assert!(strict_equals(&v(json!(1)), &v(json!(1.0))));
        assert!(!strict_equals(&v(json!(1)), &v(json!("1"))));
        assert!(strict_equals(&v(json!({"a": [1]})), &v(json!({"a": [1.0]}))));
        assert!(!strict_equals(&JsValue::from_f64(f64::NAN), &JsValue::from_f64(f64::NAN)));
        assert!(loose_equals(&v(json!(1)), &v(json!("1"))));
        assert!(loose_equals(&v(json!(null)), &JsValue::Undefined));
        assert!(!loose_equals(&v(json!(null)), &v(json!(0))));
        assert!(loose_equals(&v(json!(true)), &v(json!("1"))));
        assert!(loose_equals(&v(json!([1, 2])), &v(json!("1,2"))));
    }

    #[test]
    fn test_add_and_compare() {
        assert_eq!(add(&v(json!(1)), &v(json!(2))), v(json!(3)));
        assert_eq!(add(&v(json!("a")), &v(json!(1))), v(json!("a1")));
        assert_eq!(add(&v(json!(1)), &v(json!(null))), v(json!(1)));
        assert_eq!(compare(&v(json!("b")), &v(json!("a"))), Some(Ordering::Greater));
        assert_eq!(compare(&v(json!("10")), &v(json!(9))), Some(Ordering::Greater));
        assert_eq!(compare(&JsValue::Undefined, &v(json!(1))), None);
    }

    #[test]
    fn test_get_member() {
        let items = v(json!(["a", "b"]));
        assert_eq!(get_member(&items, "length"), v(json!(2)));
        assert_eq!(get_member(&items, "1"), v(json!("b")));
        assert_eq!(get_member(&items, "5"), JsValue::Undefined);
        assert_eq!(get_member(&v(json!("João")), "length"), v(json!(4)));
        assert_eq!(get_member(&v(json!("João")), "2"), v(json!("ã")));
        let emoji = v(json!("a😀"));
        assert_eq!(get_member(&emoji, "length"), v(json!(3)));
        assert_eq!(get_member(&emoji, "0"), v(json!("a")));
        assert_eq!(get_member(&emoji, "2"), v(json!("\u{FFFD}")));
        assert_eq!(get_member(&emoji, "3"), JsValue::Undefined);
        assert_eq!(get_member(&v(json!(null)), "x"), JsValue::Undefined);
        assert_eq!(get_member(&JsValue::Undefined, "x"), JsValue::Undefined);
    }
}
