//! Scalar property values.

use serde_json::{Number, Value};

use crate::error::SyntaxErrorKind;

/// Parse the text after `key:`.
///
/// Quoted text (single or double quotes, backslash escapes), `true`,
/// `false`, `null` and decimal numbers are typed; anything else is bare
/// text.
pub fn parse_scalar(text: &str) -> Result<Value, SyntaxErrorKind> {
    let text = text.trim();
    if let Some(quote) = text.chars().next().filter(|c| *c == '"' || *c == '\'') {
        return parse_quoted(text, quote).map(Value::String);
    }
    Ok(match text {
        "" | "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => parse_number(text).unwrap_or_else(|| Value::String(text.to_string())),
    })
}

fn parse_quoted(text: &str, quote: char) -> Result<String, SyntaxErrorKind> {
    let mut out = String::new();
    let mut chars = text[quote.len_utf8()..].chars();
    loop {
        match chars.next() {
            None => return Err(SyntaxErrorKind::UnterminatedString),
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(c) => out.push(c),
                None => return Err(SyntaxErrorKind::UnterminatedString),
            },
            Some(c) if c == quote => break,
            Some(c) => out.push(c),
        }
    }
    let rest = chars.as_str().trim();
    if !rest.is_empty() && !rest.starts_with('#') {
        return Err(SyntaxErrorKind::MalformedLine(text.to_string()));
    }
    Ok(out)
}

fn parse_number(text: &str) -> Option<Value> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || frac_part.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    if frac_part.is_none() {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Value::Number(n.into()));
        }
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
