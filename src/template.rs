//! `##key##` / `##key.path##` substitution engine.
//!
//! Token syntax is `##<expr>##`. A bare identifier (`##secret1##`) is
//! replaced with the entire substitution source, verbatim. A dotted
//! path (`##secret1.key##`) discards the first segment — it is a label,
//! not a lookup — and uses the second segment as a top-level key into
//! the source parsed as a JSON object. Tokens are independent: a JSON
//! parse failure or a missing key empties only that token, the rest of
//! the template still renders (no sticky abort flag).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"##(.*?)##").unwrap());

/// Render `template`, substituting every `##expr##` token against `source`.
pub fn substitute(template: &str, source: &str) -> String {
    TOKEN_RE
        .replace_all(template, |caps: &regex::Captures| {
            let expr = caps[1].trim();
            render_token(expr, source)
        })
        .into_owned()
}

fn render_token(expr: &str, source: &str) -> String {
    let mut parts = expr.splitn(2, '.');
    let _label = parts.next();
    let key = match parts.next() {
        Some(k) => k.trim(),
        // No dot in the expression: the whole source is the value.
        None => return source.to_string(),
    };

    let parsed: Value = match serde_json::from_str(source) {
        Ok(v) => v,
        // Source is not JSON but a dot-path was requested: this token
        // renders empty, the rest of the template keeps rendering.
        Err(_) => return String::new(),
    };

    let Some(object) = parsed.as_object() else {
        return String::new();
    };

    match object.get(key) {
        Some(value) => render_value(value),
        None => String::new(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => {
            tracing::warn!("template token resolved to a nested array/object; rendering empty");
            String::new()
        }
    }
}

/// Split a `"HeaderName: value-with-##tokens##"` template on the first
/// colon, trim both sides, substitute the value against `source`, and
/// return `(header_name, header_value)`.
///
/// Fails if the template does not contain exactly one colon.
pub fn header_from_template(
    header_template: &str,
    source: &str,
) -> Result<(String, String), String> {
    let parts: Vec<&str> = header_template.splitn(2, ':').collect();
    if parts.len() != 2 || header_template.matches(':').count() != 1 {
        return Err(format!("header template '{header_template}' is not valid"));
    }
    let name = parts[0].trim().to_string();
    let value_template = parts[1].trim();
    let value = substitute(value_template, source);
    Ok((name, value))
}
