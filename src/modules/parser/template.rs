//! Argument placeholder substitution for data modules

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// Regex pattern for argument placeholders: {{ args.argName }}
static ARG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*args\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

/// A string that is exactly one placeholder, so the argument keeps its JSON type
static EXACT_ARG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\{\{\s*args\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}\s*$").unwrap());

/// Stands in for `{{` inside substituted argument text until the leaf is finished
const ESCAPED_OPEN: &str = "{\u{E000}{";

/// Substitute argument placeholders anywhere inside `value`
///
/// Placeholders naming arguments that are not present are left untouched so a
/// nested field can fill them from its own arguments later. Text that came
/// from an argument is never expanded again; [`finish_leaf`] restores it.
pub fn substitute(value: &Value, args: &Map<String, Value>) -> Value {
    match value {
        Value::String(s) => substitute_str(s, args),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, args)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, args)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn substitute_str(s: &str, args: &Map<String, Value>) -> Value {
    if let Some(cap) = EXACT_ARG_PATTERN.captures(s) {
        return match args.get(&cap[1]) {
            Some(value) => escape(value),
            None => Value::String(s.to_string()),
        };
    }

    if !has_placeholders(s) {
        return Value::String(s.to_string());
    }

    let replaced = ARG_PATTERN.replace_all(s, |cap: &Captures| match args.get(&cap[1]) {
        Some(Value::String(text)) => escape_str(text),
        Some(value) => escape_str(&value.to_string()),
        None => cap[0].to_string(),
    });
    Value::String(replaced.into_owned())
}

fn escape(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_str(s)),
        Value::Array(items) => Value::Array(items.iter().map(escape).collect()),
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), escape(v))).collect()),
        other => other.clone(),
    }
}

fn escape_str(s: &str) -> String {
    s.replace("{{", ESCAPED_OPEN)
}

/// Finish a value that is about to be returned to a client
///
/// A string that is exactly one unfilled placeholder becomes `null`, unfilled
/// placeholders inside longer strings are removed, and argument text is
/// restored verbatim.
pub fn finish_leaf(value: Value) -> Value {
    match value {
        Value::String(s) if EXACT_ARG_PATTERN.is_match(&s) => Value::Null,
        Value::String(s) => {
            let stripped = ARG_PATTERN.replace_all(&s, "");
            Value::String(stripped.replace(ESCAPED_OPEN, "{{"))
        }
        Value::Array(items) => Value::Array(items.into_iter().map(finish_leaf).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, finish_leaf(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Check if a string contains argument placeholders
pub fn has_placeholders(content: &str) -> bool {
    ARG_PATTERN.is_match(content)
}

/// Extract all argument names referenced by a value
pub fn extract_arg_names(value: &Value) -> Vec<String> {
    let mut names = Vec::new();
    collect_arg_names(value, &mut names);
    names
}

fn collect_arg_names(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for cap in ARG_PATTERN.captures_iter(s) {
                let name = cap[1].to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_arg_names(v, names)),
        Value::Object(map) => map.values().for_each(|v| collect_arg_names(v, names)),
        _ => {}
    }
}
