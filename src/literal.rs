//! Python literal syntax for values written into the settings module.

use std::fmt;

use serde_json::Value;

/// A setting value after type inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedLiteral {
    Boolean(bool),
    Integer(u64),
    StringTuple(Vec<String>),
    String(String),
}

impl TypedLiteral {
    /// Infers the literal type of a raw variable value.
    ///
    /// Checked in order: list-valued field, boolean, plain decimal integer,
    /// string. Numbers with a leading zero (`007`) or too large for `u64`
    /// stay strings so that no digits are lost.
    pub fn classify(value: &str, is_list_field: bool) -> Self {
        if is_list_field {
            return Self::StringTuple(value.split(',').map(str::to_string).collect());
        }
        if let Some(b) = crate::env::parse_bool(value) {
            return Self::Boolean(b);
        }
        if is_plain_integer(value) {
            if let Ok(n) = value.parse() {
                return Self::Integer(n);
            }
        }
        Self::String(value.to_string())
    }
}

fn is_plain_integer(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_digit())
        && (value == "0" || !value.starts_with('0'))
}

impl fmt::Display for TypedLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedLiteral::Boolean(b) => f.write_str(py_bool(*b)),
            TypedLiteral::Integer(n) => write!(f, "{n}"),
            TypedLiteral::StringTuple(items) => f.write_str(&py_tuple(items)),
            TypedLiteral::String(s) => f.write_str(&double_quoted(s)),
        }
    }
}

pub fn py_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// `"value"` with backslashes and double quotes escaped.
pub fn double_quoted(s: &str) -> String {
    format!("\"{}\"", escape(s, '"'))
}

/// `'value'` with backslashes and single quotes escaped, as Python's
/// `repr` writes strings.
pub fn single_quoted(s: &str) -> String {
    format!("'{}'", escape(s, '\''))
}

fn escape(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// A tuple of strings; one-element tuples keep their trailing comma.
pub fn py_tuple<S: AsRef<str>>(items: &[S]) -> String {
    let parts: Vec<String> = items.iter().map(|s| single_quoted(s.as_ref())).collect();
    match parts.len() {
        1 => format!("({},)", parts[0]),
        _ => format!("({})", parts.join(", ")),
    }
}

pub fn py_list<S: AsRef<str>>(items: &[S]) -> String {
    let parts: Vec<String> = items.iter().map(|s| double_quoted(s.as_ref())).collect();
    format!("[{}]", parts.join(", "))
}

/// Renders parsed JSON as the equivalent Python literal.
pub fn py_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(b) => py_bool(*b).to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => single_quoted(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(py_value).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", single_quoted(k), py_value(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}
