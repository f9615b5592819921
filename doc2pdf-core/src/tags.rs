//! Tag maps
//!
//! A tag map pairs placeholder names with replacement text. Names are
//! matched case-insensitively: the token looked up in the document is the
//! upper-cased name wrapped in [`TAG_OPEN`] / [`TAG_CLOSE`].

use serde_json::Value;
use thiserror::Error;

pub const TAG_OPEN: char = '{';
pub const TAG_CLOSE: char = '}';

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TagError {
    #[error("Field \"replacements\" must be a JSON object")]
    NotAnObject,

    #[error("Maximum number of replacements exceeded (maximum: {max})")]
    TooMany { max: usize },

    #[error("Invalid tag: '{0}' - tags must be non-empty and contain only letters, digits or underscores")]
    InvalidName(String),
}

/// Ordered tag → value pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagMap {
    entries: Vec<(String, String)>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from pairs, enforcing the name rules and the size limit.
    pub fn from_pairs<I, K, V>(pairs: I, max: usize) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = TagMap::new();
        for (name, value) in pairs {
            let name = name.into();
            validate_name(&name)?;
            map.entries.push((name, value.into()));
            if map.entries.len() > max {
                return Err(TagError::TooMany { max });
            }
        }
        Ok(map)
    }

    /// Build a map from a JSON object, coercing every value to text.
    pub fn from_json(value: &Value, max: usize) -> Result<Self, TagError> {
        let object = value.as_object().ok_or(TagError::NotAnObject)?;
        if object.len() > max {
            return Err(TagError::TooMany { max });
        }
        if object.is_empty() {
            tracing::warn!("Replacement map is empty, the document passes through unchanged");
        }

        Self::from_pairs(
            object.iter().map(|(name, value)| (name.clone(), value_text(value))),
            max,
        )
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TagError> {
        let name = name.into();
        validate_name(&name)?;
        self.entries.push((name, value.into()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// `(token, value)` pairs as they are searched for in run text.
    pub fn tokens(&self) -> Vec<(String, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (token_for(name), value.as_str()))
            .collect()
    }
}

/// Delimited, upper-cased token for a tag name: `nome` → `{NOME}`.
pub fn token_for(name: &str) -> String {
    format!("{TAG_OPEN}{}{TAG_CLOSE}", name.to_uppercase())
}

/// Text form of a JSON replacement value.
///
/// Strings are used verbatim. Everything else is written the way the
/// template authors see it in Python-backed tooling: `None`, `True`,
/// `False`, and list/dict literals such as `[1, 'a']`.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => literal(other),
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => float_text(f),
            _ => n.to_string(),
        },
        Value::String(s) => quoted(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}: {}", quoted(key), literal(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Shortest round-trip digits, positional for exponents in `-4..16` and
/// scientific (`1e+16`, `2.5e-07`) outside it.
fn float_text(value: f64) -> String {
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };

    if !(-4..16).contains(&exponent) {
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exp_sign}{:02}", exponent.abs());
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("{sign}0.{zeros}{digits}");
    }

    let point = exponent as usize + 1;
    if digits.len() > point {
        format!("{sign}{}.{}", &digits[..point], &digits[point..])
    } else {
        format!("{sign}{digits}{}.0", "0".repeat(point - digits.len()))
    }
}

/// Single-quoted string literal, double-quoted when that avoids escaping.
fn quoted(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn validate_name(name: &str) -> Result<(), TagError> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(TagError::InvalidName(name.to_string()))
    }
}
