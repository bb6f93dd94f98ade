//! Query predicates evaluated against stored documents.

use std::cmp::Ordering;

use serde_json::Value;

use crate::store::Document;

/// Structured query predicate handed verbatim to the storage engine
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every document
    All,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// Case-insensitive substring match on the field's text. `needle` is
    /// stored lowercased.
    Matches { field: String, needle: String },
    /// Case-sensitive equality on the field's text
    Exact { field: String, value: String },
    /// JSON equality
    Eq { field: String, value: Value },
    /// Array field contains an element equal to `value`
    Contains { field: String, value: Value },
    /// Array field contains an object whose `key` equals `value`
    ElemMatch {
        field: String,
        key: String,
        value: Value,
    },
}

impl Predicate {
    pub fn matches(field: impl Into<String>, needle: &str) -> Self {
        Self::Matches {
            field: field.into(),
            needle: needle.to_lowercase(),
        }
    }

    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Exact {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn elem_match(
        field: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::ElemMatch {
            field: field.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(predicate: Predicate) -> Self {
        Self::Not(Box::new(predicate))
    }

    /// Whether `document` satisfies this predicate
    pub fn evaluate(&self, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::And(predicates) => predicates.iter().all(|p| p.evaluate(document)),
            Self::Or(predicates) => predicates.iter().any(|p| p.evaluate(document)),
            Self::Not(predicate) => !predicate.evaluate(document),
            Self::Matches { field, needle } => lookup(document, field)
                .map(|value| any_text(value, &|text: &str| text.to_lowercase().contains(needle)))
                .unwrap_or(false),
            Self::Exact { field, value: expected } => lookup(document, field)
                .map(|value| any_text(value, &|text: &str| text == expected))
                .unwrap_or(false),
            Self::Eq { field, value } => lookup(document, field) == Some(value),
            Self::Contains { field, value } => match lookup(document, field) {
                Some(Value::Array(items)) => items.contains(value),
                _ => false,
            },
            Self::ElemMatch { field, key, value } => match lookup(document, field) {
                Some(Value::Array(items)) => items
                    .iter()
                    .any(|item| item.get(key.as_str()) == Some(value)),
                _ => false,
            },
        }
    }
}

/// Resolve a dotted field path inside a document
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Apply `test` to the textual form of a scalar, or to any element of an array
fn any_text(value: &Value, test: &dyn Fn(&str) -> bool) -> bool {
    match value {
        Value::String(text) => test(text),
        Value::Number(number) => test(&number.to_string()),
        Value::Bool(flag) => test(if *flag { "true" } else { "false" }),
        Value::Array(items) => items.iter().any(|item| any_text(item, test)),
        Value::Null | Value::Object(_) => false,
    }
}

/// Total order over JSON values used for sorting:
/// null < bool < number < string < array < object
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
