use serde_json::Value;

use crate::error::PredicateError;
use crate::message::PeekedMessage;

/// Where an order-style field lives on a message: a custom property checked
/// first, then a dotted path into the JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub attribute: String,
    pub path: String,
}

impl FieldSpec {
    pub fn new(attribute: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            path: path.into(),
        }
    }
}

/// Caller-supplied lookup keys. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupQuery {
    pub message_id: Option<String>,
    pub field_value: Option<String>,
}

impl LookupQuery {
    pub fn by_message_id(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            field_value: None,
        }
    }

    pub fn by_field(value: impl Into<String>) -> Self {
        Self {
            message_id: None,
            field_value: Some(value.into()),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// How a message satisfied a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    Identifier,
    Attribute,
    /// Matched inside the structured body; carries the parsed document.
    Body(Value),
}

/// Immutable lookup condition evaluated against peeked messages.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchPredicate {
    ById(String),
    ByField { field: FieldSpec, value: String },
    /// Either key may match; the identifier is tried first.
    ByIdOrField {
        id: String,
        field: FieldSpec,
        value: String,
    },
}

impl MatchPredicate {
    pub fn by_id(value: impl Into<String>) -> Result<Self, PredicateError> {
        let value = value.into();
        if value.is_empty() {
            return Err(PredicateError::EmptyMessageId);
        }
        Ok(MatchPredicate::ById(value))
    }

    pub fn by_field(field: FieldSpec, value: impl Into<String>) -> Self {
        MatchPredicate::ByField {
            field,
            value: value.into(),
        }
    }

    /// Build the predicate for a lookup request. Fails when neither key is
    /// supplied, before any scan begins.
    pub fn from_query(query: &LookupQuery, field: &FieldSpec) -> Result<Self, PredicateError> {
        match (present(&query.message_id), present(&query.field_value)) {
            (Some(id), Some(value)) => Ok(MatchPredicate::ByIdOrField {
                id: id.to_string(),
                field: field.clone(),
                value: value.to_string(),
            }),
            (Some(id), None) => Self::by_id(id),
            (None, Some(value)) => Ok(Self::by_field(field.clone(), value)),
            (None, None) => Err(PredicateError::MissingLookupKey),
        }
    }

    pub fn matches(&self, message: &PeekedMessage) -> bool {
        self.evaluate(message).is_some()
    }

    /// Evaluate against one message. Unparseable bodies and missing paths
    /// evaluate to `None`; they are never errors.
    pub fn evaluate(&self, message: &PeekedMessage) -> Option<Match> {
        match self {
            MatchPredicate::ById(id) => match_id(message, id),
            MatchPredicate::ByField { field, value } => match_field(message, field, value),
            MatchPredicate::ByIdOrField { id, field, value } => {
                match_id(message, id).or_else(|| match_field(message, field, value))
            }
        }
    }
}

fn match_id(message: &PeekedMessage, id: &str) -> Option<Match> {
    eq_ignore_case(&message.message_id, id).then_some(Match::Identifier)
}

fn match_field(message: &PeekedMessage, field: &FieldSpec, value: &str) -> Option<Match> {
    // An equal property short-circuits; a differing one falls through to the body.
    if let Some(prop) = message.properties.get(&field.attribute) {
        if eq_ignore_case(&prop.to_string(), value) {
            return Some(Match::Attribute);
        }
    }

    let document: Value = match serde_json::from_slice(&message.body) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::trace!(seq = message.sequence_number, error = %e, "body is not JSON, skipping field match");
            return None;
        }
    };
    let found = select_path(&document, &field.path).and_then(render_scalar)?;
    eq_ignore_case(&found, value).then_some(Match::Body(document))
}

/// Extract the value at a dotted `path` from a JSON body, rendered as text.
/// Returns `None` when the body does not parse, the path is missing, or the
/// value is null or empty.
pub fn try_extract_field(body: &[u8], path: &str) -> Option<String> {
    let document: Value = serde_json::from_slice(body).ok()?;
    select_path(&document, path).and_then(render_scalar)
}

fn select_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(document, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn render_scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Case-insensitive comparison without allocating.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
