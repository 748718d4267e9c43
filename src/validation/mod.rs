//! Request validation.
//!
//! Every operation input is a schema type: a `Deserialize` struct whose serde attributes declare
//! the coercions (see [`coerce`]) and whose `validator` attributes declare the constraints (see
//! [`rules`]). [`validate`] runs both passes over untrusted JSON and returns either the typed value
//! or a [`ValidationError`] listing the failing fields by their wire (camelCase) path.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::collections::HashMap;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub mod coerce;
pub mod rules;

/// FieldError
///
/// One violated constraint: the field path as the client sent it and a readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, TS)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// ValidationError
///
/// All violations found for one input, sorted by field path. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid input: {}", summary(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    /// True if any violation was reported against `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// validate
///
/// Parses `raw` into the schema type `T`, applying its declared coercions, then checks its
/// declared constraints. Pure: no I/O, no state.
pub fn validate<T>(raw: Value) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_path_to_error::deserialize(raw).map_err(from_serde)?;
    value.validate().map_err(from_validator)?;
    Ok(value)
}

/// validate_json
///
/// Request-body entry point. An empty body is read as `{}` so schemas made only of optional
/// fields accept a bare `POST`.
pub fn validate_json<T>(body: &[u8]) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let raw = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ValidationError::single("body", format!("malformed JSON: {e}")))?
    };
    validate(raw)
}

/// validate_query
///
/// Query-string entry point. Every value arrives as a string; numeric fields rely on
/// [`coerce::number`] and friends to parse them.
pub fn validate_query<T>(params: HashMap<String, String>) -> Result<T, ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let raw = params
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect::<Map<_, _>>();
    validate(Value::Object(raw))
}

/// parse_id
///
/// Validates an identifier taken from the URL path.
pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, ValidationError> {
    coerce::parse_identifier(raw)
        .ok_or_else(|| ValidationError::single(field, rules::INVALID_IDENTIFIER))
}

fn from_serde(err: serde_path_to_error::Error<serde_json::Error>) -> ValidationError {
    let path = err.path().to_string();
    let message = err.inner().to_string();

    // serde reports a missing field against its parent; point at the field itself.
    if let Some(name) = missing_field(&message) {
        let field = if path == "." {
            name.to_string()
        } else {
            format!("{path}.{name}")
        };
        return ValidationError::single(field, "is required");
    }

    let field = if path == "." { "body".to_string() } else { path };
    ValidationError::single(field, message)
}

fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

fn from_validator(errors: validator::ValidationErrors) -> ValidationError {
    let mut out = Vec::new();
    for (field, violations) in errors.field_errors() {
        let field = camel_case(&field);
        for violation in violations.iter() {
            out.push(FieldError {
                field: field.clone(),
                message: describe(violation),
            });
        }
    }
    out.sort_by(|a, b| a.field.cmp(&b.field));
    ValidationError { errors: out }
}

fn describe(violation: &validator::ValidationError) -> String {
    if let Some(message) = &violation.message {
        return message.to_string();
    }
    let param = |name: &str| violation.params.get(name).map(|v| v.to_string());
    match &*violation.code {
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("length must be between {min} and {max}"),
            (Some(min), None) => format!("length must be at least {min}"),
            (None, Some(max)) => format!("length must be at most {max}"),
            (None, None) => "invalid length".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (Some(min), None) => format!("must be at least {min}"),
            (None, Some(max)) => format!("must be at most {max}"),
            (None, None) => "out of range".to_string(),
        },
        "email" => "must be a valid email address".to_string(),
        "url" => "must be a valid URL".to_string(),
        other => other.to_string(),
    }
}

/// Schema structs are `rename_all = "camelCase"`, so error paths use the same spelling.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
