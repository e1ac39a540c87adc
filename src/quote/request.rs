//! Inbound quote request and its validation.
//!
//! The shape check is the serde derive: a missing field or a value of the
//! wrong primitive type fails deserialization. The only logic on top is the
//! lax numeric coercion below.

use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::response::{IntoResponse, Json, Response};
use crate::status::Status;

/// A validated quote request. Unknown extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuoteRequest {
    pub zip_code: String,
    #[serde(deserialize_with = "lax_float")]
    pub income: f64,
    #[serde(deserialize_with = "lax_int")]
    pub age: i64,
    #[serde(deserialize_with = "lax_int")]
    pub household_size: i64,
    pub health_conditions: Vec<String>,
}

impl QuoteRequest {
    /// Parses and validates a JSON request body.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(body).map_err(|e| {
            if e.is_data() {
                ValidationError::Shape(e)
            } else {
                ValidationError::Syntax(e)
            }
        })
    }
}

/// The inbound payload is not a well-formed quote request.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Not JSON at all, or truncated (including an empty body).
    #[error("invalid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Valid JSON whose fields are missing or of the wrong type.
    #[error("{0}")]
    Shape(#[source] serde_json::Error),
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "json_invalid",
            Self::Shape(_) => "value_error",
        }
    }
}

/// `422 Unprocessable Content` with a `detail` list describing the problem.
impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        Json(serde_json::json!({
            "detail": [{
                "type": self.kind(),
                "loc": ["body"],
                "msg": self.to_string(),
            }]
        }))
        .with_status(Status::UnprocessableContent)
    }
}

// ── Lax numeric coercion ──────────────────────────────────────────────────────

/// Integers, whole floats (`30.0`) and integer strings (`"30"`).
fn lax_int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    const EXPECTED: &str = "an integer";
    match Value::deserialize(d)? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                Some(f) => Err(de::Error::invalid_value(Unexpected::Float(f), &EXPECTED)),
                None => Err(de::Error::custom("integer out of range")),
            }
        }
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&s), &EXPECTED)),
        other => Err(de::Error::invalid_type(unexpected(&other), &EXPECTED)),
    }
}

/// Any JSON number, or a string holding one.
fn lax_float<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    const EXPECTED: &str = "a number";
    match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64().ok_or_else(|| de::Error::custom("number out of range")),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(f),
            _ => Err(de::Error::invalid_value(Unexpected::Str(&s), &EXPECTED)),
        },
        other => Err(de::Error::invalid_type(unexpected(&other), &EXPECTED)),
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}
