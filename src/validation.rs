//! Field rules for trip payloads.
//!
//! Payloads arrive as raw JSON so that every failing field can be reported at
//! once instead of stopping at the first serde error. Unknown keys (including
//! `id` and `createdAt`) are ignored and never reach the store.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::trip::{TripInput, TripPatch};

pub const MAX_TEXT_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Fields(Vec<FieldError>),
    EmptyUpdate,
}

pub fn validate_trip(payload: &Value) -> Result<TripInput, ValidationError> {
    let object = as_object(payload)?;
    let mut errors = Vec::new();

    let title = required(object, "title", &mut errors, text);
    let destination = required(object, "destination", &mut errors, text);
    let days = required(object, "days", &mut errors, positive_int);
    let budget = required(object, "budget", &mut errors, positive_number);

    match (title, destination, days, budget) {
        (Some(title), Some(destination), Some(days), Some(budget)) if errors.is_empty() => {
            Ok(TripInput {
                title,
                destination,
                days,
                budget,
            })
        }
        _ => Err(ValidationError::Fields(errors)),
    }
}

/// Same rules as [`validate_trip`] with every field optional. Field errors
/// win over the empty check, so `{"days": 0}` is a field error and `{}` is
/// `EmptyUpdate`.
pub fn validate_patch(payload: &Value) -> Result<TripPatch, ValidationError> {
    let object = as_object(payload)?;
    let mut errors = Vec::new();

    let patch = TripPatch {
        title: optional(object, "title", &mut errors, text),
        destination: optional(object, "destination", &mut errors, text),
        days: optional(object, "days", &mut errors, positive_int),
        budget: optional(object, "budget", &mut errors, positive_number),
    };

    if !errors.is_empty() {
        return Err(ValidationError::Fields(errors));
    }
    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }
    Ok(patch)
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    payload.as_object().ok_or_else(|| {
        ValidationError::Fields(vec![FieldError::new(
            "body",
            "expected a JSON object",
        )])
    })
}

type Rule<T> = fn(&str, &Value) -> Result<T, FieldError>;

fn required<T>(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
    rule: Rule<T>,
) -> Option<T> {
    match object.get(field) {
        Some(value) => check(field, value, errors, rule),
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
    }
}

fn optional<T>(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
    rule: Rule<T>,
) -> Option<T> {
    object
        .get(field)
        .and_then(|value| check(field, value, errors, rule))
}

fn check<T>(field: &str, value: &Value, errors: &mut Vec<FieldError>, rule: Rule<T>) -> Option<T> {
    match rule(field, value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

fn text(field: &str, value: &Value) -> Result<String, FieldError> {
    let Value::String(raw) = value else {
        return Err(FieldError::new(field, "must be a string"));
    };
    match raw.chars().count() {
        0 => Err(FieldError::new(field, "is required")),
        len if len > MAX_TEXT_LEN => Err(FieldError::new(
            field,
            format!("must be at most {MAX_TEXT_LEN} characters"),
        )),
        _ => Ok(raw.clone()),
    }
}

fn positive_int(field: &str, value: &Value) -> Result<i64, FieldError> {
    let Value::Number(number) = value else {
        return Err(FieldError::new(field, "must be a number"));
    };
    // 3.0 is an integer on the wire as far as JSON clients are concerned.
    let parsed = match number.as_i64() {
        Some(int) => Some(int),
        None => number
            .as_f64()
            .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
            .map(|float| float as i64),
    };
    match parsed {
        Some(int) if int > 0 => Ok(int),
        Some(_) => Err(FieldError::new(field, "must be positive")),
        None if number.as_f64().is_some_and(|float| float <= 0.0) => {
            Err(FieldError::new(field, "must be positive"))
        }
        None => Err(FieldError::new(field, "must be an integer")),
    }
}

fn positive_number(field: &str, value: &Value) -> Result<f64, FieldError> {
    let Value::Number(number) = value else {
        return Err(FieldError::new(field, "must be a number"));
    };
    match number.as_f64() {
        Some(float) if float.is_finite() && float > 0.0 => Ok(float),
        _ => Err(FieldError::new(field, "must be positive")),
    }
}
