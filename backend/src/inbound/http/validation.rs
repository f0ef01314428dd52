//! Shared validation helpers for the HTTP handlers.

use std::str::FromStr;

use serde_json::json;

use crate::domain::Error;

/// Validation error codes carried in `details.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    InvalidUuid,
    InvalidNumber,
}

impl ValidationCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidNumber => "invalid_number",
        }
    }
}

/// JSON field name reported back to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    Error::invalid_request(format!("missing required field: {}", field.as_str())).with_details(
        json!({
            "field": field.as_str(),
            "code": ValidationCode::MissingField.as_str(),
        }),
    )
}

/// Unwrap a required request field.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse an identifier from a path segment or body field.
pub(crate) fn parse_id<T: FromStr>(raw: &str, field: FieldName) -> Result<T, Error> {
    raw.trim().parse::<T>().map_err(|_| {
        Error::invalid_request(format!("{} must be a valid UUID", field.as_str())).with_details(
            json!({
                "field": field.as_str(),
                "value": raw,
                "code": ValidationCode::InvalidUuid.as_str(),
            }),
        )
    })
}

/// Parse a decimal amount from a query parameter.
pub(crate) fn parse_amount<T: FromStr>(raw: &str, field: FieldName) -> Result<T, Error> {
    raw.trim().parse::<T>().map_err(|_| {
        Error::invalid_request(format!("{} must be a decimal number", field.as_str()))
            .with_details(json!({
                "field": field.as_str(),
                "value": raw,
                "code": ValidationCode::InvalidNumber.as_str(),
            }))
    })
}
