//! Shared validation helpers for inbound HTTP adapters.
//!
//! Path segments and payload identifiers arrive as strings. Parsing them here
//! keeps a malformed id a `400` with structured details instead of a generic
//! extractor failure.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) const UNIT_ID: FieldName = FieldName::new("unit_id");
pub(crate) const GROUP_SET_ID: FieldName = FieldName::new("group_set_id");
pub(crate) const GROUP_ID: FieldName = FieldName::new("group_id");
pub(crate) const PROJECT_ID: FieldName = FieldName::new("project_id");

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("missing required field: {field}")).with_details(json!({
        "field": field,
        "code": ErrorCode::MissingField.as_str(),
    }))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": ErrorCode::InvalidUuid.as_str(),
    }))
}

/// Parse a typed identifier, reporting the offending field on failure.
pub(crate) fn parse_id<T: FromStr>(value: &str, field: FieldName) -> Result<T, Error> {
    value
        .parse::<T>()
        .map_err(|_| invalid_uuid_error(field, value))
}

/// Deserialize a present field as `Some`, so that `Option<Option<T>>`
/// distinguishes an explicit `null` from an absent key.
pub(crate) fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode as DomainErrorCode, UnitId};
    use rstest::rstest;
    use serde_json::Value;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_present")]
        capacity: Option<Option<u32>>,
    }

    #[rstest]
    fn parse_id_accepts_uuid() {
        let id: UnitId = parse_id("3fa85f64-5717-4562-b3fc-2c963f66afa6", UNIT_ID)
            .expect("valid unit id");
        assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[rstest]
    fn parse_id_reports_field_and_value() {
        let err = parse_id::<UnitId>("nope", UNIT_ID).expect_err("invalid id");
        assert_eq!(err.code(), DomainErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details.get("field").and_then(Value::as_str), Some("unit_id"));
        assert_eq!(details.get("value").and_then(Value::as_str), Some("nope"));
        assert_eq!(
            details.get("code").and_then(Value::as_str),
            Some("invalid_uuid")
        );
    }

    #[rstest]
    fn missing_field_names_the_field() {
        let err = missing_field_error(FieldName::new("name"));
        assert_eq!(err.message(), "missing required field: name");
    }

    #[rstest]
    #[case(r#"{}"#, None)]
    #[case(r#"{"capacity":null}"#, Some(None))]
    #[case(r#"{"capacity":4}"#, Some(Some(4)))]
    fn present_fields_are_distinguished_from_absent(
        #[case] raw: &str,
        #[case] expected: Option<Option<u32>>,
    ) {
        let patch: Patch = serde_json::from_str(raw).expect("patch parses");
        assert_eq!(patch.capacity, expected);
    }
}
