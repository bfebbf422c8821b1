//! Shared validation helpers for inbound HTTP adapters.
//!
//! Domain constructors return typed validation errors; these helpers turn
//! them into `invalid_request` errors whose details name the offending field.

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    AccountValidationError, Error, LoginValidationError, ShipmentStatus, ShipmentValidationError,
    ZipCode,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidTimestamp,
    InvalidValue,
    EmptyUpdate,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidValue => "invalid_value",
            Self::EmptyUpdate => "empty_update",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn field_value_error(
    field: FieldName,
    code: ErrorCode,
    message: impl Into<String>,
    value: &str,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        field_value_error(
            field,
            ErrorCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
            value,
        )
    })
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|timestamp| timestamp.with_timezone(&Utc))
                .map_err(|_| {
                    field_value_error(
                        field,
                        ErrorCode::InvalidTimestamp,
                        format!("{} must be an RFC 3339 timestamp", field.as_str()),
                        &raw,
                    )
                })
        })
        .transpose()
}

pub(crate) fn parse_zip_code(value: i64, field: FieldName) -> Result<ZipCode, Error> {
    ZipCode::new(value).map_err(|error| account_field_error(field, &error))
}

pub(crate) fn parse_zip_codes(values: Vec<i64>, field: FieldName) -> Result<Vec<ZipCode>, Error> {
    values
        .into_iter()
        .map(|value| parse_zip_code(value, field))
        .collect()
}

pub(crate) fn parse_optional_status(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<ShipmentStatus>, Error> {
    value
        .map(|raw| {
            raw.parse::<ShipmentStatus>().map_err(|error| {
                field_value_error(field, ErrorCode::InvalidValue, error.to_string(), &raw)
            })
        })
        .transpose()
}

fn account_field_error(field: FieldName, error: &AccountValidationError) -> Error {
    field_error(field, ErrorCode::InvalidValue, error.to_string())
}

/// Map an account validation failure onto the request field it concerns.
pub(crate) fn map_account_validation_error(error: AccountValidationError) -> Error {
    let field = match error {
        AccountValidationError::EmptyName | AccountValidationError::NameTooLong { .. } => "name",
        AccountValidationError::InvalidEmail => "email",
        AccountValidationError::PasswordTooShort { .. } => "password",
        AccountValidationError::InvalidZipCode { .. } => "zipCode",
        AccountValidationError::EmptyAddress => "address",
        AccountValidationError::NoServiceableZipCodes => "serviceableZipCodes",
        AccountValidationError::ZeroCapacity => "maxHandlingCapacity",
        AccountValidationError::EmptyProfileUpdate => {
            return Error::invalid_request(error.to_string())
                .with_details(json!({ "code": ErrorCode::EmptyUpdate.as_str() }));
        }
    };
    account_field_error(FieldName::new(field), &error)
}

pub(crate) fn map_shipment_validation_error(error: ShipmentValidationError) -> Error {
    let field = match error {
        ShipmentValidationError::EmptyContent | ShipmentValidationError::ContentTooLong { .. } => {
            "content"
        }
        ShipmentValidationError::InvalidWeight { .. } | ShipmentValidationError::TooHeavy { .. } => {
            "weight"
        }
        ShipmentValidationError::EmptyDescription => "description",
        ShipmentValidationError::EmptyUpdate => {
            return Error::invalid_request(error.to_string())
                .with_details(json!({ "code": ErrorCode::EmptyUpdate.as_str() }));
        }
    };
    field_error(FieldName::new(field), ErrorCode::InvalidValue, error.to_string())
}

pub(crate) fn map_login_validation_error(error: LoginValidationError) -> Error {
    let field = match error {
        LoginValidationError::InvalidEmail => "email",
        LoginValidationError::EmptyPassword => "password",
    };
    field_error(FieldName::new(field), ErrorCode::InvalidValue, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::Value;

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a str> {
        error.details()?.get(key).and_then(Value::as_str)
    }

    #[rstest]
    fn invalid_uuid_reports_field_and_value() {
        let error = parse_uuid("abc", FieldName::new("id")).expect_err("not a uuid");

        assert_eq!(error.message(), "id must be a valid UUID");
        assert_eq!(detail(&error, "field"), Some("id"));
        assert_eq!(detail(&error, "value"), Some("abc"));
        assert_eq!(detail(&error, "code"), Some("invalid_uuid"));
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some("2026-03-01T10:00:00Z"), true)]
    #[case(Some("2026-03-01T10:00:00+02:00"), true)]
    #[case(Some("tomorrow"), false)]
    fn timestamps_parse_as_rfc3339(#[case] raw: Option<&str>, #[case] ok: bool) {
        let parsed = parse_optional_rfc3339_timestamp(
            raw.map(str::to_owned),
            FieldName::new("estimatedDelivery"),
        );
        assert_eq!(parsed.is_ok(), ok);
    }

    #[rstest]
    #[case("out_for_delivery", true)]
    #[case("OutForDelivery", false)]
    #[case("lost", false)]
    fn statuses_parse_from_snake_case(#[case] raw: &str, #[case] ok: bool) {
        let parsed = parse_optional_status(Some(raw.to_owned()), FieldName::new("status"));
        assert_eq!(parsed.is_ok(), ok);
        if let Err(error) = parsed {
            assert_eq!(detail(&error, "value"), Some(raw));
        }
    }

    #[rstest]
    fn zip_code_errors_name_the_field() {
        let error =
            parse_zip_codes(vec![11001, 0], FieldName::new("serviceableZipCodes")).expect_err("zero");
        assert_eq!(detail(&error, "field"), Some("serviceableZipCodes"));
    }

    #[rstest]
    #[case(AccountValidationError::InvalidEmail, Some("email"))]
    #[case(AccountValidationError::ZeroCapacity, Some("maxHandlingCapacity"))]
    #[case(AccountValidationError::EmptyProfileUpdate, None)]
    fn account_errors_map_to_fields(
        #[case] error: AccountValidationError,
        #[case] field: Option<&str>,
    ) {
        let mapped = map_account_validation_error(error);
        assert_eq!(mapped.code(), crate::domain::ErrorCode::InvalidRequest);
        assert_eq!(detail(&mapped, "field"), field);
    }

    #[rstest]
    fn empty_shipment_update_keeps_domain_message() {
        let mapped = map_shipment_validation_error(ShipmentValidationError::EmptyUpdate);
        assert_eq!(mapped.message(), "no data to update");
        assert_eq!(detail(&mapped, "code"), Some("empty_update"));
    }
}
