//! Tests for domain error construction and serialisation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("x"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("x"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("x"), ErrorCode::Forbidden)]
#[case(Error::not_found("x"), ErrorCode::NotFound)]
#[case(Error::not_acceptable("x"), ErrorCode::NotAcceptable)]
#[case(Error::conflict("x"), ErrorCode::Conflict)]
#[case(Error::service_unavailable("x"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("x"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn new_has_no_trace_id_out_of_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id.parse().expect("valid UUID");
    let error = TraceId::scope(trace_id, async move { Error::conflict("stale") }).await;

    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
fn serialises_camel_case_without_empty_fields() {
    let value = serde_json::to_value(Error::not_acceptable("no partner")).expect("serialise");

    assert_eq!(
        value,
        json!({ "code": "not_acceptable", "message": "no partner" })
    );
}

#[rstest]
fn round_trips_details_and_trace_id(expected_trace_id: String) {
    let error = Error::invalid_request("bad")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "field": "weight" }));

    let encoded = serde_json::to_string(&error).expect("serialise");
    assert!(encoded.contains("\"traceId\""));
    let decoded: Error = serde_json::from_str(&encoded).expect("deserialise");

    assert_eq!(decoded, error);
    assert_eq!(decoded.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
fn display_includes_code_and_message() {
    assert_eq!(
        Error::forbidden("sellers only").to_string(),
        "forbidden: sellers only"
    );
}
