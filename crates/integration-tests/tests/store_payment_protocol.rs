//! Integration tests for payment gateway response interpretation.
//!
//! The gateway answers with `data`/`errors` envelopes where `data` degrades
//! to an empty array on failure; these tests pin the interpretation of every
//! shape the store must survive.

#![allow(clippy::unwrap_used)]

use blood_orange_store::services::payment::{
    CallbackStatus, GatewayError, VerifyOutcome, parse_request_response, parse_verify_response,
};
use serde_json::json;

// =============================================================================
// Payment request responses
// =============================================================================

#[test]
fn test_accepted_request_yields_authority() {
    let body = json!({
        "data": {
            "code": 100,
            "message": "Success",
            "authority": "A00000000000000000000000000217885159",
            "fee_type": "Merchant",
            "fee": 100
        },
        "errors": []
    });

    let authority = parse_request_response(&body).unwrap();
    assert_eq!(authority.authority, "A00000000000000000000000000217885159");
}

#[test]
fn test_declined_request_carries_gateway_code() {
    let body = json!({"data": {"code": -11, "message": "Request failed"}, "errors": []});

    match parse_request_response(&body) {
        Err(GatewayError::Rejected { code }) => assert_eq!(code, -11),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn test_error_envelope_with_empty_data_array() {
    let body = json!({
        "data": [],
        "errors": {"code": -9, "message": "The input params invalid", "validations": []}
    });

    match parse_request_response(&body) {
        Err(GatewayError::Rejected { code }) => assert_eq!(code, -9),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn test_unrecognized_body_is_invalid_response() {
    for body in [json!({}), json!({"data": {"message": "no code"}}), json!(null)] {
        assert!(matches!(
            parse_request_response(&body),
            Err(GatewayError::InvalidResponse(_))
        ));
    }
}

// =============================================================================
// Verify responses
// =============================================================================

#[test]
fn test_verified_payment() {
    let body = json!({"data": {"code": 100, "ref_id": 201, "card_pan": "5022****"}, "errors": []});
    assert_eq!(
        parse_verify_response(&body).unwrap(),
        VerifyOutcome::Verified { ref_id: 201 }
    );
}

/// Code 101 means a duplicate delivery of a successful callback: success is
/// reported but no side effects may be re-applied.
#[test]
fn test_already_verified_is_distinct_from_verified() {
    let body = json!({"data": {"code": 101, "ref_id": 201}, "errors": []});
    assert_eq!(
        parse_verify_response(&body).unwrap(),
        VerifyOutcome::AlreadyVerified { ref_id: 201 }
    );
}

#[test]
fn test_any_other_code_is_failure() {
    let body = json!({"data": {"code": -53}, "errors": []});
    assert_eq!(
        parse_verify_response(&body).unwrap(),
        VerifyOutcome::Failed { code: -53 }
    );
}

#[test]
fn test_verify_error_envelope_is_failure() {
    let body = json!({"data": [], "errors": {"code": -54, "message": "invalid authority"}});
    assert_eq!(
        parse_verify_response(&body).unwrap(),
        VerifyOutcome::Failed { code: -54 }
    );
}

#[test]
fn test_malformed_verify_body_is_invalid_response() {
    let body = json!({"data": {"code": 100}});
    assert!(matches!(
        parse_verify_response(&body),
        Err(GatewayError::InvalidResponse(_))
    ));
}

// =============================================================================
// Callback status
// =============================================================================

#[test]
fn test_callback_status_values() {
    assert_eq!("OK".parse::<CallbackStatus>().unwrap(), CallbackStatus::Ok);
    assert_eq!("NOK".parse::<CallbackStatus>().unwrap(), CallbackStatus::Nok);
    assert!("YES".parse::<CallbackStatus>().is_err());
}
