//! Boundary conversion: identity, idempotence and cause preservation.

use std::{any::Any, error::Error};

use keystone::error::{
    AppError, ErrorKind, NotFoundMeta, catch_failure, convert::UNKNOWN_ERROR_MESSAGE,
    is_app_error, to_app_error,
};

#[derive(Debug, thiserror::Error)]
#[error("upstream refused: {0}")]
struct UpstreamError(u16);

type BoxError = Box<dyn Error + Send + Sync>;

fn inputs() -> Vec<Box<dyn Any + Send>> {
    let boxed: BoxError = Box::new(UpstreamError(503));
    let mut inputs: Vec<Box<dyn Any + Send>> = Vec::new();
    inputs.push(Box::new(AppError::validation("Validation error", None)));
    inputs.push(Box::new(String::from("String error")));
    inputs.push(Box::new("boom"));
    inputs.push(Box::new(boxed));
    inputs.push(Box::new(std::io::Error::other("Regular error")));
    inputs.push(Box::new(17_i64));
    inputs
}

#[test]
fn conversion_is_idempotent() {
    for input in inputs() {
        let once = to_app_error(input);
        let twice = to_app_error(Box::new(once.clone()));
        assert!(AppError::ptr_eq(&once, &twice), "{once:?}");
        assert_eq!(once.to_record(), twice.to_record());
    }
}

#[test]
fn existing_error_is_the_same_instance() {
    let original = AppError::not_found("gone", NotFoundMeta::new("order", "o-42"));
    let id = original.id();
    let converted = to_app_error(Box::new(original.clone()));
    assert!(AppError::ptr_eq(&original, &converted));
    assert_eq!(converted.id(), id);
}

#[test]
fn boxed_app_error_is_unwrapped() {
    let original = AppError::not_found("gone", NotFoundMeta::new("order", "o-42"));
    let boxed: BoxError = Box::new(original.clone());
    let converted = to_app_error(Box::new(boxed));
    assert!(AppError::ptr_eq(&original, &converted));
    assert_eq!(converted.kind(), ErrorKind::NotFound);
    assert_eq!(converted.status_code(), 404);

    let wrapped = AppError::from_error(original.clone());
    assert!(AppError::ptr_eq(&original, &wrapped));
}

#[test]
fn question_mark_through_boxed_error_keeps_kind() {
    fn lookup_order() -> Result<(), BoxError> {
        Err(AppError::not_found("gone", NotFoundMeta::new("order", 7)).into())
    }

    fn handler() -> keystone::Result<()> {
        lookup_order()?;
        Ok(())
    }

    let err = handler().unwrap_err();
    assert!(err.is_type(ErrorKind::NotFound));
    assert_eq!(err.status_code(), 404);
    assert!(err.source().is_none());
}

#[test]
fn conversions_produce_expected_messages() {
    let messages: Vec<_> = inputs()
        .into_iter()
        .map(|input| {
            let err = to_app_error(input);
            (err.kind(), err.message().to_string())
        })
        .collect();

    assert_eq!(messages, [
        (ErrorKind::Validation, "Validation error".to_string()),
        (ErrorKind::Unknown, "String error".to_string()),
        (ErrorKind::Unknown, "boom".to_string()),
        (ErrorKind::Unknown, "upstream refused: 503".to_string()),
        (ErrorKind::Unknown, "Regular error".to_string()),
        (ErrorKind::Unknown, UNKNOWN_ERROR_MESSAGE.to_string()),
    ]);
}

#[test]
fn generic_failure_cause_is_chained() {
    let err = AppError::from_error(UpstreamError(502));
    assert!(err.is_type(ErrorKind::Unknown));
    let cause = err.source().expect("cause kept");
    assert_eq!(cause.downcast_ref::<UpstreamError>().map(|e| e.0), Some(502));
}

#[test]
fn question_mark_converts_foreign_errors() {
    fn parse(input: &str) -> keystone::Result<u32> {
        let n: u32 = serde_json::from_str(input)?;
        Ok(n)
    }

    assert_eq!(parse("5").unwrap(), 5);
    let err = parse("five").unwrap_err();
    assert!(err.is_type(ErrorKind::Unknown));
    assert!(err.source().is_some());
}

#[test]
fn only_constructed_errors_are_recognised() {
    assert!(is_app_error(&AppError::internal("x")));
    assert!(!is_app_error(&UpstreamError(500)));
    assert!(!is_app_error(&String::from("AppError")));
}

#[test]
fn panics_become_unknown_errors() {
    let result = catch_failure(|| -> keystone::Result<()> {
        let owned = String::from("worker crashed");
        std::panic::panic_any(owned)
    });
    let err = result.unwrap_err();
    assert_eq!(err.message(), "worker crashed");
    assert_eq!(err.status_code(), 500);
}
