//! Normalising arbitrary failures into [`AppError`] at system boundaries.
//!
//! [`to_app_error`] accepts the same shape a panic payload has
//! (`Box<dyn Any + Send>`), so one function covers both `catch_unwind`
//! results and values a handler receives with no static type.

use std::{
    any::Any,
    panic::{self, UnwindSafe},
};

use super::{AppError, BoxError};

/// Message used when a failure carries nothing readable.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// `true` only for values built by this crate's constructors.
pub fn is_app_error(candidate: &dyn Any) -> bool {
    candidate.is::<AppError>()
}

/// Same check for a value already behind `dyn Error`.
pub fn is_app_error_source(candidate: &(dyn std::error::Error + 'static)) -> bool {
    candidate.is::<AppError>()
}

/// Convert any failure value into an [`AppError`]. Never fails.
///
/// - an `AppError` comes back as the same instance;
/// - `String` / `&'static str` become `Unknown` errors with that message;
/// - boxed errors and `std::io::Error` become `Unknown` errors with their
///   message and keep the original as `source()`;
/// - anything else becomes `Unknown` with [`UNKNOWN_ERROR_MESSAGE`].
pub fn to_app_error(candidate: Box<dyn Any + Send>) -> AppError {
    let candidate = match candidate.downcast::<AppError>() {
        Ok(err) => return *err,
        Err(other) => other,
    };
    let candidate = match candidate.downcast::<String>() {
        Ok(message) => return AppError::unknown(*message),
        Err(other) => other,
    };
    let candidate = match candidate.downcast::<&'static str>() {
        Ok(message) => return AppError::unknown(*message),
        Err(other) => other,
    };
    let candidate = match candidate.downcast::<BoxError>() {
        Ok(err) => return AppError::from_boxed(*err),
        Err(other) => other,
    };
    match candidate.downcast::<std::io::Error>() {
        Ok(err) => AppError::from_error(*err),
        Err(_) => AppError::unknown(UNKNOWN_ERROR_MESSAGE),
    }
}

/// Run `f`, turning both a returned error and a panic into an [`AppError`].
///
/// The panic hook still runs, so the panic message is printed as usual.
pub fn catch_failure<T, E, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, E> + UnwindSafe,
    E: Into<AppError>,
{
    match panic::catch_unwind(f) {
        Ok(result) => result.map_err(Into::into),
        Err(payload) => {
            let err = to_app_error(payload);
            tracing::debug!(code = %err.code(), "recovered panic: {}", err.message());
            Err(err)
        }
    }
}

impl From<&str> for AppError {
    fn from(message: &str) -> Self {
        AppError::unknown(message)
    }
}

impl From<String> for AppError {
    fn from(message: String) -> Self {
        AppError::unknown(message)
    }
}

impl From<BoxError> for AppError {
    fn from(err: BoxError) -> Self {
        AppError::from_boxed(err)
    }
}

macro_rules! from_err {
    ($err:ty) => {
        impl From<$err> for AppError {
            fn from(e: $err) -> Self {
                AppError::from_error(e)
            }
        }
    };
}

from_err!(std::io::Error);
from_err!(serde_json::Error);
from_err!(toml::de::Error);
