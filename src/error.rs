//! Application-wide error types.
//!
//! [`AppError`] is the one error value the crate hands out. It is built once
//! at the failure site through a kind-specific factory, never changes
//! afterwards, and is read by a boundary (log sink, response writer) through
//! [`AppError::to_record`] or [`AppError::status_code`].
//!
//! ```
//! use keystone::error::{AppError, ErrorKind, NotFoundMeta};
//!
//! let err = AppError::not_found("User not found", NotFoundMeta::new("user", 123));
//! assert!(err.is_type(ErrorKind::NotFound));
//! assert_eq!(err.status_code(), 404);
//! ```

use std::{
    backtrace::{Backtrace, BacktraceStatus},
    borrow::Cow,
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub mod convert;
pub mod kind;
pub mod metadata;

pub use convert::{catch_failure, is_app_error, is_app_error_source, to_app_error};
pub use kind::{lookup, ErrorKind, RegistryEntry};
pub use metadata::{
    AuthFailureReason, AuthMethod, AuthenticationMeta, AuthorizationMeta, ConfigurationMeta,
    ConflictMeta, DatabaseMeta, ErrorMetadata, ExternalServiceMeta, NotFoundMeta, RateLimitMeta,
    ResourceId, TimeoutMeta, ValidationMeta,
};

/// Value of the `name` field in every [`ErrorRecord`].
pub const ERROR_NAME: &str = "AppError";

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = AppError> = core::result::Result<T, E>;

/// Backtrace taken when the error is built. Only populated when
/// `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE` enable capture.
#[derive(Debug)]
struct StackTrace(Backtrace);

impl StackTrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }

    fn render(&self) -> Option<String> {
        match self.0.status() {
            BacktraceStatus::Captured => Some(self.0.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
struct Inner {
    id: Uuid,
    kind: ErrorKind,
    code: Cow<'static, str>,
    message: String,
    status_code: u16,
    metadata: ErrorMetadata,
    trace: StackTrace,
    occurred_at: DateTime<Utc>,
    #[source]
    source: Option<BoxError>,
}

/// Immutable, cheaply cloneable failure value.
///
/// Clones share one underlying instance; use [`AppError::ptr_eq`] to test
/// identity.
#[derive(Clone)]
pub struct AppError {
    inner: Arc<Inner>,
}

/// Serialisation projection used by log sinks and transport bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub name: String,
    pub message: String,
    pub code: String,
    pub status_code: u16,
    pub metadata: Option<Value>,
    pub stack_trace: Option<String>,
}

impl AppError {
    fn build(
        message: String,
        code: Cow<'static, str>,
        status_code: u16,
        metadata: ErrorMetadata,
        source: Option<BoxError>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                kind: metadata.kind(),
                code,
                message,
                status_code,
                metadata,
                trace: StackTrace::capture(),
                occurred_at: Utc::now(),
                source,
            }),
        }
    }

    /// Generic constructor. The kind comes from the metadata variant; the
    /// status falls back to the registry default for that kind.
    pub fn create(
        message: impl Into<String>,
        metadata: impl Into<ErrorMetadata>,
        status_code: Option<u16>,
    ) -> Self {
        let metadata = metadata.into();
        let kind = metadata.kind();
        Self::build(
            message.into(),
            Cow::Borrowed(kind.code()),
            status_code.unwrap_or_else(|| kind.default_status()),
            metadata,
            None,
        )
    }

    /// Like [`AppError::create`] with the registry status, keeping `cause`
    /// as the error's [`source`](std::error::Error::source).
    pub fn with_cause<E>(message: impl Into<String>, metadata: impl Into<ErrorMetadata>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let metadata = metadata.into();
        let kind = metadata.kind();
        Self::build(
            message.into(),
            Cow::Borrowed(kind.code()),
            kind.default_status(),
            metadata,
            Some(Box::new(cause)),
        )
    }

    /// Wrap a foreign error as an `Unknown` error carrying its message.
    /// Passing an `AppError` returns that same instance.
    pub fn from_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::from_boxed(Box::new(err))
    }

    /// An `AppError` behind the box is unwrapped, not wrapped again.
    pub(crate) fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => *app,
            Err(err) => {
                let message = err.to_string();
                Self::build(
                    message,
                    Cow::Borrowed(ErrorKind::Unknown.code()),
                    ErrorKind::Unknown.default_status(),
                    ErrorMetadata::Unknown,
                    Some(err),
                )
            }
        }
    }

    /// Escape hatch for a code outside the taxonomy.
    ///
    /// The result reports kind [`ErrorKind::Unknown`] but carries the given
    /// code, so `is_type` is `false` for every kind unless `code` happens to
    /// be `"UNKNOWN"`.
    pub fn custom(
        message: impl Into<String>,
        code: impl Into<String>,
        status_code: u16,
        metadata: Option<Value>,
    ) -> Self {
        Self::build(
            message.into(),
            Cow::Owned(code.into()),
            status_code,
            ErrorMetadata::Custom(metadata),
            None,
        )
    }

    pub fn validation(message: impl Into<String>, meta: impl Into<Option<ValidationMeta>>) -> Self {
        Self::create(message, ErrorMetadata::Validation(meta.into()), None)
    }

    pub fn authentication(
        message: impl Into<String>,
        meta: impl Into<Option<AuthenticationMeta>>,
    ) -> Self {
        Self::create(message, ErrorMetadata::Authentication(meta.into()), None)
    }

    pub fn authorization(message: impl Into<String>, meta: AuthorizationMeta) -> Self {
        Self::create(message, meta, None)
    }

    pub fn not_found(message: impl Into<String>, meta: NotFoundMeta) -> Self {
        Self::create(message, meta, None)
    }

    pub fn conflict(message: impl Into<String>, meta: ConflictMeta) -> Self {
        Self::create(message, meta, None)
    }

    pub fn rate_limit_exceeded(message: impl Into<String>, meta: RateLimitMeta) -> Self {
        Self::create(message, meta, None)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::create(message, ErrorMetadata::Internal, None)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::create(message, ErrorMetadata::ServiceUnavailable, None)
    }

    pub fn database(message: impl Into<String>, meta: DatabaseMeta) -> Self {
        Self::create(message, meta, None)
    }

    pub fn external_service(message: impl Into<String>, meta: ExternalServiceMeta) -> Self {
        Self::create(message, meta, None)
    }

    pub fn timeout(message: impl Into<String>, meta: TimeoutMeta) -> Self {
        Self::create(message, meta, None)
    }

    pub fn configuration(message: impl Into<String>, meta: ConfigurationMeta) -> Self {
        Self::create(message, meta, None)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::create(message, ErrorMetadata::Unknown, None)
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn code(&self) -> &str {
        &self.inner.code
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    pub fn status_code(&self) -> u16 {
        self.inner.status_code
    }

    pub fn metadata(&self) -> &ErrorMetadata {
        &self.inner.metadata
    }

    /// Rendered backtrace, if capture was enabled at construction.
    pub fn stack_trace(&self) -> Option<String> {
        self.inner.trace.render()
    }

    /// Unique per constructed instance; shared by clones.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.inner.occurred_at
    }

    /// `true` when both handles point at the same constructed error.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// `true` iff this error's code is the registry code of `kind`.
    pub fn is_type(&self, kind: ErrorKind) -> bool {
        self.code() == kind.code()
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord {
            name: ERROR_NAME.to_string(),
            message: self.message().to_string(),
            code: self.code().to_string(),
            status_code: self.status_code(),
            metadata: self.metadata().to_value(),
            stack_trace: self.stack_trace(),
        }
    }

    /// Log this error with structured fields. Caller-caused statuses log at
    /// `warn`, everything else at `error`.
    pub fn log(&self) {
        let metadata = self
            .metadata()
            .to_value()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string());
        let caused_by = self
            .inner
            .source
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "none".to_string());

        if self.is_client_error() {
            tracing::warn!(
                error_id = %self.id(),
                code = %self.code(),
                status_code = self.status_code(),
                metadata = %metadata,
                occurred_at = %self.occurred_at(),
                caused_by = %caused_by,
                "{}", self.message()
            );
        } else {
            tracing::error!(
                error_id = %self.id(),
                code = %self.code(),
                status_code = self.status_code(),
                metadata = %metadata,
                occurred_at = %self.occurred_at(),
                caused_by = %caused_by,
                "{}", self.message()
            );
        }
    }
}

impl Debug for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(ERROR_NAME)
            .field("code", &self.code())
            .field("message", &self.message())
            .field("status_code", &self.status_code())
            .field("metadata", self.metadata())
            .field("source", &self.inner.source)
            .finish_non_exhaustive()
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&*self.inner)
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_record().serialize(serializer)
    }
}
