//! Per-kind metadata shapes.
//!
//! [`ErrorMetadata`] pairs each [`ErrorKind`] with the only payload it may
//! carry, so a not-found error holding rate-limit context cannot be built.

use std::{collections::BTreeMap, fmt::Display, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::kind::ErrorKind;

/// Context for [`ErrorKind::Validation`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMeta {
    pub field: Option<String>,
    pub value: Option<Value>,
    pub constraint: Option<String>,
}

impl ValidationMeta {
    pub fn field(field: impl Into<String>) -> Self {
        Self { field: Some(field.into()), ..Default::default() }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Token,
    Password,
    ApiKey,
    OAuth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureReason {
    Expired,
    Invalid,
    Missing,
}

/// Context for [`ErrorKind::Authentication`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationMeta {
    pub auth_method: Option<AuthMethod>,
    pub user_id: Option<String>,
    pub reason: Option<AuthFailureReason>,
}

/// Context for [`ErrorKind::Authorization`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationMeta {
    pub resource: String,
    pub action: String,
    pub user_id: Option<String>,
    #[serde(default)]
    pub required_permissions: Vec<String>,
}

impl AuthorizationMeta {
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            user_id: None,
            required_permissions: Vec::new(),
        }
    }
}

/// Identifier of a looked-up resource: numeric keys stay numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Int(i64),
    Text(String),
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for ResourceId {
    fn from(id: i32) -> Self {
        Self::Int(id.into())
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

/// Context for [`ErrorKind::NotFound`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundMeta {
    pub resource_type: String,
    pub resource_id: ResourceId,
    pub search_params: Option<BTreeMap<String, Value>>,
}

impl NotFoundMeta {
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<ResourceId>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            search_params: None,
        }
    }

    pub fn with_search_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.search_params
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Context for [`ErrorKind::Conflict`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictMeta {
    pub resource_type: String,
    pub conflicting_field: Option<String>,
    pub existing_value: Option<Value>,
}

impl ConflictMeta {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self { resource_type: resource_type.into(), conflicting_field: None, existing_value: None }
    }
}

/// Context for [`ErrorKind::RateLimitExceeded`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitMeta {
    pub limit: u32,
    #[serde(rename = "windowMs", with = "duration_ms")]
    pub window: Duration,
    #[serde(rename = "retryAfterMs", default, with = "opt_duration_ms")]
    pub retry_after: Option<Duration>,
}

/// Context for [`ErrorKind::Database`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMeta {
    pub operation: String,
    pub table: Option<String>,
    pub constraint: Option<String>,
}

impl DatabaseMeta {
    pub fn new(operation: impl Into<String>) -> Self {
        Self { operation: operation.into(), table: None, constraint: None }
    }
}

/// Context for [`ErrorKind::ExternalService`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalServiceMeta {
    pub service: String,
    pub endpoint: Option<String>,
    pub upstream_status: Option<u16>,
}

impl ExternalServiceMeta {
    pub fn new(service: impl Into<String>) -> Self {
        Self { service: service.into(), endpoint: None, upstream_status: None }
    }
}

/// Context for [`ErrorKind::Timeout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutMeta {
    pub operation: String,
    #[serde(rename = "timeoutMs", with = "duration_ms")]
    pub timeout: Duration,
}

/// Context for [`ErrorKind::Configuration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationMeta {
    pub key: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl ConfigurationMeta {
    pub fn key(key: impl Into<String>) -> Self {
        Self { key: key.into(), expected: None, actual: None }
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

/// Kind-tagged metadata. The variant decides the error kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorMetadata {
    Validation(Option<ValidationMeta>),
    Authentication(Option<AuthenticationMeta>),
    Authorization(AuthorizationMeta),
    NotFound(NotFoundMeta),
    Conflict(ConflictMeta),
    RateLimitExceeded(RateLimitMeta),
    Internal,
    ServiceUnavailable,
    Database(DatabaseMeta),
    ExternalService(ExternalServiceMeta),
    Timeout(TimeoutMeta),
    Configuration(ConfigurationMeta),
    Unknown,
    /// Free-form payload of a `custom` error. Reports [`ErrorKind::Unknown`].
    Custom(Option<Value>),
}

impl ErrorMetadata {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            Self::Internal => ErrorKind::Internal,
            Self::ServiceUnavailable => ErrorKind::ServiceUnavailable,
            Self::Database(_) => ErrorKind::Database,
            Self::ExternalService(_) => ErrorKind::ExternalService,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Unknown | Self::Custom(_) => ErrorKind::Unknown,
        }
    }

    /// `true` when there is a payload to serialise.
    pub fn is_present(&self) -> bool {
        !matches!(
            self,
            Self::Validation(None)
                | Self::Authentication(None)
                | Self::Internal
                | Self::ServiceUnavailable
                | Self::Unknown
                | Self::Custom(None)
        )
    }

    /// JSON form of the payload; `None` when absent.
    pub fn to_value(&self) -> Option<Value> {
        // Serialising plain derived structs into a `Value` cannot fail.
        fn json<T: Serialize>(meta: &T) -> Option<Value> {
            serde_json::to_value(meta).ok()
        }

        match self {
            Self::Validation(meta) => meta.as_ref().and_then(json),
            Self::Authentication(meta) => meta.as_ref().and_then(json),
            Self::Authorization(meta) => json(meta),
            Self::NotFound(meta) => json(meta),
            Self::Conflict(meta) => json(meta),
            Self::RateLimitExceeded(meta) => json(meta),
            Self::Database(meta) => json(meta),
            Self::ExternalService(meta) => json(meta),
            Self::Timeout(meta) => json(meta),
            Self::Configuration(meta) => json(meta),
            Self::Custom(value) => value.clone(),
            Self::Internal | Self::ServiceUnavailable | Self::Unknown => None,
        }
    }
}

macro_rules! metadata_from {
    ($meta:ty, $variant:ident) => {
        impl From<$meta> for ErrorMetadata {
            fn from(meta: $meta) -> Self {
                Self::$variant(meta)
            }
        }
    };
    ($meta:ty, $variant:ident, optional) => {
        impl From<$meta> for ErrorMetadata {
            fn from(meta: $meta) -> Self {
                Self::$variant(Some(meta))
            }
        }
    };
}

metadata_from!(ValidationMeta, Validation, optional);
metadata_from!(AuthenticationMeta, Authentication, optional);
metadata_from!(AuthorizationMeta, Authorization);
metadata_from!(NotFoundMeta, NotFound);
metadata_from!(ConflictMeta, Conflict);
metadata_from!(RateLimitMeta, RateLimitExceeded);
metadata_from!(DatabaseMeta, Database);
metadata_from!(ExternalServiceMeta, ExternalService);
metadata_from!(TimeoutMeta, Timeout);
metadata_from!(ConfigurationMeta, Configuration);

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(millis(d))
    }

    /// Whole milliseconds, saturating at `u64::MAX`.
    pub(super) fn millis(d: &Duration) -> u64 {
        u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&super::duration_ms::millis(d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}
