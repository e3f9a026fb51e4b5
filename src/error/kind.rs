//! Error taxonomy registry.
//!
//! The kind set is closed: every [`ErrorKind`] has exactly one
//! [`RegistryEntry`] holding its canonical code and default transport status.
//! The table is a `static` built at compile time and never changes.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Closed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input failed a validation rule.
    Validation,
    /// The caller could not be identified.
    Authentication,
    /// The caller is known but lacks permission.
    Authorization,
    /// A requested resource does not exist.
    NotFound,
    /// The operation clashes with existing state.
    Conflict,
    /// The caller exceeded an allowed request rate.
    RateLimitExceeded,
    /// Unexpected failure inside the application.
    Internal,
    /// A dependency is temporarily unavailable.
    ServiceUnavailable,
    /// A storage operation failed.
    Database,
    /// A call to a third-party service failed.
    ExternalService,
    /// An operation did not finish within its deadline.
    Timeout,
    /// Configuration is missing or malformed.
    Configuration,
    /// Anything that could not be classified.
    Unknown,
}

/// Registry row for one [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub code: &'static str,
    pub default_status: u16,
}

// Indexed by `ErrorKind as usize`; order must follow the enum declaration.
static REGISTRY: [RegistryEntry; ErrorKind::ALL.len()] = [
    RegistryEntry { code: "VALIDATION_ERROR", default_status: 400 },
    RegistryEntry { code: "AUTHENTICATION_ERROR", default_status: 401 },
    RegistryEntry { code: "AUTHORIZATION_ERROR", default_status: 403 },
    RegistryEntry { code: "NOT_FOUND", default_status: 404 },
    RegistryEntry { code: "CONFLICT", default_status: 409 },
    RegistryEntry { code: "RATE_LIMIT_EXCEEDED", default_status: 429 },
    RegistryEntry { code: "INTERNAL_SERVER_ERROR", default_status: 500 },
    RegistryEntry { code: "SERVICE_UNAVAILABLE", default_status: 503 },
    RegistryEntry { code: "DATABASE_ERROR", default_status: 500 },
    RegistryEntry { code: "EXTERNAL_SERVICE_ERROR", default_status: 502 },
    RegistryEntry { code: "TIMEOUT", default_status: 408 },
    RegistryEntry { code: "CONFIGURATION_ERROR", default_status: 500 },
    RegistryEntry { code: "UNKNOWN", default_status: 500 },
];

/// Look up the registry entry for `kind`.
pub fn lookup(kind: ErrorKind) -> RegistryEntry {
    REGISTRY[kind as usize]
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 13] = [
        Self::Validation,
        Self::Authentication,
        Self::Authorization,
        Self::NotFound,
        Self::Conflict,
        Self::RateLimitExceeded,
        Self::Internal,
        Self::ServiceUnavailable,
        Self::Database,
        Self::ExternalService,
        Self::Timeout,
        Self::Configuration,
        Self::Unknown,
    ];

    /// Canonical code string, e.g. `"NOT_FOUND"`.
    pub fn code(self) -> &'static str {
        lookup(self).code
    }

    /// Status used when a constructor is not given an explicit override.
    pub fn default_status(self) -> u16 {
        lookup(self).default_status
    }

    /// Resolve a canonical code back to its kind.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// `true` for caller-caused kinds (4xx).
    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.default_status())
    }

    /// `true` for system-caused kinds (5xx).
    pub fn is_server_error(self) -> bool {
        self.default_status() >= 500
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Returned by [`ErrorKind::from_str`] for a code outside the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised error code: '{0}'")]
pub struct UnknownCode(pub String);

impl FromStr for ErrorKind {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| UnknownCode(s.to_string()))
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}
