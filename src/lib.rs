// Library root: exposes internals for integration tests and the binary.
// The binary entry point is src/main.rs.

pub mod config;
pub mod constants;
pub mod error;
pub mod greeter;
pub mod logger;

pub use error::{AppError, ErrorKind, ErrorRecord, Result};
