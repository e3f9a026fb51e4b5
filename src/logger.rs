//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, before configuration is loaded, then
//! apply the configured level through the returned [`LogHandle`].

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::{
    config::LogLevel,
    error::{AppError, ValidationMeta},
};

/// Handle to the installed filter; swaps the level without reinstalling
/// the subscriber.
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Replace the active filter. `prefer_level` has the same meaning as
    /// in [`init`].
    pub fn set_level(&self, level: LogLevel, prefer_level: bool) -> Result<(), AppError> {
        let filter = build_filter(level, prefer_level)?;
        self.filter
            .reload(filter)
            .map_err(|e| AppError::internal(format!("failed to reload log filter: {e}")))
    }
}

/// Initialise the global tracing subscriber.
///
/// If `prefer_level` is `true`, `level` takes precedence over `RUST_LOG`.
/// If `prefer_level` is `false`, `RUST_LOG` takes precedence and `level` is
/// the fallback.
pub fn init(level: LogLevel, prefer_level: bool) -> Result<LogHandle, AppError> {
    let (filter, handle) = reload::Layer::new(build_filter(level, prefer_level)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| AppError::internal(format!("failed to set subscriber: {e}")))?;

    Ok(LogHandle { filter: handle })
}

fn build_filter(level: LogLevel, prefer_level: bool) -> Result<EnvFilter, AppError> {
    if prefer_level {
        let directive = parse_level(level.as_str())?;
        Ok(EnvFilter::default().add_directive(directive.into()))
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.as_str()))
            .map_err(|e| AppError::internal(format!("invalid log level '{level}': {e}")))
    }
}

/// Parse a log level string into a [`LevelFilter`], returning an error on
/// unrecognised values.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::validation(
            "log level must not be empty",
            ValidationMeta::field("log_level").with_constraint("non_empty"),
        ));
    }
    level.parse::<LevelFilter>().map_err(|_| {
        AppError::validation(
            format!("unrecognised log level: '{level}'"),
            ValidationMeta::field("log_level")
                .with_constraint("one_of")
                .with_value(level),
        )
    })
}
