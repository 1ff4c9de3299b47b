//! Logging setup and span helpers.
//!
//! The library only emits `tracing` events. Binaries and tests that want to
//! see them call [`init_logging`] once at startup.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::task::domain::TaskId;

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable multi-line output.
    #[default]
    Pretty,
}

/// Installs the global tracing subscriber.
///
/// Only the first call has an effect. The filter comes from `RUST_LOG` and
/// defaults to `info`.
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates the span wrapping one task operation.
#[must_use]
pub fn task_span(operation: &str, task_id: TaskId) -> Span {
    tracing::info_span!("task", op = operation, task_id = task_id.value())
}
