use crate::config::LoggingConfig;
use sentry::types::{Dsn, ParseDsnError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("invalid sentry dsn: {0}")]
    InvalidDsn(#[from] ParseDsnError),
    #[error("could not install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Installs the global tracing subscriber.
///
/// Events go to stdout filtered by `RUST_LOG` (default `info`). With a sentry
/// DSN configured they are also reported to sentry; the returned guard flushes
/// pending events when dropped.
pub fn init(config: Option<&LoggingConfig>) -> Result<Option<sentry::ClientInitGuard>, LoggingError> {
    let sentry_guard = match config {
        Some(config) => {
            let dsn: Dsn = config.sentry_dsn.parse()?;
            Some(sentry::init(sentry::ClientOptions {
                dsn: Some(dsn),
                release: sentry::release_name!(),
                ..Default::default()
            }))
        }
        None => None,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(
            sentry_guard
                .as_ref()
                .map(|_| sentry::integrations::tracing::layer()),
        )
        .try_init()?;

    Ok(sentry_guard)
}
