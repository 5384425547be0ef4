#![forbid(unsafe_code)]

use std::io;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

pub const LOG_FILTER_ENV: &str = "GEMLIKES_LOG";

/// Installs the global subscriber. Logs go to stderr; stdout carries the response.
///
/// Falls back to `warn` when `GEMLIKES_LOG` is unset or unparsable. Calling
/// this twice leaves the first subscriber in place.
pub fn init() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_FILTER_ENV)
        .from_env_lossy();
    let subscriber = Registry::default()
        .with(
            fmt::Layer::default()
                .compact()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(filter);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
