//! Process-wide tracing setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingSettings};

/// Installs the global subscriber and routes `log` records into it.
///
/// `RUST_LOG` wins over `settings.level`. Returns `false` if a subscriber
/// was already installed, in which case nothing changes.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match settings.format {
        LogFormat::Text => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }

    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::warn!("log records will not reach tracing: {}", e);
    }
    true
}
