//! Structured JSON logging setup
//!
//! Each event is written as one JSON object on stdout, with the event's
//! fields flattened next to the message so log queries can filter on
//! `action`, `account_id` and friends.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the JSON subscriber
///
/// `RUST_LOG` takes precedence; otherwise `default_level` (normally the
/// configured `LOG_LEVEL`) applies. Calling this more than once is harmless:
/// later calls leave the first subscriber in place.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(true)
        .flatten_event(true);

    let _ = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init();
}
