//! Optional `tracing` subscriber setup.
//!
//! The library only emits events. Hosts that do not install their own
//! subscriber can call [`init`] to see them on stderr; the filter comes from
//! `RUST_LOG`, or `warn` when unset. Set `IDWEAVE_LOG_FORMAT=json` for
//! one JSON object per event.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn";

/// Environment variable selecting the output format
pub const FORMAT_ENV: &str = "IDWEAVE_LOG_FORMAT";

/// Install a global stderr subscriber.
///
/// Returns `false` when a subscriber was already installed, which makes the
/// call safe to repeat.
pub fn init() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let layer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).try_init().is_ok()
}
