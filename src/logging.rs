//! Compact subscriber for the crate's `tracing` events.
//!
//! The library only emits events; installing a subscriber is up to the
//! application. This module is a convenience for programs that have none.
//!
//! `RUST_LOG` takes precedence over the filter passed in code:
//!
//! ```bash
//! RUST_LOG=bundle_vfs=debug my-app
//! ```

use std::sync::Once;

use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Install a subscriber showing warnings and errors.
pub fn init() {
    init_with_filter("warn");
}

/// Install a subscriber with the given filter directive (e.g. `"bundle_vfs=debug"`).
///
/// Only the first call takes effect. If another global subscriber is
/// already installed this is a no-op.
pub fn init_with_filter(directives: &str) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(directives)
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_timer(CompactTime)
            .with_filter(filter);

        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}
