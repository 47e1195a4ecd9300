//! Logging setup.
//!
//! Everything the watch pipeline reports goes out under one target,
//! [`WATCH_TARGET`], so a single directive controls it:
//!
//! ```bash
//! RUST_LOG=lilnas_core::watch=debug lilnas-watch /srv/share
//! LILNAS_LOGGING__MODULES__NOTIFY=warn lilnas-watch /srv/share
//! ```
//!
//! `RUST_LOG` wins over the `[logging]` settings section when it is set.

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Target of every record logged through [`watch_event!`](crate::watch_event).
pub const WATCH_TARGET: &str = "lilnas_core::watch";

static INIT: Once = Once::new();

/// Wall-clock time of day, millisecond precision.
struct ClockTime;

impl FormatTime for ClockTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

impl LoggingConfig {
    /// Filter directives for this config, e.g. `info,notify=warn`.
    pub fn directives(&self) -> String {
        self.modules
            .iter()
            .fold(self.default.clone(), |mut acc, (target, level)| {
                acc.push(',');
                acc.push_str(target);
                acc.push('=');
                acc.push_str(level);
                acc
            })
    }

    /// The filter to install: `RUST_LOG` if set, otherwise these settings.
    pub fn filter(&self) -> EnvFilter {
        match std::env::var("RUST_LOG") {
            Ok(_) => EnvFilter::from_default_env(),
            Err(_) => EnvFilter::new(self.directives()),
        }
    }
}

/// Installs the global subscriber once. Later calls, and calls made after some
/// other subscriber was installed, are no-ops.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let layer = tracing_subscriber::fmt::layer()
            .with_timer(ClockTime)
            .with_target(true)
            .with_filter(config.filter());

        let _ = tracing_subscriber::registry().with(layer).try_init();
    });
}

pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Logs a watch pipeline record at `$level` under [`WATCH_TARGET`].
///
/// ```ignore
/// watch_event!(INFO, "service", "started", "{}", path.display());
/// watch_event!(DEBUG, "dispatch", "event stream closed");
/// ```
#[macro_export]
macro_rules! watch_event {
    ($level:ident, $component:expr, $event:expr) => {
        tracing::event!(
            target: $crate::logging::WATCH_TARGET,
            tracing::Level::$level,
            "[{}] {}",
            $component,
            $event
        )
    };
    ($level:ident, $component:expr, $event:expr, $($arg:tt)*) => {
        tracing::event!(
            target: $crate::logging::WATCH_TARGET,
            tracing::Level::$level,
            "[{}] {}: {}",
            $component,
            $event,
            format!($($arg)*)
        )
    };
}
