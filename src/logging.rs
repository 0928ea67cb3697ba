//! Logging and tracing initialization for pfmig.
//!
//! Two kinds of events share the subscriber: diagnostics from library code, and the run's
//! audit trail, which [`RunLog`](crate::core::run_log::RunLog) mirrors under
//! [`AUDIT_TARGET`] with an `audit` field holding the entry level (`INFO`, `WARNING`,
//! `ERROR`, `SUCCESS`). The default filter pins the audit target at `info` whatever the
//! diagnostic verbosity.

use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::core::run_log::AUDIT_TARGET;

/// Configuration for the logging system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConfig {
    /// One JSON object per event, with per-folder transfer spans timed on close
    pub json: bool,
    /// Diagnostics at DEBUG instead of INFO
    pub verbose: bool,
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    format!(
        "pfmig={},{}=info",
        level.as_str().to_lowercase(),
        AUDIT_TARGET
    )
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Call once, after config is loaded.
pub fn init(config: LogConfig) {
    let filter = env_filter(config.verbose);

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true),
            )
            .init();
        return;
    }

    // Console: compact lines timed from process start, `audit=LEVEL` marks report entries.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_timer(fmt::time::uptime())
                .with_target(false)
                .with_level(true),
        )
        .init();
}
