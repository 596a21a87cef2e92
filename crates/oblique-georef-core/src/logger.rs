//! Stderr logger for binaries and examples.
//!
//! Records from the `oblique_georef*` crates pass at the requested level;
//! everything else is capped at `warn`. Lines read
//! `[  1.234s DEBUG pipeline] message`, with the last module path segment as
//! the label. Libraries only talk to the `log` facade and never install a
//! logger themselves.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_TARGET_PREFIX: &str = "oblique_georef";

/// `RUST_LOG` fallback for [`init_tracing`].
#[cfg(feature = "tracing")]
const DEFAULT_TRACING_FILTER: &str = "oblique_georef=info,oblique_georef_core=info,warn";

struct GeorefLogger {
    own: LevelFilter,
    others: LevelFilter,
    started: Instant,
}

impl GeorefLogger {
    fn limit(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET_PREFIX) {
            self.own
        } else {
            self.others
        }
    }
}

fn label(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

impl Log for GeorefLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.limit(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let t = self.started.elapsed().as_secs_f64();
        let mut err = std::io::stderr().lock();
        let _ = writeln!(
            err,
            "[{t:8.3}s {:>5} {}] {}",
            record.level(),
            label(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<GeorefLogger> = OnceLock::new();

/// Install the stderr logger. Workspace crates log at `level`, dependencies
/// at `warn` or `level`, whichever is quieter.
///
/// Only the first call installs anything; later calls return `Ok(())`.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| GeorefLogger {
        own: level,
        others: level.min(Level::Warn.to_level_filter()),
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`, falling back to
/// `info` for this workspace and `warn` elsewhere.
///
/// Closed spans are reported with their busy/idle times, which covers the
/// pipeline stages and the resampling loop.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TRACING_FILTER));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true);

    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
