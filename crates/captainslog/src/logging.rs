//! Log output for `caplog`.
//!
//! Logs go to stderr so `caplog status --json` and `caplog config show` keep a
//! clean stdout. Only this crate's events follow the `-v`/`-q` flags; the
//! imaging and trash crates stay at `warn` unless `RUST_LOG` says otherwise.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level applied to third-party crates.
const DEPENDENCY_LEVEL: Level = Level::WARN;

/// How much the watcher reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Per-screenshot failures only (`-q`).
    Quiet,
    /// One line per processed screenshot.
    #[default]
    Normal,
    /// Status retries, journal selection and skipped files (`-v`).
    Verbose,
    /// Everything (`-vv`).
    Trace,
}

impl Verbosity {
    /// Level applied to `captainslog` and `caplog` events.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directives(self) -> String {
        let level = self.level();
        let base = if self == Self::Quiet {
            Level::ERROR
        } else {
            DEPENDENCY_LEVEL
        };
        format!("{base},captainslog={level},caplog={level}")
    }

    /// Whether log lines carry the emitting module and source location.
    fn detailed(self) -> bool {
        self >= Self::Verbose
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` replaces the directives derived from `verbosity`. Calling this
/// again after a subscriber is installed has no effect.
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));
    let detailed = verbosity.detailed();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(detailed)
                .with_file(detailed)
                .with_line_number(detailed),
        )
        .try_init();
}

/// Route warnings and errors to the test harness output.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("captainslog=warn")
        .with_test_writer()
        .try_init();
}
