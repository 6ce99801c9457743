//! Test logging infrastructure.
//!
//! Structured, timestamped logging for tests plus the assertion macros used
//! throughout the suite. Verbosity is controlled by the `TEST_LOG_LEVEL`
//! environment variable.
//!
//! # Example
//!
//! ```
//! use fairsem::test_logging::{TestLogLevel, TestLogger};
//!
//! let logger = TestLogger::new(TestLogLevel::Debug);
//! logger.log(TestLogLevel::Info, "dispatch", "granted weight 2");
//! assert!(logger.report().contains("granted weight 2"));
//! ```

use std::fmt::Write as _;
use std::sync::Mutex;
use std::time::Instant;

/// Logging verbosity level for tests.
///
/// Levels are ordered from least to most verbose:
/// `Error < Warn < Info < Debug < Trace`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TestLogLevel {
    /// Only errors and failures.
    Error,
    /// Warnings and above.
    Warn,
    /// General test progress.
    #[default]
    Info,
    /// Detailed scheduling decisions.
    Debug,
    /// All events including waker dispatch and polls.
    Trace,
}

impl TestLogLevel {
    /// Returns a human-readable name for the level.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    /// Returns the level from the `TEST_LOG_LEVEL` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("TEST_LOG_LEVEL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for TestLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TestLogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Self::Error),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "INFO" => Ok(Self::Info),
            "DEBUG" => Ok(Self::Debug),
            "TRACE" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

/// Captures timestamped events and renders a report on demand.
#[derive(Debug)]
pub struct TestLogger {
    start: Instant,
    level: TestLogLevel,
    entries: Mutex<Vec<String>>,
}

impl TestLogger {
    /// Creates a logger capturing events at or below `level`.
    #[must_use]
    pub fn new(level: TestLogLevel) -> Self {
        Self {
            start: Instant::now(),
            level,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Records an event if `level` is enabled.
    pub fn log(&self, level: TestLogLevel, scope: &str, message: &str) {
        if level > self.level {
            return;
        }
        let elapsed = self.start.elapsed();
        let line = format!(
            "[{:>9.3}ms {} {}] {}",
            elapsed.as_secs_f64() * 1000.0,
            level.name(),
            scope,
            message
        );
        self.entries.lock().expect("logger poisoned").push(line);
    }

    /// Renders all captured events, one per line.
    #[must_use]
    pub fn report(&self) -> String {
        let entries = self.entries.lock().expect("logger poisoned");
        let mut out = String::with_capacity(entries.len() * 64);
        for line in entries.iter() {
            let _ = writeln!(out, "{line}");
        }
        out
    }

    /// Number of captured events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("logger poisoned").len()
    }

    /// True if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Marks the start of a named test phase.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        $crate::tracing::info!(phase = $name, "=== phase ===");
    };
}

/// Marks a named section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        $crate::tracing::info!(section = $name, "--- section ---");
    };
}

/// Marks a test as complete.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        $crate::tracing::info!(test = $name, "test complete");
    };
}

/// Asserts `$cond`, logging the labeled expected/actual pair either way.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $label:expr, $expected:expr, $actual:expr) => {{
        let holds = $cond;
        let expected = $expected;
        let actual = $actual;
        if holds {
            $crate::tracing::trace!(
                label = $label,
                expected = ?expected,
                actual = ?actual,
                "assertion holds"
            );
        } else {
            $crate::tracing::error!(
                label = $label,
                expected = ?expected,
                actual = ?actual,
                "assertion FAILED"
            );
            panic!(
                "assertion failed: {} (expected {:?}, got {:?})",
                $label, expected, actual
            );
        }
    }};
}
