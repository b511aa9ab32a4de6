//! User-facing diagnostic sinks.
//!
//! A [`Logger`] filters messages by a [`LogLevel`] threshold and forwards
//! the ones that pass to its destination. Two sinks are provided:
//!
//! - [`ConsoleLogger`] writes one colored line per message to a writer
//! - [`TracingLogger`] forwards to `tracing` events (the world default)

use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;
use sim_env_types::LogLevel;

/// A thread-safe diagnostic sink with a level threshold.
pub trait Logger: Send + Sync {
    /// Set the threshold; messages below it are dropped.
    fn set_level(&self, level: LogLevel);

    /// Current threshold.
    fn level(&self) -> LogLevel;

    /// Emit a message if `level` passes the threshold.
    fn log(&self, msg: &str, level: LogLevel, prefix: &str);

    /// Emit at [`LogLevel::Error`].
    fn log_err(&self, msg: &str, prefix: &str) {
        self.log(msg, LogLevel::Error, prefix);
    }

    /// Emit at [`LogLevel::Info`].
    fn log_info(&self, msg: &str, prefix: &str) {
        self.log(msg, LogLevel::Info, prefix);
    }

    /// Emit at [`LogLevel::Warn`].
    fn log_warn(&self, msg: &str, prefix: &str) {
        self.log(msg, LogLevel::Warn, prefix);
    }

    /// Emit at [`LogLevel::Debug`].
    fn log_debug(&self, msg: &str, prefix: &str) {
        self.log(msg, LogLevel::Debug, prefix);
    }
}

const RESET: &str = "\x1b[0m";

fn color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "\x1b[1;31m",
        LogLevel::Info => "\x1b[1;32m",
        LogLevel::Warn => "\x1b[1;33m",
        LogLevel::Debug => "\x1b[1;35m",
    }
}

/// Writes one line per message: `<tag> <prefix>: <msg>`, with the tag
/// colored by level.
pub struct ConsoleLogger {
    level: AtomicU8,
    colored: bool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleLogger {
    /// Log to an arbitrary writer with ANSI colors.
    #[must_use]
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            level: AtomicU8::new(LogLevel::default().as_u8()),
            colored: true,
            out: Mutex::new(Box::new(writer)),
        }
    }

    /// Log to an arbitrary writer without colors.
    #[must_use]
    pub fn plain(writer: impl Write + Send + 'static) -> Self {
        Self {
            colored: false,
            ..Self::new(writer)
        }
    }

    /// Log to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Set the initial threshold.
    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self {
        self.set_level(level);
        self
    }

    fn format(&self, msg: &str, level: LogLevel, prefix: &str) -> String {
        let tag = if self.colored {
            format!("{}{}{RESET}", color(level), level.tag())
        } else {
            level.tag().to_string()
        };
        if prefix.is_empty() {
            format!("{tag} {msg}")
        } else {
            format!("{tag} {prefix}: {msg}")
        }
    }
}

impl std::fmt::Debug for ConsoleLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleLogger")
            .field("level", &self.level())
            .field("colored", &self.colored)
            .finish_non_exhaustive()
    }
}

impl Logger for ConsoleLogger {
    fn set_level(&self, level: LogLevel) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn log(&self, msg: &str, level: LogLevel, prefix: &str) {
        if !level.passes(self.level()) {
            return;
        }
        let line = self.format(msg, level, prefix);
        let mut out = self.out.lock();
        // A failing sink must not take the simulation down.
        let _ = writeln!(out, "{line}").and_then(|()| out.flush());
    }
}

/// Forwards messages to `tracing` events with target `sim_env`.
#[derive(Debug)]
pub struct TracingLogger {
    level: AtomicU8,
}

impl TracingLogger {
    /// Create a forwarder with the given threshold.
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: AtomicU8::new(level.as_u8()),
        }
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl Logger for TracingLogger {
    fn set_level(&self, level: LogLevel) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn log(&self, msg: &str, level: LogLevel, prefix: &str) {
        if !level.passes(self.level()) {
            return;
        }
        match level {
            LogLevel::Debug => tracing::debug!(target: "sim_env", prefix, "{msg}"),
            LogLevel::Info => tracing::info!(target: "sim_env", prefix, "{msg}"),
            LogLevel::Warn => tracing::warn!(target: "sim_env", prefix, "{msg}"),
            LogLevel::Error => tracing::error!(target: "sim_env", prefix, "{msg}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    #[test]
    fn test_threshold_filters() {
        let buffer = Buffer::default();
        let logger = ConsoleLogger::plain(buffer.clone()).with_level(LogLevel::Warn);

        logger.log_debug("hidden", "");
        logger.log_info("hidden", "");
        logger.log_warn("shown", "");
        logger.log_err("shown too", "planner");

        assert_eq!(
            buffer.text(),
            "[Warning] shown\n[Error] planner: shown too\n"
        );
    }

    #[test]
    fn test_colored_line() {
        let buffer = Buffer::default();
        let logger = ConsoleLogger::new(buffer.clone());
        logger.log_err("boom", "");
        assert_eq!(buffer.text(), "\x1b[1;31m[Error]\x1b[0m boom\n");

        logger.set_level(LogLevel::Debug);
        logger.log_debug("trace", "x");
        assert!(buffer.text().ends_with("\x1b[1;35m[Debug]\x1b[0m x: trace\n"));
    }

    #[test]
    fn test_default_level_is_info() {
        let logger = TracingLogger::default();
        assert_eq!(logger.level(), LogLevel::Info);
        logger.set_level(LogLevel::Error);
        assert_eq!(logger.level(), LogLevel::Error);
        logger.log_info("dropped", "");
    }
}
