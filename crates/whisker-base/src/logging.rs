use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

/// A logger that writes to stdout, stamping each line with the time elapsed
/// since the logger was created.
///
/// Frame pipelines care about relative timing (how long since the session
/// started, how far apart two frames landed), so lines carry elapsed
/// seconds rather than wall-clock dates.
pub struct StdoutLogger {
    started: Instant,
}

impl StdoutLogger {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Format the elapsed time since logger creation as `SSSSS.mmm`.
    fn format_elapsed(&self) -> String {
        let elapsed = self.started.elapsed();
        format!("{:5}.{:03}", elapsed.as_secs(), elapsed.subsec_millis())
    }
}

impl Default for StdoutLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for StdoutLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let elapsed = self.format_elapsed();
        let level = record.level();
        let thread_id = std::thread::current().id();
        let file = record.file().unwrap_or("unknown");
        let line = record.line().unwrap_or(0);
        let message = record.args();

        println!(
            "{} [{}] [thread:{:?}] {}:{} - {}",
            elapsed, level, thread_id, file, line, message
        );
    }

    fn flush(&self) {
        std::io::stdout().flush().ok();
    }
}

/// Initialize the global logger with StdoutLogger
///
/// Sets the max level based on build mode:
/// - Debug builds: LevelFilter::Debug (all levels active)
/// - Release builds: LevelFilter::Info (Debug suppressed)
///
/// This can only be called once per process. Subsequent calls are silently ignored.
pub fn init_stdout_logger() {
    static LOGGER: OnceLock<StdoutLogger> = OnceLock::new();

    let logger = LOGGER.get_or_init(StdoutLogger::new);

    let max_level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if log::set_logger(logger).is_ok() {
        log::set_max_level(max_level);
    }
}

/// Log a fatal error and exit the process
///
/// Logs at Error level (since the log crate has no Fatal level),
/// flushes stdout, and calls std::process::exit(1).
#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
        // Flush stdout to ensure message is visible
        {
            use std::io::Write;
            let _ = std::io::stdout().flush();
        }
        std::process::exit(1);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_structure() {
        let logger = StdoutLogger::new();
        let stamp = logger.format_elapsed();
        // Should be SSSSS.mmm: five (possibly space-padded) second digits,
        // a dot, three millisecond digits
        assert_eq!(stamp.len(), 9);
        assert_eq!(&stamp[5..6], ".");
        assert!(stamp[6..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_format_elapsed_advances() {
        let logger = StdoutLogger::new();
        let first = logger.format_elapsed();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = logger.format_elapsed();
        assert_ne!(first, second);
    }
}
