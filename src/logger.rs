//! Structured logging with box-drawing output.
//!
//! raillamp runs headless most of the time, usually under a service manager that
//! captures stdout, so the log is the primary way to see what the lamp is doing.
//! Output follows a pipe-and-branch layout:
//!
//! ```text
//! ┏ raillamp v0.3.0 ━━╸
//! ┃
//! ┣ Loaded configuration
//! ┃   Motion timeout: 30 seconds
//! ┣[INFO] Schedule loaded: 21:48 → 06:12
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new conceptual block (config loaded, lamp armed,
//!   shutdown). It prints a spacer pipe first.
//! - `log_decorated!` continues a block or prints a one-line status.
//! - `log_indented!` prints detail lines belonging to the previous message.
//! - `log_pipe!` inserts a spacer, mostly before a levelled message that starts
//!   its own block.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_critical!`, `log_debug!`
//!   carry a `[LEVEL]` tag. `log_debug!` is not filtered here; callers gate it
//!   on their `debug_enabled` flag.
//!
//! Logging can be muted process-wide with [`Log::set_enabled`], which the test
//! suites use to keep output quiet. With `--log FILE` every line is routed to a
//! writer thread and ANSI colour codes are stripped.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

static TIMESTAMPS_ENABLED: AtomicBool = AtomicBool::new(false);

// Channel for routing output to file when --log is active
static LOG_CHANNEL: OnceLock<Option<Sender<LogMessage>>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Process-wide logging switches.
pub struct Log;

impl Log {
    /// Enable or disable all log output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with the local wall-clock time.
    ///
    /// Enabled automatically when logging to a file, where lines are read long
    /// after they were written.
    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Start file logging to the specified path.
    ///
    /// The returned guard flushes and joins the writer thread when dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(Some(tx.clone()))
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Self::set_timestamps(true);

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix for the current line, or an empty string when
    /// timestamps are off. Public for macro access.
    pub fn get_timestamp_prefix() -> String {
        if TIMESTAMPS_ENABLED.load(Ordering::SeqCst) {
            format!("[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Route a fully formatted line to stdout or the file writer. Used by the macros.
pub fn write_output(text: &str) {
    if let Some(Some(tx)) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Shared expansion for every line-style macro: `$layout` receives the
/// timestamp prefix and the message.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($layout:literal, $message:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = $message;
            let formatted = format!($layout, prefix = prefix, message = message);
            $crate::logger::write_output(&formatted);
        }
    }};
}

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_line!("{prefix}┣ {message}\n", format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_line!("{prefix}┣ {message}\n", $expr)
    };
}

/// Log an indented detail line.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_line!("{prefix}┃   {message}\n", format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_line!("{prefix}┃   {message}\n", $expr)
    };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::__log_line!("{prefix}┃{message}\n", "")
    };
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_line!("{prefix}┃\n{prefix}┣ {message}\n", format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_line!("{prefix}┃\n{prefix}┣ {message}\n", $expr)
    };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_line!(
            "{prefix}┏ raillamp v{message} ━━╸\n",
            env!("CARGO_PKG_VERSION")
        )
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::__log_line!("{prefix}╹{message}\n", "")
    };
}

/// Log a warning message with yellow level tag.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_line!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n", format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_line!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n", $expr)
    };
}

/// Log an error message with red level tag.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_line!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n", format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_line!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n", $expr)
    };
}

/// Log an error that ends the current flow, closing the block with a corner.
#[macro_export]
macro_rules! log_error_exit {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_line!(
            "{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n",
            format!($fmt $($arg)*)
        )
    };
    ($expr:expr) => {
        $crate::__log_line!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n", $expr)
    };
}

/// Log an informational message with green level tag.
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_line!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n", format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_line!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n", $expr)
    };
}

/// Log a debug/operational message.
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_line!("{prefix}┣[\x1b[32mDEBUG\x1b[0m] {message}\n", format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_line!("{prefix}┣[\x1b[32mDEBUG\x1b[0m] {message}\n", $expr)
    };
}

/// Log a critical message with red level tag.
#[macro_export]
macro_rules! log_critical {
    ($fmt:literal $($arg:tt)*) => {
        $crate::__log_line!("{prefix}┣[\x1b[31mCRITICAL\x1b[0m] {message}\n", format!($fmt $($arg)*))
    };
    ($expr:expr) => {
        $crate::__log_line!("{prefix}┣[\x1b[31mCRITICAL\x1b[0m] {message}\n", $expr)
    };
}
