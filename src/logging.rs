//! Logging module
//!
//! Module-tagged, leveled logging. Every record is kept in an in-memory
//! ring buffer, appended to a log file once [`init`] has run, and echoed to
//! stderr in developer mode.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Local;
use once_cell::sync::Lazy;

use crate::config;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Developer mode: DEBUG records are kept and everything is echoed to stderr
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

static LOG_BUFFER: Lazy<Mutex<VecDeque<String>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(config::app::LOG_BUFFER_LINES)));

static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

/// Directory holding the log file
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(config::app::NAME)
        .join("logs")
}

/// Open the session log file. Failure keeps logging in memory only.
pub fn init() {
    let dir = log_dir();
    let path = dir.join(format!(
        "{}-{}.log",
        config::app::NAME,
        Local::now().format("%Y%m%d-%H%M%S")
    ));

    let opened = std::fs::create_dir_all(&dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));

    match opened {
        Ok(file) => {
            if let Ok(mut guard) = LOG_FILE.lock() {
                *guard = Some(file);
            }
            write(LogLevel::Info, "logging", format!("Log file: {}", path.display()));
        }
        Err(e) => write(
            LogLevel::Warn,
            "logging",
            format!("Failed to open log file {}: {}", path.display(), e),
        ),
    }
}

/// Switch between developer (DEBUG) and normal (INFO) logging
pub fn set_log_level(developer_mode: bool) {
    DEBUG_ENABLED.store(developer_mode, Ordering::SeqCst);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}

/// Buffered log lines, oldest first
pub fn get_logs() -> Vec<String> {
    LOG_BUFFER
        .lock()
        .map(|buffer| buffer.iter().cloned().collect())
        .unwrap_or_default()
}

/// Record a message. Use the `log_*!` macros instead of calling this directly.
pub fn write(level: LogLevel, module: &str, message: String) {
    let debug = is_debug_enabled();
    if level == LogLevel::Debug && !debug {
        return;
    }

    let line = format!(
        "[{}] [{}] [{}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        level.as_str(),
        module,
        message
    );

    if debug {
        eprintln!("{}", line);
    }

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
    }

    if let Ok(mut buffer) = LOG_BUFFER.lock() {
        if buffer.len() >= config::app::LOG_BUFFER_LINES {
            buffer.pop_front();
        }
        buffer.push_back(line);
    }
}

#[macro_export]
macro_rules! log_debug {
    ($module:expr, $($arg:tt)+) => {
        $crate::logging::write($crate::logging::LogLevel::Debug, $module, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $($arg:tt)+) => {
        $crate::logging::write($crate::logging::LogLevel::Info, $module, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $($arg:tt)+) => {
        $crate::logging::write($crate::logging::LogLevel::Warn, $module, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $($arg:tt)+) => {
        $crate::logging::write($crate::logging::LogLevel::Error, $module, format!($($arg)+))
    };
}
