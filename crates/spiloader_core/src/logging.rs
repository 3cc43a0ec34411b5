//! Logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Initialize logging exactly once per process, either to rolling files or
//!   to stderr.
//! - Emit stable `event=... module=... status=...` diagnostic events.
//!
//! # Invariants
//! - Logging init is idempotent for the same level and target.
//! - Logging initialization must not panic.
//! - Re-initialization with a different level or target is rejected.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "spiloader";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    Directory(PathBuf),
}

impl LogTarget {
    fn describe(&self) -> String {
        match self {
            Self::Stderr => "stderr".to_string(),
            Self::Directory(dir) => dir.display().to_string(),
        }
    }
}

struct LoggingState {
    level: &'static str,
    target: LogTarget,
    _logger: LoggerHandle,
}

/// Initializes rotating file logging under `log_dir`.
///
/// # Errors
/// - `level` is unsupported.
/// - `log_dir` is empty, relative, or cannot be created.
/// - Logging was already initialized with a different level or target.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let level = normalize_level(level)?;
    let dir = normalize_log_dir(log_dir)?;
    init_with_target(level, LogTarget::Directory(dir))
}

/// Initializes logging to stderr.
///
/// # Errors
/// - `level` is unsupported.
/// - Logging was already initialized with a different level or target.
pub fn init_stderr_logging(level: &str) -> Result<(), String> {
    let level = normalize_level(level)?;
    init_with_target(level, LogTarget::Stderr)
}

fn init_with_target(level: &'static str, target: LogTarget) -> Result<(), String> {
    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, target.clone()))?;

    if state.target != target {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            state.target.describe(),
            target.describe()
        ));
    }
    if state.level != level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, level
        ));
    }
    Ok(())
}

fn start_logger(level: &'static str, target: LogTarget) -> Result<LoggingState, String> {
    let logger = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?;

    let logger = match &target {
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format)
            .start(),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                format!("failed to create log directory `{}`: {err}", dir.display())
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        }
    }
    .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();

    info!(
        "event=app_start module=core status=ok platform={} build_mode={} version={}",
        std::env::consts::OS,
        build_mode(),
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "event=logging_init module=core status=ok level={} target={}",
        level,
        target.describe()
    );

    Ok(LoggingState {
        level,
        target,
        _logger: logger,
    })
}

/// Returns `(level, target)` when logging is active.
pub fn logging_status() -> Option<(&'static str, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        )),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payload may carry provider-controlled text: single line, capped length.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location, payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    panic_message(info.payload())
}

/// Single-line, length-capped text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&message, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
