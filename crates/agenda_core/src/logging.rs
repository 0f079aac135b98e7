//! File logging for the agenda process.
//!
//! # Responsibility
//! - Start one rolling log file per process and keep its handle alive.
//! - Log panics as a single sanitized line before the default hook runs.
//!
//! # Invariants
//! - Events carry ids and counts only, never names, phones or titles.
//! - A second `init_logging` with the same level and directory is a no-op;
//!   any other combination is rejected.
//! - Initialization reports failures and never panics.

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "agenda";
const ROTATE_AT_BYTES: u64 = 4 * 1024 * 1024;
const KEPT_LOG_FILES: usize = 3;
const PANIC_SUMMARY_CHARS: usize = 120;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Configuration the running logger was started with.
struct ActiveLogger {
    level: &'static str,
    log_dir: PathBuf,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn ensure_matches(&self, level: &str, log_dir: &Path) -> Result<(), String> {
        if self.log_dir != log_dir {
            return Err(format!(
                "logging already writes to `{}`; refusing to switch to `{}`",
                self.log_dir.display(),
                log_dir.display()
            ));
        }
        if self.level != level {
            return Err(format!(
                "logging already runs at `{}`; refusing to switch to `{level}`",
                self.level
            ));
        }
        Ok(())
    }
}

/// Starts agenda file logging at `level` under the absolute `log_dir`.
///
/// Error records are also written to stderr.
pub fn init_logging(level: &str, log_dir: impl AsRef<Path>) -> Result<(), String> {
    let level = normalize_level(level)?;
    let log_dir = log_dir.as_ref();
    if !log_dir.is_absolute() {
        return Err(format!(
            "log directory must be absolute, got `{}`",
            log_dir.display()
        ));
    }

    let active = ACTIVE.get_or_try_init(|| -> Result<ActiveLogger, String> {
        let handle = start_logger(level, log_dir)?;
        install_panic_hook();
        info!(
            "event=logging_init module=agenda status=ok level={level} build={} version={}",
            build_mode(),
            env!("CARGO_PKG_VERSION")
        );
        Ok(ActiveLogger {
            level,
            log_dir: log_dir.to_path_buf(),
            _handle: handle,
        })
    })?;

    // Covers both repeat calls and a lost initialization race.
    active.ensure_matches(level, log_dir)
}

/// Level and directory of the running logger, if any.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.level, active.log_dir.clone()))
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Maps user input to one of the supported level names.
pub(crate) fn normalize_level(level: &str) -> Result<&'static str, String> {
    let wanted = match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        other => other.to_string(),
    };
    LEVELS
        .into_iter()
        .find(|known| *known == wanted)
        .ok_or_else(|| format!("unknown log level `{wanted}`; use one of {}", LEVELS.join("|")))
}

fn start_logger(level: &str, log_dir: &Path) -> Result<LoggerHandle, String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|err| format!("cannot create log directory `{}`: {err}", log_dir.display()))?;

    Logger::try_with_str(level)
        .map_err(|err| format!("log level `{level}` rejected: {err}"))?
        .log_to_file(FileSpec::default().directory(log_dir).basename(LOG_BASENAME))
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEPT_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .duplicate_to_stderr(Duplicate::Error)
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("logger failed to start: {err}"))
}

fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic module=agenda status=error location={location} payload={}",
            summarize_panic(info)
        );
        default_hook(info);
    }));
}

fn summarize_panic(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    one_line(text, PANIC_SUMMARY_CHARS)
}

/// Flattens `text` to one line of at most `limit` characters plus `...`.
fn one_line(text: &str, limit: usize) -> String {
    let mut flat = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(limit + 1)
        .collect::<String>();
    if flat.chars().count() > limit {
        flat = flat.chars().take(limit).collect();
        flat.push_str("...");
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::{default_log_level, init_logging, logging_status, normalize_level, one_line};

    #[test]
    fn levels_normalize_and_unknown_is_rejected() {
        assert_eq!(normalize_level(" INFO ").unwrap(), "info");
        assert_eq!(normalize_level("Warning").unwrap(), "warn");
        assert!(normalize_level("loud").unwrap_err().contains("trace|debug"));
        assert!(normalize_level(default_log_level()).is_ok());
    }

    #[test]
    fn panic_text_is_flattened_and_capped() {
        assert_eq!(one_line("Lunch\nwith\rAna", 40), "Lunch with Ana");
        assert_eq!(one_line("abcdefgh", 3), "abc...");
        assert_eq!(one_line("abc", 3), "abc");
    }

    #[test]
    fn relative_directory_is_rejected() {
        assert!(init_logging("info", "logs/agenda")
            .unwrap_err()
            .contains("absolute"));
    }

    #[test]
    fn second_init_must_repeat_the_first_configuration() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        init_logging("info", first.path()).unwrap();
        init_logging("INFO", first.path()).unwrap();
        assert!(init_logging("debug", first.path())
            .unwrap_err()
            .contains("refusing"));
        assert!(init_logging("info", second.path())
            .unwrap_err()
            .contains("refusing"));

        assert_eq!(
            logging_status(),
            Some(("info", first.path().to_path_buf()))
        );
    }
}
