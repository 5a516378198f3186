use log::{LevelFilter, Log, Metadata, Record};
use std::sync::OnceLock;

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Map a `RUST_LOG` value to a level. Unknown values fall back to `Info`.
fn parse_level(value: &str) -> LevelFilter {
    match value.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn resolve_level(quiet: bool, debug: bool, env_level: Option<String>) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else if debug {
        LevelFilter::Debug
    } else {
        env_level
            .as_deref()
            .map(parse_level)
            .unwrap_or(LevelFilter::Info)
    }
}

/// Install the stderr logger. `--quiet` and `--debug` win over `RUST_LOG`.
pub fn init(quiet: bool, debug: bool) {
    let level = resolve_level(quiet, debug, std::env::var("RUST_LOG").ok());

    let logger_ref = LOGGER.get_or_init(|| StderrLogger { level });
    if log::set_logger(logger_ref).is_ok() {
        log::set_max_level(level);
    }
}
