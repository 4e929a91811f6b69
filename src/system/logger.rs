use std::str::FromStr;

use chrono::Utc;
use config::Config;
use log::{Level, Log, Metadata, Record};

/// Installs the process-wide logging backend from system config.
///
/// Another system created earlier in the same process may already
/// have installed one; the first installation wins and later calls
/// are no-ops.
pub(crate) fn init(cfg: &Config) {
    let level = cfg
        .get_str("log.level")
        .ok()
        .and_then(|l| Level::from_str(&l).ok())
        .unwrap_or(Level::Debug);

    let logger = SimpleLogger {
        level,
        cfg: LoggerConfig::from(cfg),
    };

    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(level.to_level_filter());
    }
}

/// Plain stdout logger.
///
/// The line format is fixed as `{date} {time} {level} [{module}] {body}`;
/// date and time formats come from `log.date_format` and
/// `log.time_format`. Modules matching an entry of `log.filter` are
/// suppressed.
struct SimpleLogger {
    level: Level,
    cfg: LoggerConfig,
}

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let module = record.module_path().unwrap_or_default();
        if self.cfg.filter.iter().any(|f| module.contains(f)) {
            return;
        }

        let now = Utc::now();
        println!(
            "{} {} {} [{}] {}",
            now.format(&self.cfg.date_fmt),
            now.format(&self.cfg.time_fmt),
            record.level(),
            module,
            record.args()
        );
    }

    fn flush(&self) {}
}

struct LoggerConfig {
    date_fmt: String,
    time_fmt: String,
    filter: Vec<String>,
}

impl<'a> From<&'a Config> for LoggerConfig {
    fn from(cfg: &Config) -> Self {
        LoggerConfig {
            date_fmt: cfg
                .get_str("log.date_format")
                .unwrap_or_else(|_| "%Y-%m-%d".into()),
            time_fmt: cfg
                .get_str("log.time_format")
                .unwrap_or_else(|_| "%H:%M:%S%:z".into()),
            filter: cfg
                .get_array("log.filter")
                .unwrap_or_default()
                .into_iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}
