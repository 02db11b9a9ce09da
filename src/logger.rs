use std::io;
use log::LevelFilter;
use fern::colors::{ColoredLevelConfig, Color};
use anyhow::Result;

use crate::config::LogSettings;

/// Where skill diagnostics go and how much of them
#[derive(Debug, PartialEq)]
pub struct LogConfig {
    /// Level for stderr; stdout is reserved for responses
    pub console_level: LevelFilter,
    /// Level for the log file
    pub file_level: LevelFilter,
    /// Log file path (None means stderr only)
    pub log_file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from(&LogSettings::default())
    }
}

impl From<&LogSettings> for LogConfig {
    fn from(settings: &LogSettings) -> Self {
        Self {
            console_level: parse_log_level(&settings.level),
            file_level: parse_log_level(&settings.file_level),
            log_file: settings.file.clone().filter(|f| !f.trim().is_empty()),
        }
    }
}

/// Install the global logger. Can only succeed once per process.
pub fn init(config: LogConfig) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    // Every line carries the module, so selector and fetcher output can be told apart
    let base_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .level(config.console_level.max(file_threshold(&config)));

    // Response JSON goes to stdout, so diagnostics stay on stderr
    let console_config = fern::Dispatch::new()
        .level(config.console_level)
        .chain(io::stderr());

    let mut log_config = base_config.chain(console_config);

    if let Some(log_file) = config.log_file {
        let file_config = fern::Dispatch::new()
            .level(config.file_level)
            .chain(fern::log_file(log_file)?);

        log_config = log_config.chain(file_config);
    }

    log_config.apply()?;

    Ok(())
}

// The file level only matters when there is a file to write to
fn file_threshold(config: &LogConfig) -> LevelFilter {
    match config.log_file {
        Some(_) => config.file_level,
        None => LevelFilter::Off,
    }
}

/// Map a config or CLI level name to a filter; unknown names mean Info
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
