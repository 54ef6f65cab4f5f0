//! Structured diagnostics on stderr
//!
//! Loggers are named per component and tagged with the run's session id.
//! `--debug` switches to one JSON object per line with source locations.
//! Per-reply output is not logging; it goes through [`crate::output`].

use crate::error::AppError;
use crate::models::{Config, Observation};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Severity of a diagnostic, least severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Every matched reply
    Trace,
    /// Per-packet engine decisions
    Debug,
    /// Run lifecycle
    Info,
    Warn,
    Error,
    /// Nothing below this is written by [`Logger::quiet`]
    Fatal,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    fn painted(&self) -> ColoredString {
        let label = format!("{:>5}", self.as_str());
        match self {
            LogLevel::Trace => label.dimmed(),
            LogLevel::Debug => label.cyan(),
            LogLevel::Info => label.green(),
            LogLevel::Warn => label.yellow(),
            LogLevel::Error => label.red(),
            LogLevel::Fatal => label.magenta().bold(),
        }
    }
}

/// One diagnostic before rendering
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub logger: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
    /// `file:line` of the call site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `time LEVEL [name] message {fields}`
    Console,
    /// One JSON object per line
    Json,
}

/// A named component logger
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    min_level: LogLevel,
    format: LogFormat,
    use_color: bool,
    include_location: bool,
    session_id: Option<String>,
}

impl Logger {
    /// Console logger at Info
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            min_level: LogLevel::Info,
            format: LogFormat::Console,
            use_color: false,
            include_location: false,
            session_id: None,
        }
    }

    /// Level and format follow the `--debug`/`--verbose` flags
    pub fn with_config(name: &str, config: &Config) -> Self {
        let (min_level, format) = if config.debug {
            (LogLevel::Debug, LogFormat::Json)
        } else if config.verbose {
            (LogLevel::Info, LogFormat::Console)
        } else {
            (LogLevel::Warn, LogFormat::Console)
        };

        Self {
            min_level,
            format,
            use_color: config.enable_color,
            include_location: config.debug,
            ..Self::new(name)
        }
    }

    /// A logger that drops everything below Fatal
    pub fn quiet(name: &str) -> Self {
        Self {
            min_level: LogLevel::Fatal,
            ..Self::new(name)
        }
    }

    /// Tag every entry with `session_id`
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder {
            logger: self,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                logger: self.name.clone(),
                message: message.to_string(),
                session_id: self.session_id.clone(),
                fields: BTreeMap::new(),
                location: None,
            },
        }
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Json => serde_json::to_string(entry)
                .unwrap_or_else(|e| format!("{{\"level\":\"ERROR\",\"message\":\"unserializable entry: {}\"}}", e)),
            LogFormat::Console => {
                let level = if self.use_color {
                    entry.level.painted().to_string()
                } else {
                    format!("{:>5}", entry.level.as_str())
                };

                let mut line = format!(
                    "{} {} [{}] {}",
                    entry.timestamp.format("%H:%M:%S%.3f"),
                    level,
                    entry.logger,
                    entry.message
                );

                let mut fields: Vec<String> = Vec::new();
                if let Some(session_id) = &entry.session_id {
                    fields.push(format!("session_id={}", session_id));
                }
                fields.extend(entry.fields.iter().map(|(k, v)| format!("{}={}", k, v)));
                if !fields.is_empty() {
                    line.push_str(&format!(" {{{}}}", fields.join(", ")));
                }

                if let Some(location) = entry.location.as_ref().filter(|_| self.include_location) {
                    line.push_str(" @ ");
                    line.push_str(location);
                }
                line
            }
        }
    }
}

/// Collects fields for one entry; nothing is written until [`log`](Self::log)
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl LogEntryBuilder<'_> {
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32) -> Self {
        self.entry.location = Some(format!("{}:{}", file, line));
        self
    }

    /// Fields of a matched reply
    pub fn observation(self, observation: &Observation) -> Self {
        self.field("icmp_seq", observation.sequence)
            .field("rtt_ms", observation.round_trip_ms())
            .field("ttl", observation.ttl)
            .field("bytes", observation.bytes)
            .field("source", observation.source.to_string())
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    /// Write the entry to stderr if its level is enabled
    ///
    /// stdout carries the probe output, so diagnostics never go there.
    pub fn log(self) {
        if !self.logger.enabled(self.entry.level) {
            return;
        }
        let line = self.logger.render(&self.entry);
        let _ = writeln!(io::stderr().lock(), "{}", line);
    }
}

/// Hands out component loggers sharing one configuration and session id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config, session_id: String) -> Self {
        Self { config, session_id }
    }

    pub fn create_logger(&self, name: &str) -> Logger {
        Logger::with_config(name, &self.config).with_session_id(self.session_id.clone())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Debug entry carrying the call site
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!())
            .log()
    };
}

/// Info entry carrying the call site
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
            .location(file!(), line!())
            .log()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry() -> LogEntry {
        let mut fields = BTreeMap::new();
        fields.insert("reason".to_string(), serde_json::json!("count reached"));
        LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            logger: "ENGINE".to_string(),
            message: "Run finished".to_string(),
            session_id: Some("beef".to_string()),
            fields,
            location: Some("src/executor/mod.rs:42".to_string()),
        }
    }

    #[test]
    fn test_level_follows_flags() {
        let debug = Logger::with_config("T", &Config { debug: true, ..Default::default() });
        assert!(debug.enabled(LogLevel::Debug));
        assert!(!debug.enabled(LogLevel::Trace));
        assert_eq!(debug.format, LogFormat::Json);

        let verbose = Logger::with_config("T", &Config { verbose: true, ..Default::default() });
        assert!(verbose.enabled(LogLevel::Info));
        assert!(!verbose.enabled(LogLevel::Debug));

        let default = Logger::with_config("T", &Config::default());
        assert!(default.enabled(LogLevel::Warn));
        assert!(!default.enabled(LogLevel::Info));
    }

    #[test]
    fn test_quiet_logger() {
        let logger = Logger::quiet("ENGINE");
        assert!(!logger.enabled(LogLevel::Error));
        assert!(logger.enabled(LogLevel::Fatal));
    }

    #[test]
    fn test_console_rendering() {
        let logger = Logger::new("ENGINE");
        let line = logger.render(&entry());

        assert!(line.contains(" INFO [ENGINE] Run finished"));
        assert!(line.contains("session_id=beef"));
        assert!(line.contains("reason=\"count reached\""));
        // Locations only show up in debug mode
        assert!(!line.contains("src/executor/mod.rs:42"));
    }

    #[test]
    fn test_json_rendering() {
        let logger = Logger::with_config("ENGINE", &Config { debug: true, ..Default::default() });
        let parsed: serde_json::Value = serde_json::from_str(&logger.render(&entry())).unwrap();

        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["message"], "Run finished");
        assert_eq!(parsed["session_id"], "beef");
        assert_eq!(parsed["fields"]["reason"], "count reached");
        assert_eq!(parsed["location"], "src/executor/mod.rs:42");
    }

    #[test]
    fn test_builder_collects_fields() {
        let logger = Logger::quiet("TEST").with_session_id("0042");
        let observation = Observation {
            sequence: 3,
            round_trip: Duration::from_millis(12),
            ttl: Some(64),
            bytes: 64,
            source: "127.0.0.1".parse().unwrap(),
        };

        let builder = logger
            .info("reply")
            .observation(&observation)
            .error_info(&AppError::codec("short"))
            .location("test.rs", 1);

        assert_eq!(builder.entry.fields["icmp_seq"], 3);
        assert_eq!(builder.entry.fields["ttl"], 64);
        assert_eq!(builder.entry.fields["error_category"], "CODEC");
        assert_eq!(builder.entry.session_id.as_deref(), Some("0042"));
        assert_eq!(builder.entry.location.as_deref(), Some("test.rs:1"));
        builder.log();
    }

    #[test]
    fn test_factory_shares_session() {
        let factory = LoggerFactory::new(Config::default(), "abcd".to_string());
        let logger = factory.create_logger("ENGINE");
        assert_eq!(logger.name(), "ENGINE");
        assert_eq!(logger.session_id(), Some("abcd"));
        assert_eq!(factory.session_id(), "abcd");
    }
}
