//! Errors and their exit codes

use colored::{Color, Colorize};
use thiserror::Error;

/// Everything that can stop a run or be reported about one packet
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad `.env` file or unusable option combination
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value outside its accepted range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Numbers and addresses that do not parse
    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("DNS resolution error: {0}")]
    DnsResolution(String),

    /// Socket open, read and write failures
    #[error("Transport error: {0}")]
    Transport(String),

    /// Writing the report failed
    #[error("I/O error: {0}")]
    Io(String),

    /// A datagram that is not a well-formed ICMP message
    #[error("Codec error: {0}")]
    Codec(String),

    /// A task died or an invariant broke
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    pub fn dns_resolution<S: Into<String>>(message: S) -> Self {
        Self::DnsResolution(message.into())
    }

    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    pub fn codec<S: Into<String>>(message: S) -> Self {
        Self::Codec(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Short tag used in log fields and the console prefix
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Parse(_) => "PARSE",
            Self::DnsResolution(_) => "DNS",
            Self::Transport(_) => "TRANSPORT",
            Self::Io(_) => "IO",
            Self::Codec(_) => "CODEC",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Per-packet failures; the run keeps going after these
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Codec(_))
    }

    /// Process exit status when this error ends the program
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::DnsResolution(_) | Self::Transport(_) => 2,
            Self::Io(_) | Self::Codec(_) => 5,
            Self::Internal(_) => 99,
        }
    }

    fn color(&self) -> Color {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => Color::Red,
            Self::DnsResolution(_) | Self::Transport(_) => Color::Yellow,
            Self::Io(_) | Self::Codec(_) => Color::Cyan,
            Self::Internal(_) => Color::BrightRed,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Prints the error that ended the program
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }

    /// `[CATEGORY] message`, plus the exit status when verbose
    pub fn render(&self, error: &AppError) -> String {
        let category = error.category();
        let message = error.to_string();
        let mut out = if self.use_color {
            let color = error.color();
            format!("[{}] {}", category.color(color).bold(), message.color(color))
        } else {
            format!("[{}] {}", category, message)
        };

        if self.verbose {
            out.push_str(&format!("\n(exit status {})", error.exit_code()));
        }
        out
    }
}
