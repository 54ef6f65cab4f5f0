//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variables read by [`crate::models::Config::merge_from_env`]
pub const SUPPORTED_ENV_VARS: &[(&str, &str)] = &[
    ("PING_COUNT", "Number of probes to send"),
    ("PING_INTERVAL", "Seconds between probes"),
    ("PING_SIZE", "Echo payload size in bytes"),
    ("PING_TTL", "Outgoing TTL / hop limit"),
    ("PING_DEADLINE", "Run deadline in seconds"),
    ("PING_ENABLE_COLOR", "Enable colored output (true/false)"),
];

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the current directory if it exists
    ///
    /// Returns whether a file was loaded. Variables already set in the
    /// process environment win over the file.
    pub fn load_env_file() -> Result<bool> {
        let path = Path::new(".env");
        if !path.exists() {
            return Ok(false);
        }
        Self::load_env_file_from(path)?;
        Ok(true)
    }

    /// Load a specific env file
    pub fn load_env_file_from(path: &Path) -> Result<()> {
        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))
    }

    /// Supported variables that are currently set, as `(name, value)`
    pub fn active_env_vars() -> Vec<(&'static str, String)> {
        SUPPORTED_ENV_VARS
            .iter()
            .filter_map(|(name, _)| std::env::var(name).ok().map(|value| (*name, value)))
            .collect()
    }

    /// Help text listing the supported variables
    pub fn display_env_help() -> String {
        let mut help = String::from("Environment variables:\n");
        for (name, description) in SUPPORTED_ENV_VARS {
            help.push_str(&format!("  {:<18} {}\n", name, description));
        }
        help
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_env_file_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "PING_TEST_ONLY_MARKER=from-file").unwrap();

        EnvManager::load_env_file_from(file.path()).unwrap();
        assert_eq!(std::env::var("PING_TEST_ONLY_MARKER").unwrap(), "from-file");
        std::env::remove_var("PING_TEST_ONLY_MARKER");
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EnvManager::load_env_file_from(&dir.path().join("absent.env")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();
        for (name, _) in SUPPORTED_ENV_VARS {
            assert!(help.contains(name));
        }
    }
}
