use crate::error::{Error, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What the resolver does when several rules tie at the top specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictMode {
    /// Record the conflict and use the earliest rule in list order.
    #[default]
    FirstMatch,
    /// Refuse to resolve: return `Error::AmbiguousPolicy`.
    Reject,
}

impl FromStr for ConflictMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first-match" | "first_match" => Ok(ConflictMode::FirstMatch),
            "reject" | "strict" => Ok(ConflictMode::Reject),
            other => Err(Error::Settings(format!(
                "unknown conflict mode '{}' (expected first-match or reject)",
                other
            ))),
        }
    }
}

impl fmt::Display for ConflictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictMode::FirstMatch => f.write_str("first-match"),
            ConflictMode::Reject => f.write_str("reject"),
        }
    }
}

/// How the CLI prints results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::Settings(format!(
                "unknown output format '{}' (expected human or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Human => f.write_str("human"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

/// Configuration for the fee-policy CLI and resolver.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of `<tenant_id>.json` policy documents (default: `policies/`)
    pub policy_dir: PathBuf,

    pub output_format: OutputFormat,

    /// Log level or `EnvFilter` directive (default: "warn")
    pub log_level: String,

    pub conflict_mode: ConflictMode,
}

impl Config {
    /// Create a new config with defaults
    pub fn new() -> Self {
        let policy_dir = env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("policies");

        Config {
            policy_dir,
            output_format: OutputFormat::Human,
            log_level: "warn".to_string(),
            conflict_mode: ConflictMode::FirstMatch,
        }
    }

    pub fn with_policy_dir(policy_dir: PathBuf) -> Self {
        Config {
            policy_dir,
            ..Config::new()
        }
    }

    pub fn get_policy_dir(&self) -> &PathBuf {
        &self.policy_dir
    }

    pub fn set_policy_dir(&mut self, dir: PathBuf) {
        self.policy_dir = dir;
    }

    pub fn get_output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn get_log_level(&self) -> &str {
        &self.log_level
    }

    pub fn set_log_level(&mut self, level: String) {
        self.log_level = level;
    }

    pub fn get_conflict_mode(&self) -> ConflictMode {
        self.conflict_mode
    }

    pub fn set_conflict_mode(&mut self, mode: ConflictMode) {
        self.conflict_mode = mode;
    }

    /// Load config from environment variables
    ///
    /// Environment variables:
    /// - `FEE_POLICY_DIR`: override policy directory
    /// - `FEE_POLICY_OUTPUT_FORMAT`: "human" or "json"
    /// - `FEE_POLICY_LOG_LEVEL`: log level
    /// - `FEE_POLICY_CONFLICT_MODE`: "first-match" or "reject"
    pub fn from_env() -> Result<Self> {
        let mut config = Config::new();

        if let Ok(dir) = env::var("FEE_POLICY_DIR") {
            config.policy_dir = PathBuf::from(dir);
        }

        if let Ok(format) = env::var("FEE_POLICY_OUTPUT_FORMAT") {
            config.output_format = format.parse()?;
        }

        if let Ok(level) = env::var("FEE_POLICY_LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(mode) = env::var("FEE_POLICY_CONFLICT_MODE") {
            config.conflict_mode = mode.parse()?;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new();
        assert_eq!(config.output_format, OutputFormat::Human);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.conflict_mode, ConflictMode::FirstMatch);
        assert!(config.policy_dir.ends_with("policies"));
    }

    #[test]
    fn test_config_setters() {
        let mut config = Config::with_policy_dir(PathBuf::from("/tmp/policies"));
        assert_eq!(config.get_policy_dir(), &PathBuf::from("/tmp/policies"));

        config.set_output_format(OutputFormat::Json);
        assert_eq!(config.get_output_format(), OutputFormat::Json);

        config.set_log_level("debug".to_string());
        assert_eq!(config.get_log_level(), "debug");

        config.set_conflict_mode(ConflictMode::Reject);
        assert_eq!(config.get_conflict_mode(), ConflictMode::Reject);
    }

    #[test]
    fn test_conflict_mode_parsing() {
        assert_eq!("first-match".parse::<ConflictMode>().unwrap(), ConflictMode::FirstMatch);
        assert_eq!(" Reject ".parse::<ConflictMode>().unwrap(), ConflictMode::Reject);
        assert_eq!("strict".parse::<ConflictMode>().unwrap(), ConflictMode::Reject);
        assert!(matches!(
            "highest".parse::<ConflictMode>(),
            Err(Error::Settings(_))
        ));
        assert_eq!(ConflictMode::Reject.to_string(), "reject");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("human".parse::<OutputFormat>().unwrap(), OutputFormat::Human);
        assert_eq!(
            "yaml".parse::<OutputFormat>().unwrap_err(),
            Error::Settings("unknown output format 'yaml' (expected human or json)".to_string())
        );
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
