use crate::status::StatusSink;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest username the response buffers are sized for.
pub const MAX_USERNAME_LEN: usize = 127;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid parameters: {field}")]
    InvalidParameters { field: &'static str },
}

/// Identity material and output sink for a single authentication session.
#[derive(Clone)]
pub struct SessionConfig {
    pub interface: String,
    pub username: String,
    pub password: String,
    pub sink: Option<StatusSink>,
}

impl SessionConfig {
    pub fn new(
        interface: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        sink: StatusSink,
    ) -> Self {
        SessionConfig {
            interface: interface.into(),
            username: username.into(),
            password: password.into(),
            sink: Some(sink),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str| Err(ConfigError::InvalidParameters { field });

        if self.interface.is_empty() {
            return invalid("interface");
        }
        if self.username.is_empty() || self.username.as_bytes().contains(&0) {
            return invalid("username");
        }
        if self.username.len() > MAX_USERNAME_LEN {
            return invalid("username");
        }
        if self.password.is_empty() {
            return invalid("password");
        }
        if self.sink.is_none() {
            return invalid("sink");
        }
        Ok(())
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("interface", &self.interface)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sink", &self.sink.as_ref().map(|_| "<sink>"))
            .finish()
    }
}

/// Log verbosity accepted in the settings file and on the command line.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

fn default_interface() -> String {
    "en0".to_string()
}

/// Optional on-disk settings, merged under the command line by the front end.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub daemon: bool,
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            username: None,
            password: None,
            daemon: false,
            log_level: LogLevel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sink() -> StatusSink {
        Arc::new(|_| {})
    }

    #[test]
    fn test_minimal_valid_config() {
        let config = SessionConfig::new("eth0", "u", "p", sink());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_each_missing_field() {
        let cases = [
            (SessionConfig::new("", "user", "pass", sink()), "interface"),
            (SessionConfig::new("eth0", "", "pass", sink()), "username"),
            (SessionConfig::new("eth0", "user", "", sink()), "password"),
            (SessionConfig::new("eth0", "us\0er", "pass", sink()), "username"),
            (
                SessionConfig {
                    sink: None,
                    ..SessionConfig::new("eth0", "user", "pass", sink())
                },
                "sink",
            ),
        ];
        for (config, field) in cases {
            assert_eq!(config.validate(), Err(ConfigError::InvalidParameters { field }));
        }
    }

    #[test]
    fn test_rejects_oversized_username() {
        let long = "a".repeat(MAX_USERNAME_LEN + 1);
        let config = SessionConfig::new("eth0", long, "pass", sink());
        assert!(config.validate().is_err());

        let longest = "a".repeat(MAX_USERNAME_LEN);
        let config = SessionConfig::new("eth0", longest, "pass", sink());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = SessionConfig::new("eth0", "user", "hunter2", sink());
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("user"));
    }
}
