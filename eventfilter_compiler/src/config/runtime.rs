// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerPreferences {
    /// Whether to log every top-level clause match at debug level
    pub log_match_details: bool,

    /// Whether to log each resolved reference
    pub log_resolution_details: bool,

    /// Whether to log each emitted element
    pub log_assembly_details: bool,

    /// Emit a select index when a WHERE operand is the same node as a select entry
    pub emit_select_indices: bool,
}

impl Default for CompilerPreferences {
    fn default() -> Self {
        Self {
            log_match_details: env::var(env_vars::COMPILER_LOG_MATCH_DETAILS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_resolution_details: env::var(env_vars::COMPILER_LOG_RESOLUTION_DETAILS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_assembly_details: env::var(env_vars::COMPILER_LOG_ASSEMBLY_DETAILS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            emit_select_indices: env::var(env_vars::COMPILER_EMIT_SELECT_INDICES)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging (user preference)
    pub use_structured_logging: bool,

    /// Whether to enable console output (user preference)
    pub enable_console_logging: bool,

    /// User preferred minimum log level
    pub min_log_level: LogLevel,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel for compatibility
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub compiler: CompilerPreferences,
    pub logging: LoggingPreferences,
}

/// Environment variable names for configuration
pub mod env_vars {
    // Compiler
    pub const COMPILER_LOG_MATCH_DETAILS: &str = "EFC_COMPILER_LOG_MATCH_DETAILS";
    pub const COMPILER_LOG_RESOLUTION_DETAILS: &str = "EFC_COMPILER_LOG_RESOLUTION_DETAILS";
    pub const COMPILER_LOG_ASSEMBLY_DETAILS: &str = "EFC_COMPILER_LOG_ASSEMBLY_DETAILS";
    pub const COMPILER_EMIT_SELECT_INDICES: &str = "EFC_COMPILER_EMIT_SELECT_INDICES";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "EFC_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "EFC_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "EFC_LOGGING_MIN_LEVEL";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("2"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_preferences_round_trip_through_json() {
        let config = RuntimeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(
            restored.compiler.emit_select_indices,
            config.compiler.emit_select_indices
        );
        assert_eq!(restored.logging.min_log_level, config.logging.min_log_level);
    }

    #[test]
    fn test_env_var_names_exist() {
        assert!(env_vars::COMPILER_EMIT_SELECT_INDICES.starts_with("EFC_"));
        assert!(env_vars::LOGGING_MIN_LEVEL.starts_with("EFC_"));
    }
}
