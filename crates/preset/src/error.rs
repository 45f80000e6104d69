use thiserror::Error;

/// Result type for preset operations
pub type Result<T> = std::result::Result<T, PresetError>;

/// Errors that can occur while compiling, expanding or storing presets
#[derive(Error, Debug)]
pub enum PresetError {
    /// A selected path is absolute, escapes the project, or is malformed
    #[error("Unsafe path '{path}': {reason}")]
    UnsafePath { path: String, reason: &'static str },

    /// A stored pattern is absolute or escapes the project
    #[error("Unsafe pattern '{pattern}': {reason}")]
    UnsafePattern {
        pattern: String,
        reason: &'static str,
    },

    /// A stored pattern could not be compiled into a glob matcher
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Preset names must be plain file stems
    #[error("Invalid preset name: {0}")]
    InvalidPresetName(String),

    /// No stored preset with the given name
    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PresetError {
    /// Create an unsafe selection path error
    pub fn unsafe_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::UnsafePath {
            path: path.into(),
            reason,
        }
    }

    /// Create an unsafe stored pattern error
    pub fn unsafe_pattern(pattern: impl Into<String>, reason: &'static str) -> Self {
        Self::UnsafePattern {
            pattern: pattern.into(),
            reason,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether this error comes from the path/pattern safety checks
    pub fn is_unsafe_input(&self) -> bool {
        matches!(self, Self::UnsafePath { .. } | Self::UnsafePattern { .. })
    }
}
