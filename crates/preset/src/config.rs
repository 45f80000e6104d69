use crate::error::{PresetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How permissive the compiler is allowed to be.
///
/// Each level applies every rule of the level below it plus its own.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// Full-directory globs and literals only
    Minimal,
    /// Adds near-full exclusions and per-directory extension globs
    #[default]
    Balanced,
    /// Adds project-wide extension globs and brace merges
    Aggressive,
}

impl OptimizationLevel {
    pub const ALL: [OptimizationLevel; 3] = [Self::Minimal, Self::Balanced, Self::Aggressive];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationLevel {
    type Err = PresetError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "balanced" => Ok(Self::Balanced),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(PresetError::invalid_config(format!(
                "unknown optimization level '{other}' (expected minimal|balanced|aggressive)"
            ))),
        }
    }
}

/// Which glob a per-directory extension grouping produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionGrouping {
    /// Always `dir/*.ext`
    Direct,
    /// `dir/**/*.ext` when the directory has subdirectories and every
    /// matching file below it is selected, `dir/*.ext` otherwise
    #[default]
    PreferRecursive,
}

/// Path comparison policy of the target filesystem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

/// Tunable policy constants of the compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Unselected files tolerated by a `balanced` near-full exclusion
    pub balanced_max_missing: usize,

    /// Unselected files tolerated by an `aggressive` near-full exclusion
    pub aggressive_max_missing: usize,

    /// Smallest number of selected files a single generalised glob may stand for
    pub min_files_per_glob: usize,

    /// Direct vs recursive extension globs
    pub extension_grouping: ExtensionGrouping,

    /// Case policy used when comparing selection paths with scanned paths
    pub case_sensitivity: CaseSensitivity,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            balanced_max_missing: 1,
            aggressive_max_missing: 2,
            min_files_per_glob: 2,
            extension_grouping: ExtensionGrouping::PreferRecursive,
            case_sensitivity: CaseSensitivity::Sensitive,
        }
    }
}

impl CompilerConfig {
    /// Config for projects living on a case-insensitive filesystem
    pub fn case_insensitive() -> Self {
        Self {
            case_sensitivity: CaseSensitivity::Insensitive,
            ..Default::default()
        }
    }

    /// Config that never emits exclusions and only direct extension globs
    pub fn conservative() -> Self {
        Self {
            balanced_max_missing: 0,
            aggressive_max_missing: 0,
            extension_grouping: ExtensionGrouping::Direct,
            ..Default::default()
        }
    }

    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Near-full threshold for `level` (0 disables the rule)
    pub fn max_missing(&self, level: OptimizationLevel) -> usize {
        match level {
            OptimizationLevel::Minimal => 0,
            OptimizationLevel::Balanced => self.balanced_max_missing,
            OptimizationLevel::Aggressive => self.aggressive_max_missing,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.min_files_per_glob == 0 {
            return Err(PresetError::invalid_config("min_files_per_glob must be > 0"));
        }

        if self.balanced_max_missing > self.aggressive_max_missing {
            return Err(PresetError::invalid_config(format!(
                "balanced_max_missing ({}) cannot exceed aggressive_max_missing ({})",
                self.balanced_max_missing, self.aggressive_max_missing
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(CompilerConfig::default().validate().is_ok());
        assert!(CompilerConfig::case_insensitive().validate().is_ok());
        assert!(CompilerConfig::conservative().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CompilerConfig {
            min_files_per_glob: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.min_files_per_glob = 2;
        config.balanced_max_missing = 3;
        assert!(config.validate().is_err());

        config.aggressive_max_missing = 3;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_thresholds_grow_with_level() {
        let config = CompilerConfig::default();
        assert_eq!(config.max_missing(OptimizationLevel::Minimal), 0);
        assert_eq!(config.max_missing(OptimizationLevel::Balanced), 1);
        assert_eq!(config.max_missing(OptimizationLevel::Aggressive), 2);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CompilerConfig::from_toml_str(
            r#"
aggressive_max_missing = 4
extension_grouping = "direct"
case_sensitivity = "insensitive"
"#,
        )
        .unwrap();

        assert_eq!(config.balanced_max_missing, 1);
        assert_eq!(config.aggressive_max_missing, 4);
        assert_eq!(config.extension_grouping, ExtensionGrouping::Direct);
        assert_eq!(config.case_sensitivity, CaseSensitivity::Insensitive);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(CompilerConfig::from_toml_str("min_files_per_glob = 0").is_err());
        assert!(CompilerConfig::from_toml_str("min_files_per_glob = \"two\"").is_err());
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(
            "Aggressive".parse::<OptimizationLevel>().unwrap(),
            OptimizationLevel::Aggressive
        );
        assert!("extreme".parse::<OptimizationLevel>().is_err());
        assert!(OptimizationLevel::Minimal < OptimizationLevel::Balanced);
        assert_eq!(OptimizationLevel::Balanced.to_string(), "balanced");
    }
}
