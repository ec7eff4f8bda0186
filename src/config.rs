//! Configuration for the bill-of-materials tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (bom.toml)
//! - Environment variables (BOM__*)
//!
//! ## Example config file (bom.toml):
//! ```toml
//! [manifest]
//! path = "bill-of-materials/repos.yaml"
//! strict_dependencies = false
//!
//! [analysis]
//! excellent_docs_ratio = 0.5
//! comprehensive_coverage_ratio = 0.3
//!
//! [output]
//! format = "pretty"
//! ```
//!
//! Environment overrides use a double underscore between sections, e.g.
//! `BOM__MANIFEST__STRICT_DEPENDENCIES=true`.

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::analysis::AnalysisThresholds;
use crate::registry::LoadOptions;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BomConfig {
    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the manifest lives and how strictly to load it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,

    /// Require dependencies to resolve to records in the manifest
    #[serde(default)]
    pub strict_dependencies: bool,
}

/// Integration analysis thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_excellent_docs_ratio")]
    pub excellent_docs_ratio: f64,

    #[serde(default = "default_comprehensive_coverage_ratio")]
    pub comprehensive_coverage_ratio: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    /// Serialize `value` as JSON in this format
    pub fn to_json<T: Serialize>(self, value: &T) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("bill-of-materials/repos.yaml")
}

fn default_excellent_docs_ratio() -> f64 {
    AnalysisThresholds::default().excellent_docs_ratio
}

fn default_comprehensive_coverage_ratio() -> f64 {
    AnalysisThresholds::default().comprehensive_coverage_ratio
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
            strict_dependencies: false,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            excellent_docs_ratio: default_excellent_docs_ratio(),
            comprehensive_coverage_ratio: default_comprehensive_coverage_ratio(),
        }
    }
}

impl BomConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["bom.toml", ".bom.toml", "config/bom.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "foundry", "bom") {
            let xdg_config = config_dir.config_dir().join("bom.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("BOM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let config: Self = config.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    fn check(&self) -> Result<(), ConfigError> {
        for (key, ratio) in [
            ("analysis.excellent_docs_ratio", self.analysis.excellent_docs_ratio),
            (
                "analysis.comprehensive_coverage_ratio",
                self.analysis.comprehensive_coverage_ratio,
            ),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::Message(format!(
                    "{} must be between 0 and 1, got {}",
                    key, ratio
                )));
            }
        }
        Ok(())
    }

    /// Manifest path, resolved against the working directory
    pub fn manifest_path(&self) -> PathBuf {
        if self.manifest.path.is_absolute() {
            self.manifest.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.manifest.path)
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strict_dependencies: self.manifest.strict_dependencies,
        }
    }

    pub fn thresholds(&self) -> AnalysisThresholds {
        AnalysisThresholds {
            excellent_docs_ratio: self.analysis.excellent_docs_ratio,
            comprehensive_coverage_ratio: self.analysis.comprehensive_coverage_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = BomConfig::default();
        assert!(!config.manifest.strict_dependencies);
        assert_eq!(config.manifest.path, PathBuf::from("bill-of-materials/repos.yaml"));
        assert_eq!(config.thresholds(), AnalysisThresholds::default());
        assert_eq!(config.output.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_serialize_config() {
        let config = BomConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[manifest]"));
        assert!(toml_str.contains("[analysis]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[manifest]\npath = \"/srv/bom/repos.yaml\"\nstrict_dependencies = true\n\n[output]\nformat = \"compact\"\n",
        )
        .unwrap();

        let config = BomConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert!(config.load_options().strict_dependencies);
        assert_eq!(config.manifest_path(), PathBuf::from("/srv/bom/repos.yaml"));
        assert_eq!(config.output.format, OutputFormat::Compact);
        assert_eq!(config.analysis.excellent_docs_ratio, 0.5);
    }

    #[test]
    fn test_rejects_out_of_range_ratio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[analysis]\nexcellent_docs_ratio = 1.5\n").unwrap();

        assert!(BomConfig::load_from(Some(path.to_str().unwrap())).is_err());
    }
}
