// Configuration module for the leverage bracket picker
// Supports YAML configuration files for region layout, source parsing and team name aliases

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::report::OutputFormat;
use crate::topology::RegionHalves;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub regions: RegionSettings,
    #[serde(default)]
    pub sources: SourceSettings,
    /// Source team name -> canonical team name, applied to both sources before merging
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub output: OutputSettings,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.region_halves()?;
        Ok(config)
    }

    /// Load configuration from `path` if given, otherwise from the first default
    /// location that exists, otherwise use defaults.
    /// An explicit path that cannot be loaded is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = path {
            let config = Self::from_file(p)?;
            info!("Loaded configuration from {}", p.display());
            return Ok(config);
        }

        for default_path in &["bracket.yaml", "bracket.yml", ".bracket-config.yaml"] {
            let default_path = Path::new(default_path);
            if !default_path.exists() {
                continue;
            }
            match Self::from_file(default_path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", default_path.display());
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring {}: {}", default_path.display(), e),
            }
        }
        Ok(Self::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn region_halves(&self) -> Result<RegionHalves, ConfigError> {
        RegionHalves::new(self.regions.halves.clone())
    }

    /// Resolve a source team name through the alias table
    pub fn canonical_name(&self, name: &str) -> String {
        let name = name.trim();
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Region layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSettings {
    /// Two pairs of regions; the winners within a pair meet in the Final Four
    #[serde(default = "default_halves")]
    pub halves: [[String; 2]; 2],
}

impl Default for RegionSettings {
    fn default() -> Self {
        RegionSettings {
            halves: default_halves(),
        }
    }
}

fn default_halves() -> [[String; 2]; 2] {
    [
        ["South".to_string(), "East".to_string()],
        ["Midwest".to_string(), "West".to_string()],
    ]
}

/// How model probabilities are written in the forecast file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelScale {
    /// 0-100, optionally with a trailing %
    #[default]
    Percent,
    /// 0-1, scaled by 100 on read
    Fraction,
}

impl ModelScale {
    pub fn to_percent(self, value: f64) -> f64 {
        match self {
            ModelScale::Percent => value,
            ModelScale::Fraction => value * 100.0,
        }
    }
}

/// Source parsing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Data rows at the top of the crowd pick sheet that hold no picks
    #[serde(default = "default_crowd_header_rows")]
    pub crowd_header_rows: usize,

    #[serde(default)]
    pub model_scale: ModelScale,
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings {
            crowd_header_rows: default_crowd_header_rows(),
            model_scale: ModelScale::default(),
        }
    }
}

fn default_crowd_header_rows() -> usize {
    1
}

/// Output settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_aliases() -> BTreeMap<String, String> {
    [
        ("College of Charleston", "Charleston"),
        ("Miami (FL)", "Miami"),
        ("Michigan State", "Michigan St"),
        ("Kansas State", "Kansas St"),
        ("Boise State", "Boise St"),
        ("Kennesaw State", "Kennesaw St"),
        ("Louisiana-Lafayette", "Louisiana"),
        ("North Carolina State", "NC State"),
        ("North Carolina-Asheville", "UNC Asheville"),
        ("Northern Kentucky", "N Kentucky"),
        ("Saint Mary's (CA)", "Saint Mary's"),
        ("San Diego State", "San Diego St"),
        ("Southern California", "USC"),
        ("Texas Christian", "TCU"),
        ("UC-Santa Barbara", "UCSB"),
        ("Virginia Commonwealth", "VCU"),
        ("Connecticut", "UConn"),
        ("Florida Atlantic", "FAU"),
        ("Montana State", "Montana St"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            regions: RegionSettings::default(),
            sources: SourceSettings::default(),
            aliases: default_aliases(),
            output: OutputSettings::default(),
        }
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config() -> String {
    r#"# Leverage bracket picker configuration
# All values shown are defaults - uncomment and modify as needed

# Region layout
regions:
  # Two pairs of regions. Winners of the regions in one pair meet in the
  # national semifinal; the two pairs only meet in the championship game.
  halves: [["South", "East"], ["Midwest", "West"]]

# Source parsing
sources:
  # Rows under the header of the crowd pick sheet that carry no picks
  crowd_header_rows: 1
  # "percent" (0-100, "%" allowed) or "fraction" (0-1)
  model_scale: percent

# Team name aliases, applied to both sources before they are merged.
# Listing any alias replaces the built-in table.
# aliases:
#   Connecticut: UConn
#   Florida Atlantic: FAU

# Output
output:
  # "text" or "json"
  format: text
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sources.crowd_header_rows, 1);
        assert_eq!(config.sources.model_scale, ModelScale::Percent);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.aliases.len(), 19);
        assert_eq!(config.region_halves().unwrap(), RegionHalves::default());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
regions:
  halves: [["A", "B"], ["C", "D"]]
sources:
  model_scale: fraction
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        let halves = config.region_halves().unwrap();
        assert!(halves.are_opposed("A", "C"));
        assert_eq!(config.sources.model_scale, ModelScale::Fraction);
        // Defaults should still work
        assert_eq!(config.sources.crowd_header_rows, 1);
        assert_eq!(config.canonical_name("Connecticut"), "UConn");
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let config = Config::from_yaml_str(&generate_sample_config()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_regions_rejected() {
        let yaml = r#"
regions:
  halves: [["A", "B"], ["B", "D"]]
"#;
        assert!(matches!(
            Config::from_yaml_str(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_aliases_override() {
        let yaml = r#"
aliases:
  "Saint Peter's": "St Peter's"
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.aliases.len(), 1);
        assert_eq!(config.canonical_name(" Saint Peter's "), "St Peter's");
        assert_eq!(config.canonical_name("Connecticut"), "Connecticut");
    }

    #[test]
    fn test_missing_file() {
        let missing = Path::new("definitely/not/here.yaml");
        assert!(matches!(
            Config::from_file(missing),
            Err(ConfigError::NotFound(_))
        ));
        assert!(Config::load_or_default(Some(missing)).is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bracket.yaml");
        let mut config = Config::default();
        config.sources.crowd_header_rows = 0;
        config.save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
