//! Configuration file support for neurodose.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/neurodose/config.toml`.

use crate::protocol::{get_default_catalog, ProtocolCatalog, ProtocolDefinition};
use crate::{Error, Result, WeightUnit};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub units: UnitsConfig,

    #[serde(default)]
    pub protocols: ProtocolsConfig,
}

/// Weight entry defaults
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UnitsConfig {
    #[serde(default)]
    pub default_unit: WeightUnit,
}

/// User-defined dosing protocols
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ProtocolsConfig {
    #[serde(default)]
    pub custom: Vec<ProtocolDefinition>,
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::default_config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from(".config"))
        });
        base.join("neurodose").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Built-in protocols followed by the custom ones from this config
    pub fn catalog(&self) -> ProtocolCatalog {
        if !self.protocols.custom.is_empty() {
            tracing::debug!(
                "Adding {} custom protocol(s) to catalog",
                self.protocols.custom.len()
            );
        }
        get_default_catalog().with_custom(&self.protocols.custom)
    }

    /// Catalog for this config, failing if any protocol is invalid
    pub fn validated_catalog(&self) -> Result<ProtocolCatalog> {
        let catalog = self.catalog();
        let errors = catalog.validate();
        if errors.is_empty() {
            return Ok(catalog);
        }

        for error in &errors {
            tracing::warn!("Rejected protocol configuration: {}", error);
        }
        Err(Error::CatalogValidation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Milligrams;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.units.default_unit, WeightUnit::Kilograms);
        assert!(config.protocols.custom.is_empty());
        assert_eq!(config.catalog().len(), 2);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[units]
default_unit = "lbs"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.units.default_unit, WeightUnit::Pounds);
        assert!(config.protocols.custom.is_empty()); // default
    }

    #[test]
    fn test_custom_protocols() {
        crate::logging::init_test();

        let toml_str = r#"
[[protocols.custom]]
type = "tiered"
id = "low_weight"
name = "Low weight tiers"
drug = "Example"
ceiling_mg = 10
tiers = [
    { below_kg = 40, dose_mg = 5 },
    { below_kg = 60, dose_mg = 7.5 },
]

[[protocols.custom]]
type = "proportional"
id = "half_dose"
name = "Half-dose infusion"
drug = "Example"
mg_per_kg = 0.45
max_total_mg = 45
bolus_percent = 15
infusion_minutes = 60
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.protocols.custom.len(), 2);

        let catalog = config.validated_catalog().unwrap();
        assert_eq!(catalog.len(), 4);

        let tiers = catalog.get("low_weight").unwrap();
        assert_eq!(
            tiers.dose_for(45.0).unwrap().total(),
            Milligrams::from_tenths(75)
        );

        let split = catalog.get("half_dose").unwrap();
        assert_eq!(
            split.dose_for(200.0).unwrap().total(),
            Milligrams::from_tenths(450)
        );
    }

    #[test]
    fn test_invalid_custom_protocol_rejected() {
        let toml_str = r#"
[[protocols.custom]]
type = "tiered"
id = "tenecteplase"
name = "Shadow"
drug = "Example"
ceiling_mg = 10
tiers = []
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        match config.validated_catalog() {
            Err(Error::CatalogValidation(msg)) => assert!(msg.contains("Duplicate")),
            other => panic!("Expected CatalogValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let toml_str = r#"
[units]
default_unit = "stone"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.units.default_unit = WeightUnit::Pounds;
        config.protocols.custom = vec![ProtocolDefinition::Tiered {
            id: "tnk_copy".into(),
            name: "Copy of tenecteplase".into(),
            drug: "Tenecteplase".into(),
            tiers: vec![crate::WeightTier {
                below_kg: 60.0,
                dose_mg: Milligrams::from_tenths(150),
            }],
            ceiling_mg: Milligrams::from_tenths(175),
        }];
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.units.default_unit, WeightUnit::Pounds);
        assert_eq!(loaded.protocols.custom, config.protocols.custom);
        assert!(loaded.validated_catalog().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.units.default_unit, WeightUnit::Kilograms);
    }
}
