//! Dosing protocols as data.
//!
//! Built-in protocols and user-defined ones from the config file share one
//! representation, so adding a weight-banded or proportional scheme needs no
//! new code.

use crate::dosing::{SplitProtocol, ALTEPLASE};
use crate::rules::{Rule, RuleTable};
use crate::{DoseReport, DoseResult, Error, Milligrams, Result, WeightMeasurement};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<ProtocolCatalog> = Lazy::new(build_default_catalog);

/// One band of a tiered protocol: weights below `below_kg` get `dose_mg`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightTier {
    pub below_kg: f64,
    pub dose_mg: Milligrams,
}

/// A dosing protocol definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolDefinition {
    /// Fixed dose chosen by weight band, `ceiling_mg` at or above the last band
    Tiered {
        id: String,
        name: String,
        drug: String,
        tiers: Vec<WeightTier>,
        ceiling_mg: Milligrams,
    },
    /// mg/kg up to a maximum, split into a bolus and an infusion
    Proportional {
        id: String,
        name: String,
        drug: String,
        mg_per_kg: f64,
        max_total_mg: Milligrams,
        bolus_percent: u32,
        infusion_minutes: u32,
    },
}

impl ProtocolDefinition {
    pub fn id(&self) -> &str {
        match self {
            ProtocolDefinition::Tiered { id, .. }
            | ProtocolDefinition::Proportional { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ProtocolDefinition::Tiered { name, .. }
            | ProtocolDefinition::Proportional { name, .. } => name,
        }
    }

    pub fn drug(&self) -> &str {
        match self {
            ProtocolDefinition::Tiered { drug, .. }
            | ProtocolDefinition::Proportional { drug, .. } => drug,
        }
    }

    /// Weight-band table of a tiered protocol (None for proportional ones)
    pub fn rule_table(&self) -> Option<Result<RuleTable<Milligrams>>> {
        match self {
            ProtocolDefinition::Tiered {
                tiers, ceiling_mg, ..
            } => Some(tier_table(tiers, *ceiling_mg)),
            ProtocolDefinition::Proportional { .. } => None,
        }
    }

    /// Split parameters of a proportional protocol (None for tiered ones)
    pub fn split_protocol(&self) -> Option<SplitProtocol> {
        match self {
            ProtocolDefinition::Proportional {
                mg_per_kg,
                max_total_mg,
                bolus_percent,
                infusion_minutes,
                ..
            } => Some(SplitProtocol {
                mg_per_kg: *mg_per_kg,
                max_total: *max_total_mg,
                bolus_percent: *bolus_percent,
                infusion_minutes: *infusion_minutes,
            }),
            ProtocolDefinition::Tiered { .. } => None,
        }
    }

    /// Dose for an already-normalized weight in kilograms
    pub fn dose_for(&self, weight_kg: f64) -> Result<DoseResult> {
        match self {
            ProtocolDefinition::Tiered {
                tiers, ceiling_mg, ..
            } => {
                let table = tier_table(tiers, *ceiling_mg)?;
                let dose_mg = *table.evaluate_weight(weight_kg)?;
                Ok(DoseResult::Bolus { dose_mg })
            }
            ProtocolDefinition::Proportional {
                mg_per_kg,
                max_total_mg,
                bolus_percent,
                infusion_minutes,
                ..
            } => {
                let split = SplitProtocol {
                    mg_per_kg: *mg_per_kg,
                    max_total: *max_total_mg,
                    bolus_percent: *bolus_percent,
                    infusion_minutes: *infusion_minutes,
                };
                Ok(DoseResult::Split(split.dose(weight_kg)?))
            }
        }
    }

    /// Problems with this definition, empty if it is usable
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.id().trim().is_empty() {
            errors.push(format!("Protocol '{}' has an empty id", self.name()));
        }

        match self {
            ProtocolDefinition::Tiered { id, .. } => {
                if let Some(Err(e)) = self.rule_table() {
                    errors.push(format!("Protocol '{}': {}", id, e));
                }
            }
            ProtocolDefinition::Proportional { id, .. } => {
                if let Some(Err(e)) = self.split_protocol().map(|split| split.validate()) {
                    errors.push(format!("Protocol '{}': {}", id, e));
                }
            }
        }

        errors
    }
}

fn tier_table(tiers: &[WeightTier], ceiling_mg: Milligrams) -> Result<RuleTable<Milligrams>> {
    let rules = tiers
        .iter()
        .map(|tier| Rule::new(tier.below_kg, tier.dose_mg))
        .collect();
    RuleTable::new(rules, ceiling_mg)
}

/// Ordered collection of dosing protocols
#[derive(Clone, Debug, Default)]
pub struct ProtocolCatalog {
    protocols: Vec<ProtocolDefinition>,
}

impl ProtocolCatalog {
    pub fn new(protocols: Vec<ProtocolDefinition>) -> Self {
        Self { protocols }
    }

    /// This catalog with `custom` protocols appended after the existing ones
    pub fn with_custom(&self, custom: &[ProtocolDefinition]) -> Self {
        let mut protocols = self.protocols.clone();
        protocols.extend(custom.iter().cloned());
        Self { protocols }
    }

    pub fn get(&self, id: &str) -> Option<&ProtocolDefinition> {
        self.protocols.iter().find(|p| p.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtocolDefinition> {
        self.protocols.iter()
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    /// Validate every protocol and check ids are unique
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for protocol in &self.protocols {
            if !seen.insert(protocol.id()) {
                errors.push(format!("Duplicate protocol id '{}'", protocol.id()));
            }
            errors.extend(protocol.validate());
        }

        errors
    }
}

/// Get a reference to the cached built-in catalog
pub fn get_default_catalog() -> &'static ProtocolCatalog {
    &DEFAULT_CATALOG
}

/// Builds the catalog of built-in thrombolytic protocols
pub fn build_default_catalog() -> ProtocolCatalog {
    let tnk_table = crate::dosing::tiered_bolus_table();
    let tiers = tnk_table
        .rules()
        .iter()
        .map(|rule| WeightTier {
            below_kg: rule.upper_exclusive,
            dose_mg: rule.value,
        })
        .collect();

    ProtocolCatalog::new(vec![
        ProtocolDefinition::Tiered {
            id: "tenecteplase".into(),
            name: "Tenecteplase (stroke, single bolus)".into(),
            drug: "Tenecteplase".into(),
            tiers,
            ceiling_mg: *tnk_table.default_value(),
        },
        ProtocolDefinition::Proportional {
            id: "alteplase".into(),
            name: "Alteplase 0.9 mg/kg (10% bolus, 90% over 60 min)".into(),
            drug: "Alteplase".into(),
            mg_per_kg: ALTEPLASE.mg_per_kg,
            max_total_mg: ALTEPLASE.max_total,
            bolus_percent: ALTEPLASE.bolus_percent,
            infusion_minutes: ALTEPLASE.infusion_minutes,
        },
    ])
}

/// Normalize `weight` and dose it with the catalog protocol `protocol_id`
pub fn compute_dose(
    catalog: &ProtocolCatalog,
    protocol_id: &str,
    weight: &WeightMeasurement,
) -> Result<DoseReport> {
    let protocol = catalog
        .get(protocol_id)
        .ok_or_else(|| Error::UnknownProtocol(protocol_id.to_string()))?;

    let weight_kg = weight.to_kilograms();
    let dose = protocol.dose_for(weight_kg)?;

    tracing::info!(
        "Dosed {} for {} ({} kg): {} mg total",
        protocol.id(),
        weight,
        weight_kg,
        dose.total()
    );

    Ok(DoseReport {
        protocol_id: protocol.id().to_string(),
        protocol_name: protocol.name().to_string(),
        drug: protocol.drug().to_string(),
        weight_kg,
        dose,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{proportional_split_dose, tiered_bolus_dose, WeightUnit};

    fn example_tiers() -> ProtocolDefinition {
        ProtocolDefinition::Tiered {
            id: "weight_tiers".into(),
            name: "Example weight tiers".into(),
            drug: "Example".into(),
            tiers: vec![
                WeightTier {
                    below_kg: 50.0,
                    dose_mg: Milligrams::from_tenths(50),
                },
                WeightTier {
                    below_kg: 100.0,
                    dose_mg: Milligrams::from_tenths(75),
                },
            ],
            ceiling_mg: Milligrams::from_tenths(100),
        }
    }

    #[test]
    fn test_default_catalog_valid() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(errors.is_empty(), "Catalog errors: {:?}", errors);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("tenecteplase").is_some());
        assert!(catalog.get("alteplase").is_some());
    }

    #[test]
    fn test_catalog_matches_direct_functions() {
        let catalog = get_default_catalog();
        let tnk = catalog.get("tenecteplase").unwrap();
        let tpa = catalog.get("alteplase").unwrap();

        for tenths in (0..=1600).step_by(7) {
            let weight = tenths as f64 / 10.0;
            assert_eq!(
                tnk.dose_for(weight).unwrap(),
                DoseResult::Bolus {
                    dose_mg: tiered_bolus_dose(weight).unwrap()
                }
            );
            assert_eq!(
                tpa.dose_for(weight).unwrap(),
                DoseResult::Split(proportional_split_dose(weight).unwrap())
            );
        }
    }

    #[test]
    fn test_compute_dose_normalizes_pounds() {
        crate::logging::init_test();
        let weight = WeightMeasurement::new(154.0, WeightUnit::Pounds).unwrap();
        let report = compute_dose(get_default_catalog(), "tenecteplase", &weight).unwrap();

        assert_eq!(report.weight_kg, 69.8);
        assert_eq!(report.drug, "Tenecteplase");
        assert_eq!(report.dose.total(), Milligrams::from_tenths(175));
    }

    #[test]
    fn test_compute_dose_unknown_protocol() {
        let weight = WeightMeasurement::new(70.0, WeightUnit::Kilograms).unwrap();
        match compute_dose(get_default_catalog(), "streptokinase", &weight) {
            Err(Error::UnknownProtocol(id)) => assert_eq!(id, "streptokinase"),
            other => panic!("Expected UnknownProtocol, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_tiered_protocol() {
        let catalog = get_default_catalog().with_custom(&[example_tiers()]);
        assert!(catalog.validate().is_empty());

        let protocol = catalog.get("weight_tiers").unwrap();
        assert_eq!(
            protocol.dose_for(49.9).unwrap().total(),
            Milligrams::from_tenths(50)
        );
        assert_eq!(
            protocol.dose_for(50.0).unwrap().total(),
            Milligrams::from_tenths(75)
        );
        assert_eq!(
            protocol.dose_for(100.0).unwrap().total(),
            Milligrams::from_tenths(100)
        );
    }

    #[test]
    fn test_validation_catches_problems() {
        let unsorted = ProtocolDefinition::Tiered {
            id: "unsorted".into(),
            name: "Unsorted".into(),
            drug: "X".into(),
            tiers: vec![
                WeightTier {
                    below_kg: 80.0,
                    dose_mg: Milligrams::from_tenths(10),
                },
                WeightTier {
                    below_kg: 60.0,
                    dose_mg: Milligrams::from_tenths(20),
                },
            ],
            ceiling_mg: Milligrams::from_tenths(30),
        };
        let bad_split = ProtocolDefinition::Proportional {
            id: "alteplase".into(),
            name: "Shadowing alteplase".into(),
            drug: "X".into(),
            mg_per_kg: 0.0,
            max_total_mg: Milligrams::from_tenths(900),
            bolus_percent: 120,
            infusion_minutes: 60,
        };

        let catalog = get_default_catalog().with_custom(&[unsorted, bad_split]);
        let errors = catalog.validate();

        assert!(errors.iter().any(|e| e.contains("unsorted")));
        assert!(errors.iter().any(|e| e.contains("Duplicate protocol id 'alteplase'")));
        assert!(errors.iter().any(|e| e.contains("mg_per_kg")));
        assert!(errors.iter().any(|e| e.contains("bolus_percent")));
    }

    #[test]
    fn test_unsorted_tiered_protocol_fails_to_dose() {
        let protocol = ProtocolDefinition::Tiered {
            id: "broken".into(),
            name: "Broken".into(),
            drug: "X".into(),
            tiers: vec![
                WeightTier {
                    below_kg: 80.0,
                    dose_mg: Milligrams::from_tenths(10),
                },
                WeightTier {
                    below_kg: 80.0,
                    dose_mg: Milligrams::from_tenths(20),
                },
            ],
            ceiling_mg: Milligrams::from_tenths(30),
        };
        assert!(matches!(protocol.dose_for(70.0), Err(Error::RuleTable(_))));
    }

    #[test]
    fn test_oversized_bolus_fails_to_dose() {
        let protocol = ProtocolDefinition::Proportional {
            id: "oversized".into(),
            name: "Oversized bolus".into(),
            drug: "X".into(),
            mg_per_kg: 0.9,
            max_total_mg: Milligrams::from_tenths(900),
            bolus_percent: 150,
            infusion_minutes: 60,
        };
        match protocol.dose_for(70.0) {
            Err(Error::InvalidProtocol(msg)) => assert!(msg.contains("bolus_percent")),
            other => panic!("Expected InvalidProtocol, got {:?}", other),
        }
    }

    #[test]
    fn test_definition_json_tagged() {
        let json = serde_json::to_value(example_tiers()).unwrap();
        assert_eq!(json["type"], "tiered");
        assert_eq!(json["tiers"][1]["dose_mg"], 7.5);
    }
}
