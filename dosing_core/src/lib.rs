#![forbid(unsafe_code)]

//! Core dosing logic for the NeuroWiki clinical calculators.
//!
//! This crate provides:
//! - Domain types (weight units, dose amounts, dose results)
//! - Weight normalization
//! - Ordered threshold tables for banded protocols
//! - Thrombolytic dosing (tiered bolus, proportional split)
//! - Protocol catalog and configuration

pub mod types;
pub mod error;
pub mod weight;
pub mod rules;
pub mod dosing;
pub mod protocol;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use weight::normalize_weight;
pub use rules::{Rule, RuleTable};
pub use dosing::{proportional_split_dose, tiered_bolus_dose, SplitProtocol};
pub use protocol::{
    build_default_catalog, compute_dose, get_default_catalog, ProtocolCatalog,
    ProtocolDefinition, WeightTier,
};
pub use config::Config;
