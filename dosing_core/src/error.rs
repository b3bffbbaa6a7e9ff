//! Error types for the dosing_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dosing_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Weight is negative, NaN or infinite
    #[error("Invalid weight: {0} (must be a finite, non-negative number)")]
    InvalidWeight(f64),

    /// Dose amount outside the representable range
    #[error("Invalid dose: {0} mg")]
    InvalidDose(f64),

    /// Unrecognised weight unit
    #[error("Unknown weight unit: {0:?} (expected kg or lbs)")]
    UnknownUnit(String),

    /// Protocol id not present in the catalog
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    /// Protocol parameters that cannot produce a valid dose
    #[error("Invalid protocol: {0}")]
    InvalidProtocol(String),

    /// Rule table construction error
    #[error("Rule table error: {0}")]
    RuleTable(String),

    /// Protocol catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
