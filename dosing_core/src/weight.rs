//! Weight normalization.
//!
//! Every dosing formula takes kilograms rounded to the nearest 0.1 kg.

use crate::{Error, Result, WeightUnit};

/// Pounds per kilogram used for clinical dosing (kg = lbs / 2.205)
pub const LBS_PER_KG: f64 = 2.205;

/// Reject weights that are negative, NaN or infinite
pub fn ensure_valid_weight(weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidWeight(weight))
    }
}

/// Above 2^52 every f64 is a whole number, so tenths rounding is a no-op
const WHOLE_NUMBERS_FROM: f64 = 4_503_599_627_370_496.0;

/// Round to the nearest tenth (half away from zero)
pub fn round_to_tenth(value: f64) -> f64 {
    if value.abs() >= WHOLE_NUMBERS_FROM {
        return value;
    }
    (value * 10.0).round() / 10.0
}

/// Convert a weight to kilograms, rounded to the nearest 0.1 kg.
///
/// A magnitude of exactly zero means "not entered" and returns 0 for either
/// unit.
pub fn normalize_weight(magnitude: f64, unit: WeightUnit) -> Result<f64> {
    ensure_valid_weight(magnitude)?;
    let kg = to_rounded_kilograms(magnitude, unit);
    if !kg.is_finite() {
        return Err(Error::InvalidWeight(magnitude));
    }
    tracing::debug!("Normalized {} {} to {} kg", magnitude, unit, kg);
    Ok(kg)
}

pub(crate) fn to_rounded_kilograms(magnitude: f64, unit: WeightUnit) -> f64 {
    if magnitude == 0.0 {
        return 0.0;
    }
    match unit {
        WeightUnit::Kilograms => round_to_tenth(magnitude),
        WeightUnit::Pounds => round_to_tenth(magnitude / LBS_PER_KG),
    }
}
