//! Core domain types for the dosing library.
//!
//! This module defines the value types passed between the dosing functions:
//! - Weight units and measurements
//! - Dose amounts held in exact tenths of a milligram
//! - Dose results for bolus-only and split (bolus + infusion) protocols

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

// ============================================================================
// Weight Types
// ============================================================================

/// Unit a patient weight was entered in
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "kg", alias = "kgs")]
    Kilograms,
    #[serde(rename = "lbs", alias = "lb")]
    Pounds,
}

impl WeightUnit {
    /// Short label used in output ("kg" / "lbs")
    pub fn label(self) -> &'static str {
        match self {
            WeightUnit::Kilograms => "kg",
            WeightUnit::Pounds => "lbs",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(WeightUnit::Kilograms),
            "lb" | "lbs" | "pound" | "pounds" => Ok(WeightUnit::Pounds),
            _ => Err(Error::UnknownUnit(s.to_string())),
        }
    }
}

/// A validated weight in the unit it was entered in.
///
/// A magnitude of exactly zero is the "not yet entered" sentinel and
/// normalizes to 0 kg whatever the unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightMeasurement {
    magnitude: f64,
    unit: WeightUnit,
}

impl WeightMeasurement {
    /// Create a measurement, rejecting negative or non-finite magnitudes
    pub fn new(magnitude: f64, unit: WeightUnit) -> Result<Self> {
        crate::weight::ensure_valid_weight(magnitude)?;
        Ok(Self { magnitude, unit })
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> WeightUnit {
        self.unit
    }

    /// Canonical weight in kilograms, rounded to the nearest 0.1 kg
    pub fn to_kilograms(&self) -> f64 {
        crate::weight::to_rounded_kilograms(self.magnitude, self.unit)
    }
}

impl fmt::Display for WeightMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

// ============================================================================
// Dose Amounts
// ============================================================================

/// A drug amount stored as whole tenths of a milligram.
///
/// Doses are only ever reported at one-decimal precision, so holding them as
/// integers keeps sums such as `bolus + infusion` exact.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "f64", try_from = "f64")]
pub struct Milligrams(u32);

impl Milligrams {
    pub const ZERO: Milligrams = Milligrams(0);

    /// Build from a count of tenths of a milligram (`175` is 17.5 mg)
    pub const fn from_tenths(tenths: u32) -> Self {
        Milligrams(tenths)
    }

    /// Round a milligram amount to the nearest 0.1 mg
    pub fn from_mg(mg: f64) -> Result<Self> {
        if !mg.is_finite() || mg < 0.0 {
            return Err(Error::InvalidDose(mg));
        }
        let tenths = (mg * 10.0).round();
        if tenths > u32::MAX as f64 {
            return Err(Error::InvalidDose(mg));
        }
        Ok(Milligrams(tenths as u32))
    }

    pub const fn tenths(self) -> u32 {
        self.0
    }

    pub fn as_mg(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// `percent`% of this amount, rounded half up to the nearest 0.1 mg
    pub fn percent(self, percent: u32) -> Self {
        let scaled = (u64::from(self.0) * u64::from(percent) + 50) / 100;
        Milligrams(u32::try_from(scaled).unwrap_or(u32::MAX))
    }

    pub fn saturating_sub(self, other: Milligrams) -> Self {
        Milligrams(self.0.saturating_sub(other.0))
    }
}

impl Add for Milligrams {
    type Output = Milligrams;

    fn add(self, rhs: Milligrams) -> Milligrams {
        Milligrams(self.0.saturating_add(rhs.0))
    }
}

impl From<Milligrams> for f64 {
    fn from(mg: Milligrams) -> f64 {
        mg.as_mg()
    }
}

impl TryFrom<f64> for Milligrams {
    type Error = Error;

    fn try_from(mg: f64) -> Result<Self> {
        Milligrams::from_mg(mg)
    }
}

impl fmt::Display for Milligrams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (whole, tenth) = (self.0 / 10, self.0 % 10);
        if tenth == 0 {
            write!(f, "{}", whole)
        } else {
            write!(f, "{}.{}", whole, tenth)
        }
    }
}

// ============================================================================
// Dose Results
// ============================================================================

/// A dose given partly as an immediate bolus and the rest as an infusion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDose {
    pub total_mg: Milligrams,
    pub bolus_mg: Milligrams,
    pub infusion_mg: Milligrams,
    pub infusion_minutes: u32,
}

impl SplitDose {
    /// Whether bolus and infusion add back up to the total
    pub fn is_consistent(&self) -> bool {
        self.bolus_mg + self.infusion_mg == self.total_mg
    }
}

/// Result of evaluating a dosing protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DoseResult {
    /// Single fixed dose (weight-banded protocols)
    Bolus { dose_mg: Milligrams },
    /// Bolus followed by an infusion (proportional protocols)
    Split(SplitDose),
}

impl DoseResult {
    /// Total amount of drug administered
    pub fn total(&self) -> Milligrams {
        match self {
            DoseResult::Bolus { dose_mg } => *dose_mg,
            DoseResult::Split(split) => split.total_mg,
        }
    }
}

/// A computed dose together with what it was computed from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoseReport {
    pub protocol_id: String,
    pub protocol_name: String,
    pub drug: String,
    pub weight_kg: f64,
    pub dose: DoseResult,
}
