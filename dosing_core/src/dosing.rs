//! Weight-based thrombolytic dosing.
//!
//! Two schemes are implemented:
//! - Tiered bolus: a fixed dose picked by weight band (tenecteplase)
//! - Proportional split: mg/kg up to a cap, split into bolus and infusion (alteplase)
//!
//! Both take kilograms that have already been normalized with
//! [`normalize_weight`](crate::normalize_weight).

use crate::rules::{Rule, RuleTable};
use crate::{Error, Milligrams, Result, SplitDose};
use once_cell::sync::Lazy;

/// Tenecteplase bands: 15 mg below 60 kg, +2.5 mg per 10 kg, 25 mg from 90 kg
static TIERED_BOLUS_TABLE: Lazy<RuleTable<Milligrams>> = Lazy::new(|| {
    RuleTable::from_sorted(
        vec![
            Rule::new(60.0, Milligrams::from_tenths(150)),
            Rule::new(70.0, Milligrams::from_tenths(175)),
            Rule::new(80.0, Milligrams::from_tenths(200)),
            Rule::new(90.0, Milligrams::from_tenths(225)),
        ],
        Milligrams::from_tenths(250),
    )
});

/// The cached weight-band table used by [`tiered_bolus_dose`]
pub fn tiered_bolus_table() -> &'static RuleTable<Milligrams> {
    &TIERED_BOLUS_TABLE
}

/// Fixed bolus dose for the weight band `weight_kg` falls into
pub fn tiered_bolus_dose(weight_kg: f64) -> Result<Milligrams> {
    let dose = *TIERED_BOLUS_TABLE.evaluate_weight(weight_kg)?;
    tracing::debug!("Tiered bolus for {} kg: {} mg", weight_kg, dose);
    Ok(dose)
}

/// Parameters of a proportional bolus + infusion protocol
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitProtocol {
    pub mg_per_kg: f64,
    pub max_total: Milligrams,
    pub bolus_percent: u32,
    pub infusion_minutes: u32,
}

/// Alteplase: 0.9 mg/kg (max 90 mg), 10% pushed, the rest over 60 minutes
pub const ALTEPLASE: SplitProtocol = SplitProtocol {
    mg_per_kg: 0.9,
    max_total: Milligrams::from_tenths(900),
    bolus_percent: 10,
    infusion_minutes: 60,
};

impl SplitProtocol {
    /// Reject coefficients that are not positive and bolus shares above 100%
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if !self.mg_per_kg.is_finite() || self.mg_per_kg <= 0.0 {
            problems.push(format!("mg_per_kg must be positive (got {})", self.mg_per_kg));
        }
        if self.bolus_percent > 100 {
            problems.push(format!(
                "bolus_percent must be at most 100 (got {})",
                self.bolus_percent
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidProtocol(problems.join(", ")))
        }
    }

    /// Compute the split dose for `weight_kg`.
    ///
    /// The total is capped and rounded first. The bolus is taken from the
    /// rounded total and the infusion is the remainder, so
    /// `bolus + infusion == total` always holds.
    pub fn dose(&self, weight_kg: f64) -> Result<SplitDose> {
        self.validate()?;
        crate::weight::ensure_valid_weight(weight_kg)?;

        let raw_total = weight_kg * self.mg_per_kg;
        let total_mg = Milligrams::from_mg(raw_total.min(self.max_total.as_mg()))?;
        let bolus_mg = total_mg.percent(self.bolus_percent);
        let infusion_mg = total_mg.saturating_sub(bolus_mg);

        Ok(SplitDose {
            total_mg,
            bolus_mg,
            infusion_mg,
            infusion_minutes: self.infusion_minutes,
        })
    }
}

/// Alteplase-style split dose for `weight_kg`
pub fn proportional_split_dose(weight_kg: f64) -> Result<SplitDose> {
    let dose = ALTEPLASE.dose(weight_kg)?;
    tracing::debug!(
        "Proportional split for {} kg: total {} mg (bolus {} mg, infusion {} mg)",
        weight_kg,
        dose.total_mg,
        dose.bolus_mg,
        dose.infusion_mg
    );
    Ok(dose)
}
