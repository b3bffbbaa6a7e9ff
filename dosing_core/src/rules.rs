//! Ordered threshold tables.
//!
//! A `RuleTable` maps a scalar (weight, age, creatinine clearance...) to an
//! outcome using half-open bands `[previous bound, bound)`, with a default
//! for everything at or above the last bound.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One band of a rule table: inputs below `upper_exclusive` map to `value`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule<T> {
    pub upper_exclusive: f64,
    pub value: T,
}

impl<T> Rule<T> {
    pub fn new(upper_exclusive: f64, value: T) -> Self {
        Self {
            upper_exclusive,
            value,
        }
    }
}

/// Ordered list of threshold rules plus a catch-all default
#[derive(Clone, Debug, PartialEq)]
pub struct RuleTable<T> {
    rules: Vec<Rule<T>>,
    default: T,
}

impl<T> RuleTable<T> {
    /// Build a table, requiring finite and strictly ascending bounds
    pub fn new(rules: Vec<Rule<T>>, default: T) -> Result<Self> {
        for (i, rule) in rules.iter().enumerate() {
            if !rule.upper_exclusive.is_finite() {
                return Err(Error::RuleTable(format!(
                    "bound #{} is not finite ({})",
                    i + 1,
                    rule.upper_exclusive
                )));
            }
        }

        if let Some(pair) = rules
            .windows(2)
            .find(|pair| pair[0].upper_exclusive >= pair[1].upper_exclusive)
        {
            return Err(Error::RuleTable(format!(
                "bounds must be strictly ascending ({} then {})",
                pair[0].upper_exclusive, pair[1].upper_exclusive
            )));
        }

        Ok(Self { rules, default })
    }

    /// Build a table whose bounds are known to be ascending (built-in tables)
    pub(crate) fn from_sorted(rules: Vec<Rule<T>>, default: T) -> Self {
        Self { rules, default }
    }

    /// Outcome for `input`: the first rule whose bound exceeds it, else the default
    pub fn evaluate(&self, input: f64) -> &T {
        let idx = self
            .rules
            .partition_point(|rule| input >= rule.upper_exclusive);
        self.rules
            .get(idx)
            .map(|rule| &rule.value)
            .unwrap_or(&self.default)
    }

    /// Like [`evaluate`](Self::evaluate), rejecting invalid weights first
    pub fn evaluate_weight(&self, weight: f64) -> Result<&T> {
        crate::weight::ensure_valid_weight(weight)?;
        Ok(self.evaluate(weight))
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Every outcome in ascending band order, ending with the default
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rules
            .iter()
            .map(|rule| &rule.value)
            .chain(std::iter::once(&self.default))
    }
}
