//! Variable transformation specifications.

use serde::{Deserialize, Serialize};

/// Immutable description of one variable's transform chain.
///
/// A spec names a raw column and the stationarity transforms applied to it:
/// an optional natural log, a differencing order and a lag order. Numerically
/// the chain runs log, then diff, then lag (see [`crate::transform`]); the
/// derived column name composes in the fixed order log-wrap, diff suffix,
/// lag suffix regardless of which flags are set.
///
/// Specs are deep-copied into the predictor at fit time, so mutating a
/// caller-side copy never changes a fitted model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    name: String,
    diff_order: u32,
    log_transform: bool,
    lag_order: u32,
}

impl VariableSpec {
    pub fn new(
        name: impl Into<String>,
        diff_order: u32,
        log_transform: bool,
        lag_order: u32,
    ) -> Self {
        Self {
            name: name.into(),
            diff_order,
            log_transform,
            lag_order,
        }
    }

    /// Identity spec: the raw level of a variable, untransformed.
    pub fn level(name: impl Into<String>) -> Self {
        Self::new(name, 0, false, 0)
    }

    /// Name of the underlying raw column.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn diff_order(&self) -> u32 {
        self.diff_order
    }

    pub fn log_transform(&self) -> bool {
        self.log_transform
    }

    pub fn lag_order(&self) -> u32 {
        self.lag_order
    }

    /// Deterministic name of the derived column, e.g. `log(gdp)(d1)(-2)`.
    ///
    /// A pure function of the four spec fields: equal fields always produce
    /// equal names, which is what makes derived-column creation idempotent.
    pub fn derived_name(&self) -> String {
        let mut name = self.name.clone();
        if self.log_transform {
            name = format!("log({name})");
        }
        if self.diff_order > 0 {
            name = format!("{name}(d{})", self.diff_order);
        }
        if self.lag_order > 0 {
            name = format!("{name}(-{})", self.lag_order);
        }
        name
    }
}
