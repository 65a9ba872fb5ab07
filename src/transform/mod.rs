//! Forward and reverse variable transformation.
//!
//! Maps a raw observed series into a stationary modeling series (log,
//! differencing, lag) and back again. The forward direction degrades
//! gracefully: a required month that is missing yields `Ok(None)` so bulk
//! transforms can proceed with gaps. The reverse direction must produce a
//! definite value and fails fast instead.

mod chain;

use crate::core::{Dataset, Month, MISSING};
use crate::error::{ForecastError, Result};
use crate::spec::VariableSpec;
use chain::{apply_pointwise, chain_for, Step};

/// Transform a single raw value according to `spec`.
///
/// The effective month is `month` shifted back by the spec's lag order; the
/// value steps (log, then diff) then run against the raw column at that
/// effective month. An absent raw column is a hard
/// [`ForecastError::UnknownColumn`]; any missing value along the chain
/// propagates as `Ok(None)`.
pub fn transform_value(spec: &VariableSpec, month: Month, data: &Dataset) -> Result<Option<f64>> {
    let steps = chain_for(spec);
    let effective = month.minus_months(spec.lag_order());

    let Some(raw) = data.value(spec.name(), effective)? else {
        return Ok(None);
    };

    let mut value = raw;
    for (i, step) in steps.iter().enumerate() {
        match *step {
            Step::Log => {
                if value <= 0.0 {
                    return Ok(None);
                }
                value = value.ln();
            }
            Step::Diff { order } => {
                let base_month = effective.minus_months(order);
                let Some(base_raw) = data.value(spec.name(), base_month)? else {
                    return Ok(None);
                };
                let Some(base) = apply_pointwise(&steps[..i], base_raw) else {
                    return Ok(None);
                };
                value -= base;
            }
        }
    }
    Ok(Some(value))
}

/// Recover a raw value from a transformed one.
///
/// Walks the spec's value steps in reverse: the diff step adds its base
/// value back (log-transformed first when applicable), then the log step is
/// undone with `exp`. The result is the raw value at the lag-shifted
/// effective month; lag reversal is implicit in that lookup target, not an
/// arithmetic step.
///
/// Validation order is fixed: a NaN input is rejected with
/// [`ForecastError::InvalidInput`] before the column-existence check raises
/// [`ForecastError::UnknownColumn`]. A missing differencing base is a hard
/// [`ForecastError::MissingBaseValue`] — reverse transformation returns a
/// single value and cannot degrade to a sentinel.
pub fn reverse_transform_value(
    spec: &VariableSpec,
    month: Month,
    transformed: f64,
    data: &Dataset,
) -> Result<f64> {
    if transformed.is_nan() {
        return Err(ForecastError::InvalidInput(
            "cannot reverse-transform a missing (NaN) value".to_string(),
        ));
    }
    if !data.has_column(spec.name()) {
        return Err(ForecastError::UnknownColumn(spec.name().to_string()));
    }

    let steps = chain_for(spec);
    let effective = month.minus_months(spec.lag_order());

    let mut value = transformed;
    for (i, step) in steps.iter().enumerate().rev() {
        match *step {
            Step::Diff { order } => {
                let base_month = effective.minus_months(order);
                let base_raw = data.value(spec.name(), base_month)?.ok_or_else(|| {
                    ForecastError::MissingBaseValue {
                        column: spec.name().to_string(),
                        month: base_month,
                    }
                })?;
                let base = apply_pointwise(&steps[..i], base_raw).ok_or_else(|| {
                    ForecastError::InvalidInput(format!(
                        "non-positive base value {base_raw} in log chain for '{}'",
                        spec.name()
                    ))
                })?;
                value += base;
            }
            Step::Log => value = value.exp(),
        }
    }
    Ok(value)
}

/// Apply a spec's transform chain over an entire column.
///
/// Works by position — the materialized range is contiguous monthly, so the
/// diff is value minus value `diff_order` rows earlier and the lag is a
/// shift by `lag_order` rows. Edge positions lacking the look-back become
/// NaN gaps.
///
/// Idempotent by derived-name equality: when the derived column already
/// exists the dataset is returned unchanged with the same name, never a
/// duplicate.
pub fn transform_column(data: &mut Dataset, spec: &VariableSpec) -> Result<String> {
    let derived = spec.derived_name();
    if data.has_column(&derived) {
        return Ok(derived);
    }

    let mut values = data.column(spec.name())?.to_vec();

    if spec.log_transform() {
        for v in values.iter_mut() {
            *v = if *v > 0.0 { v.ln() } else { MISSING };
        }
    }

    let diff = spec.diff_order() as usize;
    if diff > 0 {
        let mut out = vec![MISSING; values.len()];
        for i in diff..values.len() {
            out[i] = values[i] - values[i - diff];
        }
        values = out;
    }

    let lag = spec.lag_order() as usize;
    if lag > 0 {
        let mut out = vec![MISSING; values.len()];
        for i in lag..values.len() {
            out[i] = values[i - lag];
        }
        values = out;
    }

    data.insert_column(derived.clone(), values)?;
    Ok(derived)
}
