//! Typed transform steps composed from a [`VariableSpec`].
//!
//! The chain makes the application order structural: log always precedes
//! diff in the forward direction, and the reverse direction walks the same
//! steps backwards. Lag is not a value step at all; it shifts the effective
//! month before any value step runs.

use crate::spec::VariableSpec;

/// One invertible stage of a transform chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Natural log, applied pointwise.
    Log,
    /// Subtract the chain value observed `order` months earlier.
    Diff { order: u32 },
}

/// The ordered value steps for a spec: log first, then diff.
pub(crate) fn chain_for(spec: &VariableSpec) -> Vec<Step> {
    let mut steps = Vec::with_capacity(2);
    if spec.log_transform() {
        steps.push(Step::Log);
    }
    if spec.diff_order() > 0 {
        steps.push(Step::Diff {
            order: spec.diff_order(),
        });
    }
    steps
}

/// Apply the pointwise steps of a chain prefix to a raw value.
///
/// Differencing needs its base value carried through every pointwise step
/// that precedes it, so the diff step applies this to its look-back value.
/// Returns `None` when the value leaves the step's domain (log of a
/// non-positive value).
pub(crate) fn apply_pointwise(steps: &[Step], raw: f64) -> Option<f64> {
    let mut value = raw;
    for step in steps {
        if let Step::Log = step {
            if value <= 0.0 {
                return None;
            }
            value = value.ln();
        }
    }
    Some(value)
}
