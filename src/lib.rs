//! # monthcast
//!
//! Variable transformation and recursive forecasting for monthly economic
//! series.
//!
//! A [`VariableSpec`](spec::VariableSpec) describes how a raw series becomes
//! a stationary modeling series (log, differencing, lag); the
//! [`transform`] module applies and inverts that chain; the
//! [`Predictor`](predictor::Predictor) fits an OLS model over an estimation
//! window and forecasts forward month by month, feeding each level-scale
//! prediction back into the regressor columns that alias the target.
//!
//! ```
//! use monthcast::prelude::*;
//!
//! // Monthly observations of a linearly growing series, with one extra
//! // materialized month so the lag-1 regressor seeds the first forecast.
//! let mut values: Vec<f64> = (1..=24).map(f64::from).collect();
//! values.push(f64::NAN);
//! let data = Dataset::from_columns(Month::new(2020, 1)?, vec![("y", values)])?;
//!
//! let mut predictor = Predictor::new(data);
//! predictor.fit(
//!     &VariableSpec::level("y"),
//!     &[VariableSpec::new("y", 0, false, 1)],
//!     Month::new(2021, 12)?,
//!     None,
//!     true,
//! )?;
//!
//! let forecast = predictor.forecast(3)?;
//! assert_eq!(forecast.len(), 3);
//! # Ok::<(), ForecastError>(())
//! ```

pub mod core;
pub mod diagnostics;
pub mod error;
pub mod estimator;
pub mod predictor;
pub mod spec;
pub mod transform;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Dataset, Month, MISSING};
    pub use crate::diagnostics::{DiagnosticsSink, RecordingSink};
    pub use crate::error::{ForecastError, Result};
    pub use crate::estimator::{Estimator, EstimatorFit, OlsEstimator};
    pub use crate::predictor::{FittedModel, Predictor, CONST_COLUMN};
    pub use crate::spec::VariableSpec;
    pub use crate::transform::{reverse_transform_value, transform_column, transform_value};
}
