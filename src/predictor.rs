//! Recursive monthly forecasting on top of the transformation engine.
//!
//! The predictor owns the dataset exclusively, fits an estimator over a
//! bounded estimation window, then forecasts forward month by month,
//! feeding each level-scale prediction back into the regressor columns that
//! are transformed views of the target itself.

use crate::core::{Dataset, Month, MISSING};
use crate::diagnostics::DiagnosticsSink;
use crate::error::{ForecastError, Result};
use crate::estimator::{Estimator, OlsEstimator};
use crate::spec::VariableSpec;
use crate::transform::{reverse_transform_value, transform_column, transform_value};

/// Column name used for the regression constant.
pub const CONST_COLUMN: &str = "const";

/// Immutable result of a fit.
#[derive(Debug, Clone)]
pub struct FittedModel {
    coefficients: Vec<f64>,
    residuals: Vec<f64>,
    regressor_columns: Vec<String>,
    target_column: String,
    target_spec: VariableSpec,
    regressor_specs: Vec<VariableSpec>,
    include_constant: bool,
    estimation_window: Vec<Month>,
    first_month: Month,
    last_month: Month,
}

impl FittedModel {
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Residuals aligned element-wise to [`Self::estimation_window`].
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Derived regressor column names in the exact order the coefficients
    /// were fitted; prediction selects columns in this same order.
    pub fn regressor_columns(&self) -> &[String] {
        &self.regressor_columns
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn target_spec(&self) -> &VariableSpec {
        &self.target_spec
    }

    pub fn regressor_specs(&self) -> &[VariableSpec] {
        &self.regressor_specs
    }

    /// Months actually used in estimation (rows with every value present).
    pub fn estimation_window(&self) -> &[Month] {
        &self.estimation_window
    }

    pub fn first_month(&self) -> Month {
        self.first_month
    }

    pub fn last_month(&self) -> Month {
        self.last_month
    }
}

/// Linear predictor with recursive forecasting.
///
/// State machine: unfitted until [`Predictor::fit`] succeeds, then fitted;
/// [`Predictor::predict`] only reads the fitted state, so a model stays
/// reusable across forecast calls.
///
/// For a self-referential lagged regressor the first forecast row is seeded
/// by the positional shift done at fit time, so the dataset should be
/// materialized (see [`Dataset::extend_to`]) through the first forecast
/// month before fitting; every later row is filled by the feedback step.
pub struct Predictor {
    data: Dataset,
    estimator: Box<dyn Estimator>,
    diagnostics: Option<Box<dyn DiagnosticsSink>>,
    fitted: Option<FittedModel>,
}

impl Predictor {
    /// Default forecast horizon in months.
    pub const DEFAULT_STEPS_AHEAD: usize = 12;

    /// Create an unfitted predictor owning `data`, estimating with OLS.
    pub fn new(data: Dataset) -> Self {
        Self {
            data,
            estimator: Box::new(OlsEstimator::new()),
            diagnostics: None,
            fitted: None,
        }
    }

    /// Replace the estimator.
    pub fn with_estimator(mut self, estimator: Box<dyn Estimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Attach a residual diagnostics sink.
    pub fn with_diagnostics(mut self, sink: Box<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// Consume the predictor, returning the dataset with every derived and
    /// forecasted column.
    pub fn into_data(self) -> Dataset {
        self.data
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn fitted(&self) -> Option<&FittedModel> {
        self.fitted.as_ref()
    }

    pub fn coefficients(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(FittedModel::coefficients)
    }

    pub fn residuals(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(FittedModel::residuals)
    }

    /// Fit the linear model.
    ///
    /// Both specs are cloned, so mutating the caller's copies afterwards
    /// cannot change the fitted model. The target column and every
    /// regressor column are derived via [`transform_column`]; with
    /// `include_constant` a 1.0-valued [`CONST_COLUMN`] is prepended to the
    /// regressor list.
    ///
    /// When `first_month` is `None` it resolves to the earliest month where
    /// the target and all regressor columns are simultaneously present (a
    /// full-row scan). The estimation window runs monthly from there to
    /// `last_month` inclusive, restricted to rows with every value present;
    /// too few usable rows is [`ForecastError::InsufficientData`] and a
    /// rank-deficient regressor set surfaces from the estimator.
    pub fn fit(
        &mut self,
        target: &VariableSpec,
        regressors: &[VariableSpec],
        last_month: Month,
        first_month: Option<Month>,
        include_constant: bool,
    ) -> Result<()> {
        let target_spec = target.clone();
        let regressor_specs: Vec<VariableSpec> = regressors.to_vec();

        let target_column = transform_column(&mut self.data, &target_spec)?;

        let mut regressor_columns = Vec::with_capacity(regressor_specs.len() + 1);
        if include_constant {
            self.data.push_constant(CONST_COLUMN)?;
            regressor_columns.push(CONST_COLUMN.to_string());
        }
        for spec in &regressor_specs {
            regressor_columns.push(transform_column(&mut self.data, spec)?);
        }

        let first_month = match first_month {
            Some(month) => month,
            None => self.first_complete_month(&target_column, &regressor_columns)?,
        };
        if first_month > last_month {
            return Err(ForecastError::InvalidWindow(format!(
                "estimation start {first_month} is after its end {last_month}"
            )));
        }

        // Restrict the window to rows where every value is present.
        let mut window = Vec::new();
        let mut targets = Vec::new();
        let mut matrix: Vec<Vec<f64>> = vec![Vec::new(); regressor_columns.len()];
        for month in Month::range_inclusive(first_month, last_month) {
            let Some(y) = self.data.value(&target_column, month)? else {
                continue;
            };
            let mut row = Vec::with_capacity(regressor_columns.len());
            for column in &regressor_columns {
                match self.data.value(column, month)? {
                    Some(v) => row.push(v),
                    None => break,
                }
            }
            if row.len() != regressor_columns.len() {
                continue;
            }
            window.push(month);
            targets.push(y);
            for (c, v) in row.into_iter().enumerate() {
                matrix[c].push(v);
            }
        }
        if targets.len() < regressor_columns.len() {
            return Err(ForecastError::InsufficientData {
                needed: regressor_columns.len(),
                got: targets.len(),
            });
        }

        let fit = self.estimator.fit(&targets, &matrix)?;

        if let Some(sink) = self.diagnostics.as_mut() {
            if let Err(err) = sink.record_residuals(target_spec.name(), &window, &fit.residuals) {
                tracing::warn!(
                    target_variable = target_spec.name(),
                    error = %err,
                    "residual diagnostics failed"
                );
            }
        }

        self.fitted = Some(FittedModel {
            coefficients: fit.coefficients,
            residuals: fit.residuals,
            regressor_columns,
            target_column,
            target_spec,
            regressor_specs,
            include_constant,
            estimation_window: window,
            first_month,
            last_month,
        });
        Ok(())
    }

    /// Fit with a single regressor specification.
    pub fn fit_one(
        &mut self,
        target: &VariableSpec,
        regressor: &VariableSpec,
        last_month: Month,
        first_month: Option<Month>,
        include_constant: bool,
    ) -> Result<()> {
        self.fit(
            target,
            std::slice::from_ref(regressor),
            last_month,
            first_month,
            include_constant,
        )
    }

    /// Forecast recursively over a monthly window, returning level-scale
    /// predictions in chronological order.
    ///
    /// `start` defaults to the month after the fitted `last_month` and must
    /// lie after it; with `end` set the window is `start..=end`, otherwise
    /// it is `steps_ahead` consecutive months. Each iteration predicts the
    /// transformed target, records it, reverse-transforms it into the raw
    /// target column, then re-derives every regressor that aliases the
    /// target so months further out can consume this forecast. The loop is
    /// strictly sequential: month M's feedback is a precondition for the
    /// regressor rows of months M+1 onwards.
    pub fn predict(
        &mut self,
        start: Option<Month>,
        end: Option<Month>,
        steps_ahead: usize,
    ) -> Result<Vec<(Month, f64)>> {
        let model = self.fitted.clone().ok_or(ForecastError::FitRequired)?;

        let start = start.unwrap_or_else(|| model.last_month.next());
        if start <= model.last_month {
            return Err(ForecastError::InvalidWindow(format!(
                "forecast start {start} must be after the last estimation month {}",
                model.last_month
            )));
        }
        let window = match end {
            Some(end) if end < start => {
                return Err(ForecastError::InvalidWindow(format!(
                    "forecast end {end} precedes its start {start}"
                )));
            }
            Some(end) => Month::range_inclusive(start, end),
            None if steps_ahead == 0 => {
                return Err(ForecastError::InvalidWindow(
                    "forecast window is empty".to_string(),
                ));
            }
            None => Month::sequence(start, steps_ahead),
        };

        let mut levels = Vec::with_capacity(window.len());
        for month in window {
            // The constant does not come from a raw series, so newly
            // materialized rows need it written explicitly.
            if model.include_constant {
                self.data.set_value(CONST_COLUMN, month, 1.0)?;
            }

            let mut row = Vec::with_capacity(model.regressor_columns.len());
            for column in &model.regressor_columns {
                let value = self.data.value(column, month)?.ok_or_else(|| {
                    ForecastError::MissingRegressor {
                        column: column.clone(),
                        month,
                    }
                })?;
                row.push(value);
            }

            let predicted = self.estimator.predict(&model.coefficients, &row);
            self.data.set_value(&model.target_column, month, predicted)?;

            let level = reverse_transform_value(&model.target_spec, month, predicted, &self.data)?;
            self.data.set_value(model.target_spec.name(), month, level)?;

            // Feedback: regressors that are transformed views of the target
            // can now be extended with the value implied by this forecast. A
            // lag-N regressor's value observed at month M is consumed when
            // predicting month M+N, so it lands N months ahead.
            for spec in &model.regressor_specs {
                if spec.name() != model.target_spec.name() {
                    continue;
                }
                let slot = month.plus_months(spec.lag_order());
                self.data.extend_to(slot)?;
                let value = transform_value(spec, slot, &self.data)?;
                self.data
                    .set_value(&spec.derived_name(), slot, value.unwrap_or(MISSING))?;
            }

            levels.push((month, level));
        }
        Ok(levels)
    }

    /// Forecast `steps_ahead` months past the estimation window.
    pub fn forecast(&mut self, steps_ahead: usize) -> Result<Vec<(Month, f64)>> {
        self.predict(None, None, steps_ahead)
    }

    /// Earliest month where the target and every regressor column are
    /// simultaneously present.
    fn first_complete_month(
        &self,
        target_column: &str,
        regressor_columns: &[String],
    ) -> Result<Month> {
        'months: for month in self.data.months() {
            if self.data.value(target_column, month)?.is_none() {
                continue;
            }
            for column in regressor_columns {
                if self.data.value(column, month)?.is_none() {
                    continue 'months;
                }
            }
            return Ok(month);
        }
        Err(ForecastError::InsufficientData { needed: 1, got: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{RecordingSink, ResidualReport};
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn month(year: i32, m: u32) -> Month {
        Month::new(year, m).unwrap()
    }

    /// Linear series 1..=n from 2020-01, materialized one month past the
    /// last observation so a lag-1 regressor seeds the first forecast row.
    fn linear_dataset(n: usize) -> Dataset {
        let mut values: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        values.push(MISSING);
        Dataset::from_columns(month(2020, 1), vec![("y", values)]).unwrap()
    }

    /// Sink that shares its reports with the test and can be made to fail.
    struct SharedSink {
        reports: Rc<RefCell<Vec<ResidualReport>>>,
        fail: bool,
    }

    impl DiagnosticsSink for SharedSink {
        fn record_residuals(
            &mut self,
            series_name: &str,
            months: &[Month],
            residuals: &[f64],
        ) -> Result<()> {
            if self.fail {
                return Err(ForecastError::Diagnostics("sink unavailable".to_string()));
            }
            self.reports.borrow_mut().push(ResidualReport {
                series_name: series_name.to_string(),
                months: months.to_vec(),
                residuals: residuals.to_vec(),
            });
            Ok(())
        }
    }

    fn fit_lag1(predictor: &mut Predictor, last: Month) {
        let target = VariableSpec::level("y");
        let regressor = VariableSpec::new("y", 0, false, 1);
        predictor
            .fit(&target, &[regressor], last, None, true)
            .unwrap();
    }

    #[test]
    fn fit_stores_an_immutable_model() {
        let mut predictor = Predictor::new(linear_dataset(24));
        fit_lag1(&mut predictor, month(2021, 12));

        assert!(predictor.is_fitted());
        let model = predictor.fitted().unwrap();

        // y[t] = 1 + y[t-1] exactly on a linear series.
        assert_relative_eq!(model.coefficients()[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(model.coefficients()[1], 1.0, epsilon = 1e-6);
        assert_eq!(model.regressor_columns(), &["const", "y(-1)"]);

        // Lag-1 removes the first month from the usable window.
        assert_eq!(model.first_month(), month(2020, 2));
        assert_eq!(model.last_month(), month(2021, 12));
        assert_eq!(model.estimation_window().len(), 23);
        assert_eq!(model.residuals().len(), 23);
    }

    #[test]
    fn fit_clones_caller_specs() {
        let mut predictor = Predictor::new(linear_dataset(24));
        let target = VariableSpec::level("y");
        let mut regressor = VariableSpec::new("y", 0, false, 1);
        predictor
            .fit(&target, std::slice::from_ref(&regressor), month(2021, 12), None, true)
            .unwrap();

        // Rebinding the caller's spec must not touch the fitted model.
        regressor = VariableSpec::new("y", 1, true, 2);
        let _ = regressor;
        assert_eq!(
            predictor.fitted().unwrap().regressor_specs()[0],
            VariableSpec::new("y", 0, false, 1)
        );
    }

    #[test]
    fn fit_honours_explicit_first_month() {
        let mut predictor = Predictor::new(linear_dataset(24));
        let target = VariableSpec::level("y");
        let regressor = VariableSpec::new("y", 0, false, 1);
        predictor
            .fit(
                &target,
                &[regressor],
                month(2021, 12),
                Some(month(2021, 1)),
                true,
            )
            .unwrap();

        let model = predictor.fitted().unwrap();
        assert_eq!(model.first_month(), month(2021, 1));
        assert_eq!(model.estimation_window().len(), 12);
    }

    #[test]
    fn fit_rejects_reversed_estimation_window() {
        let mut predictor = Predictor::new(linear_dataset(24));
        let target = VariableSpec::level("y");
        let regressor = VariableSpec::new("y", 0, false, 1);
        let result = predictor.fit(
            &target,
            &[regressor],
            month(2020, 3),
            Some(month(2021, 1)),
            true,
        );
        assert!(matches!(result, Err(ForecastError::InvalidWindow(_))));
    }

    #[test]
    fn fit_fails_without_any_complete_row() {
        let data =
            Dataset::from_columns(month(2020, 1), vec![("y", vec![MISSING, MISSING])]).unwrap();
        let mut predictor = Predictor::new(data);
        let target = VariableSpec::level("y");
        let regressor = VariableSpec::new("y", 0, false, 1);
        let result = predictor.fit(&target, &[regressor], month(2020, 2), None, false);
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn predict_requires_a_fitted_model() {
        let mut predictor = Predictor::new(linear_dataset(24));
        assert_eq!(
            predictor.forecast(3).unwrap_err(),
            ForecastError::FitRequired
        );
    }

    #[test]
    fn predict_rejects_start_at_or_before_last_month() {
        let mut predictor = Predictor::new(linear_dataset(24));
        fit_lag1(&mut predictor, month(2021, 12));

        let result = predictor.predict(Some(month(2021, 12)), None, 3);
        assert!(matches!(result, Err(ForecastError::InvalidWindow(_))));

        let result = predictor.predict(Some(month(2021, 6)), None, 3);
        assert!(matches!(result, Err(ForecastError::InvalidWindow(_))));
    }

    #[test]
    fn predict_rejects_reversed_or_empty_windows() {
        let mut predictor = Predictor::new(linear_dataset(24));
        fit_lag1(&mut predictor, month(2021, 12));

        let result = predictor.predict(Some(month(2022, 3)), Some(month(2022, 1)), 3);
        assert!(matches!(result, Err(ForecastError::InvalidWindow(_))));

        let result = predictor.predict(None, None, 0);
        assert!(matches!(result, Err(ForecastError::InvalidWindow(_))));
    }

    #[test]
    fn predict_extends_a_linear_series() {
        let mut predictor = Predictor::new(linear_dataset(24));
        fit_lag1(&mut predictor, month(2021, 12));

        let forecast = predictor.forecast(3).unwrap();
        assert_eq!(
            forecast.iter().map(|(m, _)| *m).collect::<Vec<_>>(),
            vec![month(2022, 1), month(2022, 2), month(2022, 3)]
        );
        for (i, (_, level)) in forecast.iter().enumerate() {
            assert_relative_eq!(*level, 25.0 + i as f64, epsilon = 1e-6);
        }
    }

    #[test]
    fn predict_honours_an_explicit_end_month() {
        let mut predictor = Predictor::new(linear_dataset(24));
        fit_lag1(&mut predictor, month(2021, 12));

        let forecast = predictor
            .predict(None, Some(month(2022, 2)), Predictor::DEFAULT_STEPS_AHEAD)
            .unwrap();
        assert_eq!(forecast.len(), 2);
    }

    #[test]
    fn model_is_reusable_across_forecast_calls() {
        let mut predictor = Predictor::new(linear_dataset(24));
        fit_lag1(&mut predictor, month(2021, 12));

        let first = predictor.forecast(3).unwrap();
        let second = predictor.forecast(3).unwrap();
        assert_eq!(first.len(), second.len());
        for ((m1, v1), (m2, v2)) in first.iter().zip(&second) {
            assert_eq!(m1, m2);
            assert_relative_eq!(*v1, *v2, epsilon = 1e-9);
        }
    }

    #[test]
    fn missing_external_regressor_fails_fast() {
        // Regressor is a different variable with no future values.
        let n = 24;
        let y: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        let x: Vec<f64> = (1..=n).map(|i| (i * 2) as f64).collect();
        let data =
            Dataset::from_columns(month(2020, 1), vec![("y", y), ("x", x)]).unwrap();

        let mut predictor = Predictor::new(data);
        let target = VariableSpec::level("y");
        let regressor = VariableSpec::level("x");
        predictor
            .fit(&target, &[regressor], month(2021, 12), None, false)
            .unwrap();

        let result = predictor.forecast(1);
        assert_eq!(
            result,
            Err(ForecastError::MissingRegressor {
                column: "x".to_string(),
                month: month(2022, 1),
            })
        );
    }

    #[test]
    fn diagnostics_receive_residuals_keyed_by_target_name() {
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = SharedSink {
            reports: Rc::clone(&reports),
            fail: false,
        };

        let mut predictor =
            Predictor::new(linear_dataset(24)).with_diagnostics(Box::new(sink));
        fit_lag1(&mut predictor, month(2021, 12));

        let reports = reports.borrow();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].series_name, "y");
        assert_eq!(reports[0].months.len(), reports[0].residuals.len());
        assert_eq!(reports[0].months.first(), Some(&month(2020, 2)));
    }

    #[test]
    fn diagnostics_failure_never_aborts_fitting() {
        let sink = SharedSink {
            reports: Rc::new(RefCell::new(Vec::new())),
            fail: true,
        };

        let mut predictor =
            Predictor::new(linear_dataset(24)).with_diagnostics(Box::new(sink));
        fit_lag1(&mut predictor, month(2021, 12));
        assert!(predictor.is_fitted());
    }

    #[test]
    fn recording_sink_integrates_with_fit() {
        let mut predictor =
            Predictor::new(linear_dataset(24)).with_diagnostics(Box::new(RecordingSink::new()));
        fit_lag1(&mut predictor, month(2021, 12));
        assert!(predictor.is_fitted());
    }

    #[test]
    fn fit_one_matches_slice_form() {
        let mut a = Predictor::new(linear_dataset(24));
        let mut b = Predictor::new(linear_dataset(24));
        let target = VariableSpec::level("y");
        let regressor = VariableSpec::new("y", 0, false, 1);

        a.fit_one(&target, &regressor, month(2021, 12), None, true)
            .unwrap();
        b.fit(&target, &[regressor], month(2021, 12), None, true)
            .unwrap();

        assert_eq!(
            a.fitted().unwrap().regressor_columns(),
            b.fitted().unwrap().regressor_columns()
        );
    }
}
