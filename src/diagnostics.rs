//! Residual diagnostics collaborator.
//!
//! Fitting reports residuals to a sink that turns them into a side artifact
//! (historically a residual-vs-time plot). A sink failure is logged and
//! swallowed by the predictor; it never aborts fitting.

use crate::core::Month;
use crate::error::Result;

/// Consumer of per-fit residual series.
pub trait DiagnosticsSink {
    /// Record the residuals of one fit, keyed by the target variable name.
    ///
    /// `months` and `residuals` have equal length and align element-wise.
    fn record_residuals(
        &mut self,
        series_name: &str,
        months: &[Month],
        residuals: &[f64],
    ) -> Result<()>;
}

/// One recorded residual series.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualReport {
    pub series_name: String,
    pub months: Vec<Month>,
    pub residuals: Vec<f64>,
}

/// In-memory sink that keeps every reported residual series.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Vec<ResidualReport>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[ResidualReport] {
        &self.reports
    }
}

impl DiagnosticsSink for RecordingSink {
    fn record_residuals(
        &mut self,
        series_name: &str,
        months: &[Month],
        residuals: &[f64],
    ) -> Result<()> {
        self.reports.push(ResidualReport {
            series_name: series_name.to_string(),
            months: months.to_vec(),
            residuals: residuals.to_vec(),
        });
        Ok(())
    }
}
