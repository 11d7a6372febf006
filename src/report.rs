//! Text and JSON reports for histograms and model searches
//!
//! Text layouts are line oriented and stable so they can be diffed between
//! runs. JSON output carries the same data for machine consumption; NaN
//! values (empty histograms, undefined F tests) serialize as `null`.

use crate::error::Result;
use crate::histogram::{BinLayout, Histogram};
use crate::model::{CandidateStatus, ModelOutcome};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

/// Percentiles reported when no explicit list is given
pub const STANDARD_PERCENTILES: [f64; 7] = [1.0, 10.0, 25.0, 50.0, 75.0, 90.0, 99.0];

const NOT_CONVERGED_LINE: &str = "    Model did not converge or not enough points";

/// One `pct,value` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentilePoint {
    pub pct: f64,
    pub value: f64,
}

/// Percentile summary of a histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileTable {
    pub count: u64,
    pub mean: f64,
    pub points: Vec<PercentilePoint>,
}

/// Renders histograms and model outcomes
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFormatter {
    percentiles: Vec<f64>,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self {
            percentiles: STANDARD_PERCENTILES.to_vec(),
        }
    }
}

impl ReportFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these percentiles instead of the standard points
    pub fn with_percentiles(percentiles: impl Into<Vec<f64>>) -> Self {
        Self {
            percentiles: percentiles.into(),
        }
    }

    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    pub fn histogram_table<L: BinLayout>(&self, histogram: &Histogram<L>) -> PercentileTable {
        PercentileTable {
            count: histogram.count(),
            mean: histogram.mean(),
            points: self
                .percentiles
                .iter()
                .map(|&pct| PercentilePoint {
                    pct,
                    value: histogram.percentile(pct),
                })
                .collect(),
        }
    }

    /// One `pct,value` line per reported percentile
    pub fn render_histogram<L: BinLayout>(&self, histogram: &Histogram<L>) -> String {
        let mut out = String::new();
        for point in self.histogram_table(histogram).points {
            let _ = writeln!(out, "{},{}", point.pct, point.value);
        }
        out
    }

    /// Best-model summary, or the explicit non-convergence line
    pub fn render_model(&self, outcome: &ModelOutcome) -> String {
        let mut out = String::new();
        match outcome {
            ModelOutcome::Converged(result) => {
                let fit = &result.fit;
                let _ = writeln!(out, "========== Best Model");
                let _ = writeln!(
                    out,
                    "{}, Rsq:{:5.2} F:{:.6} LL:{:.6} aic:{:.6} bic:{:.6}",
                    result.label, fit.r_squared, fit.f_p_value, fit.log_likelihood, fit.aic, fit.bic
                );
                for term in &result.terms {
                    let _ = writeln!(
                        out,
                        "   Term: {:<12}  p:{:7.5} coef:{}",
                        term.name,
                        term.p_value,
                        general(term.coefficient)
                    );
                }
            }
            ModelOutcome::NotConverged(failure) => {
                let _ = writeln!(out, "{}:", failure.label);
                let _ = writeln!(out, "{}", NOT_CONVERGED_LINE);
                let _ = writeln!(out, "    reason: {}", failure.reason);
            }
        }
        out
    }

    /// Every candidate the search tried, one line each
    pub fn render_candidates(&self, outcome: &ModelOutcome) -> String {
        let mut out = String::new();
        for (index, candidate) in outcome.candidates().iter().enumerate() {
            let variables = candidate.variables.join(" ");
            let _ = match &candidate.status {
                CandidateStatus::Accepted { aic, bic } => writeln!(
                    out,
                    "  [{}] {}  aic:{:.6} bic:{:.6}",
                    index, variables, aic, bic
                ),
                CandidateStatus::Rejected(reason) => {
                    writeln!(out, "  [{}] {}  rejected: {}", index, variables, reason)
                }
                CandidateStatus::Failed(failure) => {
                    writeln!(out, "  [{}] {}  failed: {}", index, variables, failure)
                }
            };
        }
        out
    }

    pub fn histogram_json<L: BinLayout>(&self, histogram: &Histogram<L>) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.histogram_table(histogram))?)
    }

    pub fn model_json(&self, outcome: &ModelOutcome) -> Result<String> {
        Ok(serde_json::to_string_pretty(outcome)?)
    }

    pub fn write_histogram<L: BinLayout, W: Write>(
        &self,
        histogram: &Histogram<L>,
        sink: &mut W,
    ) -> Result<()> {
        sink.write_all(self.render_histogram(histogram).as_bytes())?;
        Ok(())
    }

    pub fn write_model<W: Write>(&self, outcome: &ModelOutcome, sink: &mut W) -> Result<()> {
        sink.write_all(self.render_model(outcome).as_bytes())?;
        Ok(())
    }

    pub fn write_json<T: Serialize, W: Write>(&self, value: &T, sink: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *sink, value)?;
        sink.write_all(b"\n")?;
        Ok(())
    }
}

/// Shortest of fixed or scientific notation at six significant digits
///
/// Matches C's `%g`: scientific when the exponent is below -4 or at least 6,
/// trailing zeros removed.
pub fn general(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{:.5e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (5 - exponent) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
