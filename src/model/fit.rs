// Ordinary least squares with the diagnostics used to compare models
//
// Formulas follow the usual OLS summary conventions: R² is centered when the
// design contains a nonzero constant column and uncentered otherwise, and the
// information criteria are reported per observation.

use super::config::Criterion;
use super::distributions::{f_survival, student_t_two_sided};
use super::linalg::{column, least_squares, mul_vec, Matrix, SolveError};
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;

/// Why a candidate could not be fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "failure", rename_all = "snake_case")]
pub enum FitFailure {
    /// At least one residual degree of freedom is required
    InsufficientDegreesOfFreedom {
        observations: usize,
        coefficients: usize,
    },
    /// Chosen regressors are linearly dependent
    Singular,
    /// A coefficient or the ranking criterion came out NaN or infinite
    NonFinite,
    /// Regressor columns and target differ in length
    ShapeMismatch,
}

impl fmt::Display for FitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitFailure::InsufficientDegreesOfFreedom {
                observations,
                coefficients,
            } => write!(
                f,
                "{} observations cannot fit {} coefficients",
                observations, coefficients
            ),
            FitFailure::Singular => write!(f, "design matrix is singular"),
            FitFailure::NonFinite => write!(f, "fit produced non-finite values"),
            FitFailure::ShapeMismatch => write!(f, "regressors and target differ in length"),
        }
    }
}

/// Result of one least-squares fit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearFit {
    pub observations: usize,
    pub coefficients: Vec<f64>,
    pub standard_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    pub residuals: Vec<f64>,
    pub residual_dof: usize,
    pub residual_variance: f64,
    pub rss: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    /// Whether R² and F were computed around the mean
    pub centered: bool,
}

impl LinearFit {
    /// Fit `target ≈ design · β`
    pub fn solve(
        design: &Matrix<f64>,
        target: &[f64],
        rank_tolerance: f64,
    ) -> Result<Self, FitFailure> {
        let (nobs, ncoef) = design.shape();
        if target.len() != nobs {
            return Err(FitFailure::ShapeMismatch);
        }
        if nobs <= ncoef || ncoef == 0 {
            return Err(FitFailure::InsufficientDegreesOfFreedom {
                observations: nobs,
                coefficients: ncoef,
            });
        }

        let solution = least_squares(design, target, rank_tolerance).map_err(|e| match e {
            SolveError::RankDeficient => FitFailure::Singular,
            SolveError::ShapeMismatch => FitFailure::ShapeMismatch,
            SolveError::Underdetermined => FitFailure::InsufficientDegreesOfFreedom {
                observations: nobs,
                coefficients: ncoef,
            },
        })?;
        let coefficients = solution.coefficients;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(FitFailure::NonFinite);
        }

        let predicted = mul_vec(design, &coefficients);
        let residuals: Vec<f64> = target.iter().zip(&predicted).map(|(y, p)| y - p).collect();
        let rss: f64 = residuals.iter().map(|r| r * r).sum();

        let n = nobs as f64;
        let ndof = nobs - ncoef;
        let dof = ndof as f64;
        let residual_variance = rss / dof;

        let standard_errors: Vec<f64> = solution
            .unscaled_variances
            .iter()
            .map(|v| (residual_variance * v).sqrt())
            .collect();
        let t_values: Vec<f64> = coefficients
            .iter()
            .zip(&standard_errors)
            .map(|(&c, &se)| t_value(c, se))
            .collect();
        let p_values = t_values
            .iter()
            .map(|&t| student_t_two_sided(t, dof))
            .collect();

        let centered = (0..ncoef).any(|j| is_constant_column(design, j));
        let tss: f64 = if centered {
            let mean = target.iter().sum::<f64>() / n;
            target.iter().map(|y| (y - mean) * (y - mean)).sum()
        } else {
            target.iter().map(|y| y * y).sum()
        };
        let r_squared = 1.0 - rss / tss;

        let model_dof = ncoef - usize::from(centered);
        let adj_r_squared = 1.0 - (1.0 - r_squared) * (nobs - usize::from(centered)) as f64 / dof;
        let (f_statistic, f_p_value) = if model_dof == 0 {
            (f64::NAN, f64::NAN)
        } else {
            let md = model_dof as f64;
            let f = (r_squared / md) / ((1.0 - r_squared) / dof);
            (f, f_survival(f, md, dof))
        };

        let log_likelihood = -(n / 2.0) * (1.0 + (2.0 * PI).ln()) - (n / 2.0) * (rss / n).ln();
        let k = ncoef as f64;
        let aic = (-2.0 * log_likelihood + 2.0 * k) / n;
        let bic = (-2.0 * log_likelihood + k * n.ln()) / n;
        if aic.is_nan() || bic.is_nan() {
            return Err(FitFailure::NonFinite);
        }

        Ok(Self {
            observations: nobs,
            coefficients,
            standard_errors,
            t_values,
            p_values,
            residuals,
            residual_dof: ndof,
            residual_variance,
            rss,
            r_squared,
            adj_r_squared,
            f_statistic,
            f_p_value,
            log_likelihood,
            aic,
            bic,
            centered,
        })
    }

    /// Value of the given ranking criterion (lower is better)
    pub fn criterion(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Aic => self.aic,
            Criterion::Bic => self.bic,
        }
    }
}

fn t_value(coefficient: f64, standard_error: f64) -> f64 {
    if standard_error > 0.0 {
        coefficient / standard_error
    } else if coefficient == 0.0 {
        0.0
    } else {
        f64::INFINITY.copysign(coefficient)
    }
}

fn is_constant_column(design: &Matrix<f64>, j: usize) -> bool {
    let mut values = column(design, j);
    match values.next() {
        Some(first) if first != 0.0 => values.all(|v| v == first),
        _ => false,
    }
}
