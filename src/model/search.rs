// Exhaustive search over one-member-per-family regressor combinations

use super::config::SearchConfig;
use super::families::FamilyAssignment;
use super::fit::{FitFailure, LinearFit};
use super::linalg::design_matrix;
use super::outcome::{
    CandidateReport, CandidateStatus, ModelOutcome, ModelResult, NonConvergence, NotConverged,
    RejectReason, Term,
};
use super::product::MixedRadix;
use crate::error::{EngineError, Result};
use crate::samples::{SampleSeries, SampleTable};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Dependent variable used when the caller does not name one
pub const DEFAULT_DEPENDENT: &str = "cycles";

/// Label reported for the cross-label pooled model
pub const POOLED_LABEL: &str = "pooled";

/// Variables, target and families for one search
struct Problem {
    label: String,
    dependent: String,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    target: Vec<f64>,
    families: Vec<Vec<usize>>,
}

impl Problem {
    fn rows(&self) -> usize {
        self.target.len()
    }

    fn largest_family(&self) -> usize {
        self.families.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Fits every combination of regressors and keeps the best by AIC or BIC
///
/// # Example
/// ```
/// use perfstats::model::{ModelSearchEngine, SearchConfig};
/// use perfstats::samples::SampleTable;
/// use std::collections::BTreeMap;
///
/// let mut table = SampleTable::new();
/// for n in (10..=100).step_by(10) {
///     let noise = if n % 20 == 0 { 0.5 } else { -0.5 };
///     let cycles = 3.0 + 2.0 * n as f64 + noise;
///     table
///         .record("copy", n, &BTreeMap::from([("cycles".to_string(), cycles)]))
///         .unwrap();
/// }
///
/// let engine = ModelSearchEngine::new(&table, SearchConfig::default()).unwrap();
/// let outcome = engine.fit_default("copy", "cycles").unwrap();
/// assert!(outcome.is_converged());
/// ```
#[derive(Debug, Clone)]
pub struct ModelSearchEngine<'a> {
    table: &'a SampleTable,
    config: SearchConfig,
}

impl<'a> ModelSearchEngine<'a> {
    pub fn new(table: &'a SampleTable, config: SearchConfig) -> Result<Self> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(Self { table, config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search `label`'s series with explicit families
    pub fn fit(
        &self,
        label: &str,
        dependent: &str,
        families: &FamilyAssignment,
    ) -> Result<ModelOutcome> {
        let series = self.series(label, dependent)?;
        let names = series.metric_names();
        let resolved = families.resolve(label, &names, dependent)?;
        self.check_combinations(families.combinations())?;

        let target = series
            .metric(dependent)
            .map(|m| m.values.clone())
            .unwrap_or_default();
        let problem = Problem {
            label: label.to_string(),
            dependent: dependent.to_string(),
            names,
            columns: series.metrics.iter().map(|m| m.values.clone()).collect(),
            target,
            families: resolved,
        };
        Ok(self.search(&problem))
    }

    /// Search `label`'s series with one family per metric group
    pub fn fit_default(&self, label: &str, dependent: &str) -> Result<ModelOutcome> {
        let series = self.series(label, dependent)?;
        let families = FamilyAssignment::from_groups(series, dependent);
        self.fit(label, dependent, &families)
    }

    /// Search every label with its default families, in label order
    pub fn fit_all(&self, dependent: &str) -> Result<Vec<ModelOutcome>> {
        self.table
            .labels()
            .map(|label| self.fit_default(label, dependent))
            .collect()
    }

    /// One model across all labels
    ///
    /// Non-global variables become label-scoped regressors named
    /// `label:name` that are zero outside their own label's rows. Global
    /// variables share one column across labels. Families are formed per
    /// (label, group), with global variables pooled into a family per group.
    pub fn fit_pooled(&self, dependent: &str) -> Result<ModelOutcome> {
        let rows = self.table.total_observations();
        let mut names: Vec<String> = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();
        let mut index_of: BTreeMap<String, usize> = BTreeMap::new();
        let mut family_of: BTreeMap<(String, u32), usize> = BTreeMap::new();
        let mut families: Vec<Vec<usize>> = Vec::new();
        let mut target = Vec::with_capacity(rows);

        for series in self.table.iter() {
            let dependent_column = series
                .metric(dependent)
                .ok_or_else(|| EngineError::UnknownDependent {
                    label: series.label.clone(),
                    metric: dependent.to_string(),
                })?;
            let offset = target.len();
            target.extend_from_slice(&dependent_column.values);

            for metric in series.metrics.iter().filter(|m| m.name != dependent) {
                let (key, scope) = if metric.is_global {
                    (metric.name.clone(), String::new())
                } else {
                    (
                        format!("{}:{}", series.label, metric.name),
                        series.label.clone(),
                    )
                };
                let variable = *index_of.entry(key.clone()).or_insert_with(|| {
                    names.push(key);
                    columns.push(vec![0.0; rows]);
                    columns.len() - 1
                });
                columns[variable][offset..offset + metric.values.len()]
                    .copy_from_slice(&metric.values);

                let family = *family_of.entry((scope, metric.group)).or_insert_with(|| {
                    families.push(Vec::new());
                    families.len() - 1
                });
                if !families[family].contains(&variable) {
                    families[family].push(variable);
                }
            }
        }

        let combinations = families.iter().map(|f| f.len() as u128).product();
        self.check_combinations(combinations)?;

        let problem = Problem {
            label: POOLED_LABEL.to_string(),
            dependent: dependent.to_string(),
            names,
            columns,
            target,
            families,
        };
        Ok(self.search(&problem))
    }

    fn series(&self, label: &str, dependent: &str) -> Result<&'a SampleSeries> {
        let series = self
            .table
            .series(label)
            .ok_or_else(|| EngineError::UnknownLabel(label.to_string()))?;
        if series.metric(dependent).is_none() {
            return Err(EngineError::UnknownDependent {
                label: label.to_string(),
                metric: dependent.to_string(),
            });
        }
        Ok(series)
    }

    fn check_combinations(&self, count: u128) -> Result<()> {
        if count > self.config.max_combinations as u128 {
            return Err(EngineError::TooManyCombinations {
                count,
                limit: self.config.max_combinations,
            });
        }
        Ok(())
    }

    fn search(&self, problem: &Problem) -> ModelOutcome {
        let not_converged = |reason: NonConvergence, candidates: Vec<CandidateReport>| {
            info!(
                label = problem.label.as_str(),
                reason = %reason,
                "model did not converge"
            );
            ModelOutcome::NotConverged(NotConverged {
                label: problem.label.clone(),
                dependent: problem.dependent.clone(),
                reason,
                candidates,
            })
        };

        if problem.families.is_empty() {
            return not_converged(NonConvergence::NoCandidates, Vec::new());
        }

        let criterion = self.config.criterion;
        let radices = problem.families.iter().map(Vec::len).collect();
        let mut candidates = Vec::new();
        let mut best: Option<(f64, usize, Vec<usize>, LinearFit)> = None;

        for (index, digits) in MixedRadix::new(radices).enumerate() {
            let chosen: Vec<usize> = digits
                .iter()
                .zip(&problem.families)
                .map(|(&digit, family)| family[digit])
                .collect();
            let variables: Vec<String> = chosen.iter().map(|&i| problem.names[i].clone()).collect();
            let columns: Vec<&[f64]> = chosen.iter().map(|&i| problem.columns[i].as_slice()).collect();
            let fitted = design_matrix(&columns)
                .map_err(|_| FitFailure::ShapeMismatch)
                .and_then(|design| {
                    LinearFit::solve(&design, &problem.target, self.config.rank_tolerance)
                });

            let status = match fitted {
                Err(failure) => {
                    debug!(index, ?variables, %failure, "candidate failed");
                    CandidateStatus::Failed(failure)
                }
                Ok(fit) => match self.screen(&fit, &variables) {
                    Some(reason) => {
                        debug!(index, ?variables, %reason, "candidate rejected");
                        CandidateStatus::Rejected(reason)
                    }
                    None => {
                        let score = fit.criterion(criterion);
                        debug!(index, ?variables, aic = fit.aic, bic = fit.bic, "candidate fitted");
                        let status = CandidateStatus::Accepted {
                            aic: fit.aic,
                            bic: fit.bic,
                        };
                        if best.as_ref().map_or(true, |(s, ..)| score < *s) {
                            best = Some((score, index, chosen, fit));
                        }
                        status
                    }
                },
            };
            candidates.push(CandidateReport { variables, status });
        }

        let largest_family = problem.largest_family();
        if problem.rows() < largest_family {
            return not_converged(
                NonConvergence::InsufficientObservations {
                    observations: problem.rows(),
                    largest_family,
                },
                candidates,
            );
        }

        let Some((score, chosen_index, chosen, fit)) = best else {
            let reason = if candidates
                .iter()
                .any(|c| matches!(c.status, CandidateStatus::Rejected(_)))
            {
                NonConvergence::AllCandidatesRejected
            } else {
                NonConvergence::AllCandidatesFailed
            };
            return not_converged(reason, candidates);
        };

        let terms: Vec<Term> = chosen
            .iter()
            .enumerate()
            .map(|(k, &variable)| Term {
                name: problem.names[variable].clone(),
                coefficient: fit.coefficients[k],
                standard_error: fit.standard_errors[k],
                t_value: fit.t_values[k],
                p_value: fit.p_values[k],
            })
            .collect();
        info!(
            label = problem.label.as_str(),
            dependent = problem.dependent.as_str(),
            terms = ?terms.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            score,
            r_squared = fit.r_squared,
            "selected model"
        );

        ModelOutcome::Converged(ModelResult {
            label: problem.label.clone(),
            dependent: problem.dependent.clone(),
            criterion,
            chosen: chosen_index,
            terms,
            fit,
            candidates,
        })
    }

    /// Apply the selection policy to a fitted candidate
    fn screen(&self, fit: &LinearFit, variables: &[String]) -> Option<RejectReason> {
        if self.config.reject_negative_coefficients {
            if let Some((name, &coefficient)) = variables
                .iter()
                .zip(&fit.coefficients)
                .find(|(_, &c)| c < 0.0)
            {
                return Some(RejectReason::NegativeCoefficient {
                    name: name.clone(),
                    coefficient,
                });
            }
        }
        if self.config.require_significant_terms {
            let level = self.config.significance_level;
            if let Some((name, &p_value)) = variables
                .iter()
                .zip(&fit.p_values)
                .find(|(_, &p)| p.is_nan() || p > level)
            {
                return Some(RejectReason::InsignificantTerm {
                    name: name.clone(),
                    p_value,
                });
            }
        }
        None
    }
}
