// Configuration for the model search
//
// Selection policy only: which candidates count and how they are ranked.
// The candidate space itself comes from the family assignment.

use serde::{Deserialize, Serialize};

/// Information criterion used to rank converged candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Akaike information criterion
    #[default]
    Aic,
    /// Bayesian (Schwarz) information criterion, penalizes extra terms harder
    Bic,
}

/// Configuration for the combinatorial model search
///
/// # Example
/// ```
/// use perfstats::model::SearchConfig;
///
/// let config = SearchConfig::default();
/// assert_eq!(config.significance_level, 0.05);
/// assert!(!config.require_significant_terms);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// p-value threshold used when `require_significant_terms` is set
    pub significance_level: f64,

    /// Discard candidates in which any coefficient has p > significance_level
    ///
    /// Off by default: with noisy counters a strict filter can reject every
    /// candidate and leave nothing to report.
    pub require_significant_terms: bool,

    /// Discard candidates with any negative coefficient
    ///
    /// Costs cannot be negative, so a negative term usually means two
    /// collinear regressors are cancelling each other out.
    pub reject_negative_coefficients: bool,

    /// Ranking criterion (lower is better)
    pub criterion: Criterion,

    /// Upper bound on the number of combinations a single search may fit
    pub max_combinations: usize,

    /// Relative pivot size below which a design matrix is treated as singular
    pub rank_tolerance: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            require_significant_terms: false,
            reject_negative_coefficients: false,
            criterion: Criterion::Aic,
            max_combinations: 4096,
            rank_tolerance: 1e-10,
        }
    }
}

impl SearchConfig {
    /// Only keep models whose every term is significant at 99% and non-negative
    pub fn strict() -> Self {
        Self {
            significance_level: 0.01,
            require_significant_terms: true,
            reject_negative_coefficients: true,
            criterion: Criterion::Bic,
            ..Self::default()
        }
    }

    /// Rank every converged model, no filtering
    pub fn permissive() -> Self {
        Self {
            significance_level: 0.10,
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.significance_level) {
            return Err(format!(
                "significance_level must be in [0, 1], got {}",
                self.significance_level
            ));
        }

        if self.max_combinations == 0 {
            return Err("max_combinations must be at least 1".to_string());
        }

        if !(self.rank_tolerance > 0.0 && self.rank_tolerance < 1.0) {
            return Err(format!(
                "rank_tolerance must be in (0, 1), got {}",
                self.rank_tolerance
            ));
        }

        Ok(())
    }
}
