// Typed results of a model search
//
// Non-convergence is a normal outcome, not an error: callers get the reason
// and the status of every candidate that was tried.

use super::config::Criterion;
use super::fit::{FitFailure, LinearFit};
use serde::Serialize;
use std::fmt;

/// One fitted regressor of the winning model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Term {
    pub name: String,
    pub coefficient: f64,
    pub standard_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Why a fitted candidate was excluded from ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// A term's p-value exceeds the significance level
    InsignificantTerm { name: String, p_value: f64 },
    /// A term has a negative coefficient
    NegativeCoefficient { name: String, coefficient: f64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InsignificantTerm { name, p_value } => {
                write!(f, "term {} is not significant (p={:.5})", name, p_value)
            }
            RejectReason::NegativeCoefficient { name, coefficient } => {
                write!(f, "term {} has negative coefficient {}", name, coefficient)
            }
        }
    }
}

/// What happened to one candidate combination
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateStatus {
    /// Fitted and eligible for ranking
    Accepted { aic: f64, bic: f64 },
    /// Fitted but filtered out by the search policy
    Rejected(RejectReason),
    /// Could not be fitted
    Failed(FitFailure),
}

/// A candidate combination and its status, in enumeration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateReport {
    pub variables: Vec<String>,
    pub status: CandidateStatus,
}

impl CandidateReport {
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, CandidateStatus::Accepted { .. })
    }
}

/// The winning model for one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelResult {
    pub label: String,
    pub dependent: String,
    pub criterion: Criterion,
    /// Enumeration index of the winner within `candidates`
    pub chosen: usize,
    pub terms: Vec<Term>,
    pub fit: LinearFit,
    pub candidates: Vec<CandidateReport>,
}

impl ModelResult {
    pub fn term(&self, name: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.name == name)
    }

    /// Names of the chosen regressors, in family order
    pub fn variables(&self) -> Vec<&str> {
        self.terms.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Why a search produced no model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NonConvergence {
    /// Every family was empty
    NoCandidates,
    /// Fewer observations than members of the largest family
    InsufficientObservations {
        observations: usize,
        largest_family: usize,
    },
    /// Every candidate failed to fit
    AllCandidatesFailed,
    /// Some candidates fitted, but the policy rejected all of them
    AllCandidatesRejected,
}

impl fmt::Display for NonConvergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonConvergence::NoCandidates => write!(f, "no candidate regressors"),
            NonConvergence::InsufficientObservations {
                observations,
                largest_family,
            } => write!(
                f,
                "{} observations for a family of {} alternatives",
                observations, largest_family
            ),
            NonConvergence::AllCandidatesFailed => write!(f, "no candidate could be fitted"),
            NonConvergence::AllCandidatesRejected => {
                write!(f, "every fitted candidate was rejected")
            }
        }
    }
}

/// A search that produced no model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotConverged {
    pub label: String,
    pub dependent: String,
    pub reason: NonConvergence,
    pub candidates: Vec<CandidateReport>,
}

/// Outcome of a model search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModelOutcome {
    Converged(ModelResult),
    NotConverged(NotConverged),
}

impl ModelOutcome {
    pub fn label(&self) -> &str {
        match self {
            ModelOutcome::Converged(result) => &result.label,
            ModelOutcome::NotConverged(failure) => &failure.label,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, ModelOutcome::Converged(_))
    }

    pub fn result(&self) -> Option<&ModelResult> {
        match self {
            ModelOutcome::Converged(result) => Some(result),
            ModelOutcome::NotConverged(_) => None,
        }
    }

    /// Every candidate tried, in enumeration order
    pub fn candidates(&self) -> &[CandidateReport] {
        match self {
            ModelOutcome::Converged(result) => &result.candidates,
            ModelOutcome::NotConverged(failure) => &failure.candidates,
        }
    }
}
