// Cost-model selection by exhaustive least squares
//
// Given a labeled sample series, find which explanatory variables best
// explain a dependent counter (usually cycles or nanoseconds). Variables are
// grouped into families of mutually exclusive alternatives, e.g. {N, N²,
// log N, N log N}; every one-per-family combination is fitted by OLS and the
// lowest AIC (or BIC) wins.
//
// Pipeline:
// - families.rs resolves the family assignment against the series columns
// - product.rs enumerates combinations in a fixed, restartable order
// - linalg.rs solves each least-squares problem by Householder QR
// - fit.rs derives the diagnostics (t, F, R², log-likelihood, AIC, BIC)
// - search.rs applies the selection policy and picks the winner

mod config;
mod distributions;
mod families;
mod fit;
mod linalg;
mod outcome;
mod product;
mod search;

pub use config::{Criterion, SearchConfig};
pub use distributions::{f_survival, incomplete_beta, ln_gamma, student_t_two_sided};
pub use families::{Family, FamilyAssignment};
pub use fit::{FitFailure, LinearFit};
pub use linalg::{design_matrix, least_squares, mul_vec, LeastSquares, Matrix, SolveError};
pub use outcome::{
    CandidateReport, CandidateStatus, ModelOutcome, ModelResult, NonConvergence, NotConverged,
    RejectReason, Term,
};
pub use product::MixedRadix;
pub use search::{ModelSearchEngine, DEFAULT_DEPENDENT, POOLED_LABEL};

#[cfg(test)]
mod tests;
