//! Error types for the statistics engine
//!
//! Only caller bugs surface here. Degenerate data (empty histograms, models
//! that fail to converge) is reported through sentinels and typed outcomes
//! instead, see `histogram::NO_DATA` and `model::ModelOutcome`.

use thiserror::Error;

/// Errors surfaced to the immediate caller
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No samples recorded for label [{0}]")]
    UnknownLabel(String),

    #[error("Could not find dependent variable [{metric}] in the metrics list of [{label}]")]
    UnknownDependent { label: String, metric: String },

    #[error("Family [{family}] references metric [{metric}] which is absent from [{label}]")]
    UnknownFamilyMember {
        label: String,
        family: String,
        metric: String,
    },

    #[error("Dependent variable [{metric}] cannot also be an explanatory variable")]
    DependentInFamily { metric: String },

    #[error("Metric [{metric}] appears in more than one family")]
    DuplicateFamilyMember { metric: String },

    #[error("Model search would enumerate {count} combinations (limit {limit})")]
    TooManyCombinations { count: u128, limit: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rejected observation for [{label}]: {reason}")]
    RejectedObservation { label: String, reason: String },

    #[error("Observation for [{label}] has metrics {found:?}, series expects {expected:?}")]
    InconsistentMetrics {
        label: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Invalid bin layout: {0}")]
    InvalidLayout(String),

    #[error("Cannot merge histograms with different bin layouts")]
    LayoutMismatch,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
