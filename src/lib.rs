//! perfstats - statistics core for micro-benchmark measurements
//!
//! Two independent tools share this crate:
//!
//! - [`histogram`]: fixed-memory semilog histograms with O(1) insertion and
//!   percentile queries with bounded relative error, cheap enough to run
//!   inside the loop being timed.
//! - [`model`]: an exhaustive least-squares search that finds which scaling
//!   law (N, N², log N, N log N, hardware counters...) best explains a cost
//!   metric recorded in a [`samples::SampleTable`].
//!
//! [`report`] renders both as text or JSON, and [`config`] loads their
//! parameters from TOML.

pub mod config;
pub mod error;
pub mod histogram;
pub mod kahan;
pub mod model;
pub mod report;
pub mod samples;

pub use config::{EngineConfig, HistogramConfig};
pub use error::{EngineError, Result};
pub use histogram::{BoundedHistogram, Histogram, Interpolation, SemilogHistogram, NO_DATA};
pub use kahan::StableAccumulator;
pub use model::{FamilyAssignment, ModelOutcome, ModelSearchEngine, SearchConfig};
pub use report::ReportFormatter;
pub use samples::{MeasurementSession, SampleTable};
