//! Per-label observation series collected during a measurement session
//!
//! The table is append-only while measuring and read-only while fitting.
//! Each label owns one series of parallel arrays: `n[i]` and
//! `metrics[*].values[i]` describe the i-th observation.

mod catalog;
mod session;

pub use catalog::{
    DerivedValue, SizeTransform, VariableCatalog, VariableDescriptor, VariableSource, CONSTANT,
    SIZE_GROUP,
};
pub use session::{CounterSource, MeasurementSession, WallClockSource};

use crate::error::{EngineError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// One explanatory or dependent column of a series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub group: u32,
    pub is_global: bool,
    pub values: Vec<f64>,
}

/// All observations recorded under one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSeries {
    pub label: String,
    pub n: Vec<u64>,
    pub metrics: Vec<Metric>,
}

impl SampleSeries {
    fn new(label: &str, row: &[DerivedValue]) -> Self {
        Self {
            label: label.to_string(),
            n: Vec::new(),
            metrics: row
                .iter()
                .map(|v| Metric {
                    name: v.name.clone(),
                    group: v.group,
                    is_global: v.is_global,
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.n.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn metric_index(&self, name: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m.name == name)
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name.clone()).collect()
    }

    fn matches(&self, row: &[DerivedValue]) -> bool {
        self.metrics.len() == row.len()
            && self.metrics.iter().zip(row).all(|(m, v)| m.name == v.name)
    }

    fn push(&mut self, problem_size: u64, row: Vec<DerivedValue>) -> usize {
        self.n.push(problem_size);
        for (metric, derived) in self.metrics.iter_mut().zip(row) {
            metric.values.push(derived.value);
        }
        self.n.len() - 1
    }
}

/// Session-scoped store of sample series keyed by label
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    catalog: VariableCatalog,
    series: BTreeMap<String, SampleSeries>,
}

impl SampleTable {
    /// Table using the standard variable catalog
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: VariableCatalog) -> Self {
        Self {
            catalog,
            series: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    /// Append one observation to `label`'s series, returning its row index
    ///
    /// Rejects observations that carry no information (`problem_size == 0`,
    /// no metrics, non-finite values), raw metrics named like a catalog
    /// column (`N`, `Constant`...), and rows whose metric set differs from
    /// the one the series was created with.
    pub fn record(
        &mut self,
        label: &str,
        problem_size: u64,
        metrics: &BTreeMap<String, f64>,
    ) -> Result<usize> {
        let reject = |reason: String| {
            tracing::warn!(label, reason = reason.as_str(), "rejected observation");
            Err(EngineError::RejectedObservation {
                label: label.to_string(),
                reason,
            })
        };

        if problem_size == 0 {
            return reject("problem size is zero".to_string());
        }
        if metrics.is_empty() {
            return reject("no metrics".to_string());
        }
        if let Some((name, value)) = metrics.iter().find(|(_, v)| !v.is_finite()) {
            return reject(format!("metric {} is not finite ({})", name, value));
        }
        if let Some(name) = metrics.keys().find(|name| self.catalog.shadows(name)) {
            return reject(format!("metric {} collides with a derived variable", name));
        }

        let row = self.catalog.evaluate(problem_size, metrics);
        let series = self.series.entry(label.to_string()).or_insert_with(|| {
            tracing::debug!(label, columns = row.len(), "new sample series");
            SampleSeries::new(label, &row)
        });
        if !series.matches(&row) {
            return Err(EngineError::InconsistentMetrics {
                label: label.to_string(),
                expected: series.metric_names(),
                found: row.iter().map(|v| v.name.clone()).collect(),
            });
        }
        Ok(series.push(problem_size, row))
    }

    pub fn series(&self, label: &str) -> Option<&SampleSeries> {
        self.series.get(label)
    }

    /// Labels in sorted order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleSeries> {
        self.series.values()
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total observations across every label
    pub fn total_observations(&self) -> usize {
        self.series.values().map(SampleSeries::len).sum()
    }

    /// Drop every series (end of session)
    pub fn clear(&mut self) {
        self.series.clear();
    }
}
