// Measurement session: a counter source plus the table it feeds
//
// Replaces process-wide sample maps with an explicit context object. The
// session owns its table; dropping or clearing the session ends it.

use crate::error::Result;
use crate::samples::{SampleTable, VariableCatalog};
use std::collections::BTreeMap;
use std::time::Instant;

/// Anything that can count events over a measured interval
///
/// Implementations only need non-negative values that are comparable across
/// repeated intervals. How they are read from the OS is their business.
pub trait CounterSource {
    /// Begin an interval
    fn start(&mut self);

    /// End the interval and return each counter's accumulated value
    fn stop(&mut self) -> BTreeMap<String, u64>;
}

/// Monotonic wall-clock time, reported as `nanoseconds`
#[derive(Debug, Default)]
pub struct WallClockSource {
    started: Option<Instant>,
}

impl WallClockSource {
    pub const COUNTER: &'static str = "nanoseconds";

    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterSource for WallClockSource {
    fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    fn stop(&mut self) -> BTreeMap<String, u64> {
        let elapsed = self
            .started
            .take()
            .map(|t| t.elapsed().as_nanos().min(u64::MAX as u128) as u64)
            .unwrap_or(0);
        BTreeMap::from([(Self::COUNTER.to_string(), elapsed)])
    }
}

/// Collects per-iteration counter values into a [`SampleTable`]
#[derive(Debug)]
pub struct MeasurementSession<C: CounterSource> {
    source: C,
    table: SampleTable,
}

impl<C: CounterSource> MeasurementSession<C> {
    pub fn new(source: C) -> Self {
        Self::with_catalog(source, VariableCatalog::standard())
    }

    pub fn with_catalog(source: C, catalog: VariableCatalog) -> Self {
        Self {
            source,
            table: SampleTable::with_catalog(catalog),
        }
    }

    /// Start measuring an interval
    pub fn start(&mut self) {
        self.source.start();
    }

    /// Stop the interval and record it under `label`
    ///
    /// Counter values are divided by `num_iterations`. An interval with zero
    /// iterations is discarded and returns `Ok(None)`.
    pub fn stop(
        &mut self,
        label: &str,
        num_items: u64,
        num_iterations: u64,
    ) -> Result<Option<usize>> {
        let counters = self.source.stop();
        if num_iterations == 0 {
            return Ok(None);
        }
        let per_iteration: BTreeMap<String, f64> = counters
            .into_iter()
            .map(|(name, value)| (name, value as f64 / num_iterations as f64))
            .collect();
        self.table
            .record(label, num_items, &per_iteration)
            .map(Some)
    }

    pub fn table(&self) -> &SampleTable {
        &self.table
    }

    pub fn source_mut(&mut self) -> &mut C {
        &mut self.source
    }

    /// End the session, keeping the collected samples
    pub fn into_table(self) -> SampleTable {
        self.table
    }
}
