// Shared fixtures for the integration tests
//
// Builds sample tables from known cost laws with a deterministic jitter so
// that the expected model is unambiguous and results are reproducible.

#![allow(dead_code)] // each test binary uses a different subset

use perfstats::samples::SampleTable;
use std::collections::BTreeMap;

/// Repeating jitter, small relative to every cost law used in tests
pub const JITTER: [f64; 7] = [0.35, -0.2, 0.05, -0.4, 0.3, -0.1, 0.0];

/// Problem sizes 10, 20, ..., 200
pub fn sizes() -> impl Iterator<Item = u64> {
    (10..=200u64).step_by(10)
}

pub fn metrics(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Record `cycles = cost(N) + jitter` for every size under `label`
pub fn record_law(table: &mut SampleTable, label: &str, cost: impl Fn(f64) -> f64) {
    for (i, n) in sizes().enumerate() {
        let cycles = cost(n as f64) + JITTER[i % JITTER.len()];
        table
            .record(label, n, &metrics(&[("cycles", cycles)]))
            .expect("valid observation");
    }
}

/// Table with one label following `cost`
pub fn table_with_law(label: &str, cost: impl Fn(f64) -> f64) -> SampleTable {
    let mut table = SampleTable::new();
    record_law(&mut table, label, cost);
    table
}
