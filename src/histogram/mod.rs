//! Fixed-memory histograms for long-tailed integer samples
//!
//! `SemilogHistogram` covers the whole `u64` range with power-of-two octaves,
//! each split into `2^NDB` linear bins, so single-digit counts and multi-second
//! latencies land in the same structure with the same relative resolution.
//! `BoundedHistogram` is the fixed-width variant for domains known up front.
//!
//! Insertion is O(1): one bucket computation, three additions. It never
//! allocates or locks, so it can sit inside the loop being measured. Each
//! measuring thread owns its own histogram; `merge` combines them afterwards.

mod interpolation;
mod layout;

pub use interpolation::{invcdf, Interpolation};
pub use layout::{
    BinLayout, BinRange, LinearLayout, SemilogLayout, FAST_PATH_LIMIT, MAX_SUBDIVISIONS,
};

use crate::error::{EngineError, Result};
use crate::kahan::StableAccumulator;
use crate::report::ReportFormatter;
use serde::Serialize;
use std::fmt;

/// Returned by a percentile scan that finds no crossing bin
pub const NO_DATA: f64 = -1.0;

/// Percentile distance of ±1σ from the median for a normal distribution
const ONE_SIGMA_PCT: f64 = 34.134_474_606_854_3;
/// Percentile distance of ±2σ from the median for a normal distribution
const TWO_SIGMA_PCT: f64 = 47.724_986_805_182_1;

/// Geometric histogram over the full `u64` range
pub type SemilogHistogram = Histogram<SemilogLayout>;

/// Fixed-width histogram over a known range
pub type BoundedHistogram = Histogram<LinearLayout>;

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    count: u64,
    sum: StableAccumulator,
    sum2: StableAccumulator,
}

impl Bin {
    #[inline]
    fn add(&mut self, value: u64) {
        let v = value as f64;
        self.count += 1;
        self.sum.add(v);
        self.sum2.add(v * v);
    }

    fn clear(&mut self) {
        self.count = 0;
        self.sum.clear();
        self.sum2.clear();
    }
}

/// Read-only snapshot of one bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinView {
    pub index: usize,
    pub range: BinRange,
    pub count: u64,
    /// Mean of the raw values in the bin (NaN when empty)
    pub mean: f64,
    /// Population variance of the raw values in the bin (NaN when empty)
    pub variance: f64,
}

/// Standard deviation estimated from the percentiles at ±1σ and ±2σ
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub one_sigma: f64,
    pub two_sigma: f64,
}

/// Histogram with a pluggable bin layout
#[derive(Debug, Clone)]
pub struct Histogram<L: BinLayout> {
    layout: L,
    bins: Vec<Bin>,
    total_count: u64,
    total_sum: StableAccumulator,
    interpolation: Interpolation,
}

impl SemilogHistogram {
    /// Create a semilog histogram with `subdivisions` (NDB) linear bins per octave
    pub fn new(subdivisions: u32) -> Result<Self> {
        Ok(Self::with_layout(SemilogLayout::new(subdivisions)?))
    }

    pub fn subdivisions(&self) -> u32 {
        self.layout.subdivisions()
    }
}

impl BoundedHistogram {
    /// Create a fixed-width histogram with `bins` bins over `[min, max)`
    pub fn bounded(min: u64, max: u64, bins: usize) -> Result<Self> {
        Ok(Self::with_layout(LinearLayout::new(min, max, bins)?))
    }
}

impl<L: BinLayout> Histogram<L> {
    /// Create an empty histogram; all bin storage is allocated here
    pub fn with_layout(layout: L) -> Self {
        Self {
            bins: vec![Bin::default(); layout.num_bins()],
            layout,
            total_count: 0,
            total_sum: StableAccumulator::new(),
            interpolation: Interpolation::default(),
        }
    }

    /// Set the interpolation used by [`percentile`](Self::percentile)
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Add a sample
    #[inline]
    pub fn add(&mut self, value: u64) {
        let index = self.layout.bin_of(value);
        self.bins[index].add(value);
        self.total_count += 1;
        self.total_sum.add(value as f64);
    }

    /// Reset every bin and the totals; no reallocation
    pub fn clear(&mut self) {
        for bin in &mut self.bins {
            bin.clear();
        }
        self.total_count = 0;
        self.total_sum.clear();
    }

    /// Number of samples added since the last clear
    pub fn count(&self) -> u64 {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Compensated sum of every sample
    pub fn sum(&self) -> f64 {
        self.total_sum.sum()
    }

    /// Mean of every sample (NaN when empty)
    pub fn mean(&self) -> f64 {
        if self.total_count == 0 {
            return f64::NAN;
        }
        self.total_sum.sum() / self.total_count as f64
    }

    /// Value at percentile `pct` (0..=100) using the default interpolation
    ///
    /// Returns NaN on an empty histogram.
    pub fn percentile(&self, pct: f64) -> f64 {
        self.percentile_with(pct, self.interpolation)
    }

    /// Value at percentile `pct` using an explicit interpolation
    pub fn percentile_with(&self, pct: f64, interpolation: Interpolation) -> f64 {
        if self.total_count == 0 || pct.is_nan() {
            return f64::NAN;
        }
        let goal = pct.clamp(0.0, 100.0) * self.total_count as f64 / 100.0;
        let mut count = 0u64;
        for (index, bin) in self.bins.iter().enumerate() {
            // Empty bins can never hold a percentile; skipping them keeps
            // percentile(0) on the smallest sample's bin
            if bin.count == 0 {
                continue;
            }
            if (count + bin.count) as f64 >= goal {
                let excess = goal - count as f64;
                let ratio = excess / bin.count as f64;
                return interpolation.interpolate(&self.view(index, bin), ratio);
            }
            count += bin.count;
        }
        NO_DATA
    }

    /// Standard deviation estimated from the ±1σ and ±2σ percentiles
    pub fn spread(&self) -> Spread {
        Spread {
            one_sigma: (self.percentile(50.0 + ONE_SIGMA_PCT)
                - self.percentile(50.0 - ONE_SIGMA_PCT))
                / 2.0,
            two_sigma: (self.percentile(50.0 + TWO_SIGMA_PCT)
                - self.percentile(50.0 - TWO_SIGMA_PCT))
                / 4.0,
        }
    }

    /// Snapshot of every bin, in index order
    pub fn bins(&self) -> impl Iterator<Item = BinView> + '_ {
        self.bins
            .iter()
            .enumerate()
            .map(|(index, bin)| self.view(index, bin))
    }

    /// Add another histogram's bins into this one
    ///
    /// Both histograms must share the same layout. Bin-wise addition is
    /// associative, so per-thread histograms can be folded in any order.
    pub fn merge(&mut self, other: &Histogram<L>) -> Result<()> {
        if self.layout != other.layout {
            return Err(EngineError::LayoutMismatch);
        }
        for (mine, theirs) in self.bins.iter_mut().zip(&other.bins) {
            mine.count += theirs.count;
            mine.sum.merge(&theirs.sum);
            mine.sum2.merge(&theirs.sum2);
        }
        self.total_count += other.total_count;
        self.total_sum.merge(&other.total_sum);
        Ok(())
    }

    fn view(&self, index: usize, bin: &Bin) -> BinView {
        let (mean, variance) = if bin.count == 0 {
            (f64::NAN, f64::NAN)
        } else {
            let n = bin.count as f64;
            let mean = bin.sum.sum() / n;
            let mean2 = bin.sum2.sum() / n;
            (mean, (mean2 - mean * mean).max(0.0))
        };
        BinView {
            index,
            range: self.layout.range(index),
            count: bin.count,
            mean,
            variance,
        }
    }

    /// Percentile table at the standard points, one `pct,value` line each
    pub fn print(&self) -> String {
        ReportFormatter::new().render_histogram(self)
    }
}

impl<L: BinLayout> fmt::Display for Histogram<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.print())
    }
}
