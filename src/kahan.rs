//! Compensated (Kahan) summation
//!
//! Every addition loses the low-order bits that do not fit in the running
//! total. The accumulator keeps those bits in a residual and feeds them back
//! into the next addition, so long runs of small values added to a large
//! total do not drift.
//!
//! Scientific Foundation:
//! Kahan, W. (1965). Further remarks on reducing truncation errors.
//! Communications of the ACM, 8(1), 40.

use serde::{Deserialize, Serialize};

/// Running sum with error feedback
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StableAccumulator {
    sum: f64,
    residual: f64,
}

impl StableAccumulator {
    /// Create an empty accumulator
    pub const fn new() -> Self {
        Self {
            sum: 0.0,
            residual: 0.0,
        }
    }

    /// Add a value, folding in the compensation from the previous addition
    #[inline]
    pub fn add(&mut self, value: f64) {
        let y = value - self.residual;
        let t = self.sum + y;
        self.residual = (t - self.sum) - y;
        self.sum = t;
    }

    /// Merge another accumulator into this one
    ///
    /// The other residual is subtracted first so that its pending
    /// compensation is not lost.
    pub fn merge(&mut self, other: &StableAccumulator) {
        self.add(-other.residual);
        self.add(other.sum);
    }

    /// Current compensated total
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Pending compensation (diagnostic only)
    #[inline]
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Reset to zero
    #[inline]
    pub fn clear(&mut self) {
        self.sum = 0.0;
        self.residual = 0.0;
    }
}

impl Extend<f64> for StableAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl FromIterator<f64> for StableAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}
