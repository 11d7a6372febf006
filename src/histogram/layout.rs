// Bin layouts: value → bin index and bin index → inclusive value range
//
// Both directions are pure functions of the layout parameters, so ranges are
// never stored per bin. Clearing a histogram leaves the layout untouched.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Largest supported subdivision count (54 << 12 bins, ~220k)
pub const MAX_SUBDIVISIONS: u32 = 12;

/// Values up to this bound are exactly representable as `f64`, so the
/// exponent-field fast path agrees with the integer path
pub const FAST_PATH_LIMIT: u64 = 1 << 53;

/// Inclusive range of values covered by a bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinRange {
    pub from: u64,
    pub to: u64,
}

impl BinRange {
    pub fn contains(&self, value: u64) -> bool {
        (self.from..=self.to).contains(&value)
    }

    /// Number of integer values in the range (saturates for the full u64 span)
    pub fn width(&self) -> u64 {
        (self.to - self.from).saturating_add(1)
    }

    pub fn midpoint(&self) -> f64 {
        (self.from as f64 + self.to as f64) / 2.0
    }
}

/// Maps values onto a fixed, index-stable set of bins
pub trait BinLayout: Clone + PartialEq + Debug {
    /// Total number of bins
    fn num_bins(&self) -> usize;

    /// Bin index for a value. Always `< num_bins()`.
    fn bin_of(&self, value: u64) -> usize;

    /// Inclusive value range of a bin. `bin` must be `< num_bins()`.
    fn range(&self, bin: usize) -> BinRange;
}

/// Power-of-two octaves, each split into `2^subdivisions` equal bins
///
/// Values below `2^subdivisions` get singleton bins (bin index == value).
/// Above that, every bin is `1/2^subdivisions` of its octave wide, which
/// bounds the relative error of any in-bin estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemilogLayout {
    subdivisions: u32,
    mask: u64,
    num_bins: usize,
}

impl SemilogLayout {
    pub fn new(subdivisions: u32) -> Result<Self> {
        if subdivisions > MAX_SUBDIVISIONS {
            return Err(EngineError::InvalidLayout(format!(
                "subdivisions must be <= {}, got {}",
                MAX_SUBDIVISIONS, subdivisions
            )));
        }
        Ok(Self {
            subdivisions,
            mask: (1u64 << subdivisions) - 1,
            // A 64-bit-long value lands in octave (64 - NDB), whose last
            // bin is ((64 - NDB) << NDB) + MASK
            num_bins: ((65 - subdivisions) as usize) << subdivisions,
        })
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Integer bucket assignment (bit length + shift/mask)
    #[inline]
    pub fn calcbin(&self, value: u64) -> usize {
        let ndb = self.subdivisions;
        if value < (1u64 << ndb) {
            return value as usize;
        }
        let numbits = 64 - value.leading_zeros();
        let partition = (value >> (numbits - (ndb + 1))) & self.mask;
        (((numbits - ndb) as usize) << ndb) + partition as usize
    }

    /// Bucket assignment through the exponent field of the value's `f64`
    ///
    /// Returns `None` above [`FAST_PATH_LIMIT`]: past 53 bits the conversion
    /// rounds and can carry into the next bin.
    #[inline]
    pub fn calcbin_fast(&self, value: u64) -> Option<usize> {
        const MANTISSA_BITS: u32 = 52;
        const EXPONENT_BIAS: u64 = 1023;

        let ndb = self.subdivisions;
        if value > FAST_PATH_LIMIT {
            return None;
        }
        if value < (1u64 << ndb) {
            return Some(value as usize);
        }
        let bits = (value as f64).to_bits();
        let index = (bits >> (MANTISSA_BITS - ndb)) - ((EXPONENT_BIAS - 1 + ndb as u64) << ndb);
        Some(index as usize)
    }

    /// Exact inverse of [`calcbin`](Self::calcbin)
    pub fn calcrange(&self, bin: usize) -> BinRange {
        debug_assert!(bin < self.num_bins, "bin {} out of range", bin);
        let ndb = self.subdivisions;
        if bin < (1usize << ndb) {
            return BinRange {
                from: bin as u64,
                to: bin as u64,
            };
        }
        let partition = bin as u64 & self.mask;
        let numbits = (bin >> ndb) as u32 + ndb;
        let base = 1u64 << (numbits - 1);
        let offset = partition << (numbits - (ndb + 1));
        // (base >> ndb) - 1 first: base + offset + (base >> ndb) overflows
        // for the topmost bin
        BinRange {
            from: base + offset,
            to: base + offset + ((base >> ndb) - 1),
        }
    }
}

impl BinLayout for SemilogLayout {
    fn num_bins(&self) -> usize {
        self.num_bins
    }

    #[inline]
    fn bin_of(&self, value: u64) -> usize {
        self.calcbin(value)
    }

    fn range(&self, bin: usize) -> BinRange {
        self.calcrange(bin)
    }
}

/// Fixed-width bins over a known `[min, max)` domain
///
/// Values below `min` are counted in the first bin and values at or above
/// `max` in the last, but bin ranges stay nominal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearLayout {
    min: u64,
    max: u64,
    bins: usize,
}

impl LinearLayout {
    pub fn new(min: u64, max: u64, bins: usize) -> Result<Self> {
        if max <= min {
            return Err(EngineError::InvalidLayout(format!(
                "max ({}) must be greater than min ({})",
                max, min
            )));
        }
        if bins == 0 || bins as u64 > max - min {
            return Err(EngineError::InvalidLayout(format!(
                "bin count must be in [1, {}], got {}",
                max - min,
                bins
            )));
        }
        Ok(Self { min, max, bins })
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    fn span(&self) -> u128 {
        (self.max - self.min) as u128
    }

    /// Offset from `min` of the first value in `bin` (ceil(bin * span / bins))
    fn boundary(&self, bin: usize) -> u64 {
        let bins = self.bins as u128;
        ((bin as u128 * self.span() + bins - 1) / bins) as u64
    }
}

impl BinLayout for LinearLayout {
    fn num_bins(&self) -> usize {
        self.bins
    }

    #[inline]
    fn bin_of(&self, value: u64) -> usize {
        if value < self.min {
            return 0;
        }
        if value >= self.max {
            return self.bins - 1;
        }
        ((value - self.min) as u128 * self.bins as u128 / self.span()) as usize
    }

    fn range(&self, bin: usize) -> BinRange {
        BinRange {
            from: self.min + self.boundary(bin),
            to: self.min + self.boundary(bin + 1) - 1,
        }
    }
}
