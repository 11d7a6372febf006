// Within-bin percentile estimators
//
// The scan that finds the bin crossing a percentile goal is shared by every
// layout. Only the final step, placing the estimate inside that bin, varies.

use crate::histogram::BinView;
use serde::{Deserialize, Serialize};

/// How a percentile is placed inside the bin that crosses its goal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Assume values are spread uniformly over the bin range
    #[default]
    Linear,
    /// Assume values inside the bin are roughly normal around the bin mean;
    /// the estimate is clamped to the bin range
    Gaussian,
}

impl Interpolation {
    /// Estimate the value at `ratio` (0..=1) of the way through `bin`
    pub fn interpolate(&self, bin: &BinView, ratio: f64) -> f64 {
        let range = bin.range;
        if bin.count == 0 {
            return range.midpoint();
        }
        let from = range.from as f64;
        let to = range.to as f64;
        match self {
            Interpolation::Linear => to * ratio + from * (1.0 - ratio),
            Interpolation::Gaussian => {
                let stdev = bin.variance.sqrt();
                if !stdev.is_finite() || stdev == 0.0 {
                    return bin.mean.clamp(from, to);
                }
                (bin.mean + invcdf(ratio) * stdev).clamp(from, to)
            }
        }
    }
}

/// Approximate inverse of the standard normal CDF
///
/// Abramowitz and Stegun formula 26.2.23; absolute error below 4.5e-4.
pub fn invcdf(p: f64) -> f64 {
    fn approx(t: f64) -> f64 {
        const C: [f64; 3] = [2.515517, 0.802853, 0.010328];
        const D: [f64; 3] = [1.432788, 0.189269, 0.001308];
        t - ((C[2] * t + C[1]) * t + C[0]) / (((D[2] * t + D[1]) * t + D[0]) * t + 1.0)
    }

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if p < 0.5 {
        -approx((-2.0 * p.ln()).sqrt())
    } else {
        approx((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::BinRange;

    fn view(from: u64, to: u64, count: u64, mean: f64, variance: f64) -> BinView {
        BinView {
            index: 0,
            range: BinRange { from, to },
            count,
            mean,
            variance,
        }
    }

    #[test]
    fn test_invcdf_known_points() {
        assert!(invcdf(0.5).abs() < 1e-3);
        assert!((invcdf(0.8413) - 1.0).abs() < 1e-3);
        assert!((invcdf(0.02275) + 2.0).abs() < 1e-3);
        assert!((invcdf(0.975) - 1.96).abs() < 1e-3);
    }

    #[test]
    fn test_invcdf_edges() {
        assert_eq!(invcdf(0.0), f64::NEG_INFINITY);
        assert_eq!(invcdf(1.0), f64::INFINITY);
        assert_eq!(invcdf(-0.5), f64::NEG_INFINITY);
    }

    #[test]
    fn test_invcdf_monotone() {
        let mut last = f64::NEG_INFINITY;
        for i in 1..1000 {
            let z = invcdf(i as f64 / 1000.0);
            assert!(z > last);
            last = z;
        }
    }

    #[test]
    fn test_linear_interpolation() {
        let bin = view(100, 200, 10, 150.0, 0.0);
        assert_eq!(Interpolation::Linear.interpolate(&bin, 0.0), 100.0);
        assert_eq!(Interpolation::Linear.interpolate(&bin, 1.0), 200.0);
        assert_eq!(Interpolation::Linear.interpolate(&bin, 0.5), 150.0);
    }

    #[test]
    fn test_empty_bin_midpoint() {
        let bin = view(100, 200, 0, f64::NAN, f64::NAN);
        assert_eq!(Interpolation::Linear.interpolate(&bin, 0.3), 150.0);
        assert_eq!(Interpolation::Gaussian.interpolate(&bin, 0.3), 150.0);
    }

    #[test]
    fn test_gaussian_degenerate_bin_returns_mean() {
        let bin = view(512, 1023, 1000, 1000.0, 0.0);
        for ratio in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(Interpolation::Gaussian.interpolate(&bin, ratio), 1000.0);
        }
    }

    #[test]
    fn test_gaussian_clamps_to_bin() {
        let bin = view(100, 200, 10, 150.0, 400.0);
        assert_eq!(Interpolation::Gaussian.interpolate(&bin, 0.0), 100.0);
        assert_eq!(Interpolation::Gaussian.interpolate(&bin, 1.0), 200.0);
        let mid = Interpolation::Gaussian.interpolate(&bin, 0.5);
        assert!((mid - 150.0).abs() < 0.1);
        let upper = Interpolation::Gaussian.interpolate(&bin, 0.8413);
        assert!((upper - 170.0).abs() < 0.1);
    }
}
