use crate::prelude::SarComplex;
use ndarray::{Array2, ArrayView2};

pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[SarComplex]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|v| v.norm_sqr()).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Index and magnitude of the largest-magnitude sample (first wins on ties).
    pub fn argmax_magnitude(samples: &[SarComplex]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, value) in samples.iter().enumerate() {
            let magnitude = value.norm();
            match best {
                Some((_, current)) if magnitude <= current => {}
                _ => best = Some((idx, magnitude)),
            }
        }
        best
    }

    pub fn nonzero_count(samples: &[SarComplex]) -> usize {
        samples
            .iter()
            .filter(|v| v.re != 0.0 || v.im != 0.0)
            .count()
    }

    /// Converts magnitudes to `scale·log10(x)`.
    ///
    /// Values below the smallest positive normal `f64` are clamped to it first.
    /// With a positive `dynamic_range` everything below `max − dynamic_range` is
    /// raised to that floor; `normalize` shifts the result so the peak is 0 dB.
    pub fn to_db(
        magnitude: ArrayView2<f64>,
        scale: f64,
        dynamic_range: f64,
        normalize: bool,
    ) -> Array2<f64> {
        let mut out = magnitude.mapv(|x| scale * x.max(f64::MIN_POSITIVE).log10());
        let max_v = out.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if dynamic_range > 0.0 {
            let floor = max_v - dynamic_range;
            out.mapv_inplace(|v| if v < floor { floor } else { v });
        }
        if normalize {
            out.mapv_inplace(|v| v - max_v);
        }
        out
    }
}
