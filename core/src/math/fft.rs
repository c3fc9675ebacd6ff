use crate::prelude::SarComplex;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps a forward/inverse `rustfft` plan pair for reuse.
///
/// Plans are shared behind `Arc`, so one helper can be borrowed by many
/// rayon workers at once.
#[derive(Clone)]
pub struct FftHelper {
    size: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for FftHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftHelper").field("size", &self.size).finish()
    }
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        Self {
            size,
            forward,
            inverse,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of `input`, zero-padded (or truncated) to the plan size.
    pub fn forward(&self, input: &[SarComplex]) -> Vec<SarComplex> {
        let mut buffer = padded(input, self.size);
        self.forward_inplace(&mut buffer);
        buffer
    }

    pub fn forward_inplace(&self, buffer: &mut [SarComplex]) {
        debug_assert_eq!(buffer.len(), self.size);
        self.forward.process(buffer);
    }

    /// Inverse transform normalised by 1/N.
    pub fn inverse_inplace(&self, buffer: &mut [SarComplex]) {
        debug_assert_eq!(buffer.len(), self.size);
        self.inverse.process(buffer);
        let scale = 1.0 / self.size as f64;
        for sample in buffer.iter_mut() {
            *sample *= scale;
        }
    }
}

fn padded(input: &[SarComplex], size: usize) -> Vec<SarComplex> {
    let mut buffer = vec![SarComplex::zero(); size];
    let len = input.len().min(size);
    buffer[..len].copy_from_slice(&input[..len]);
    buffer
}

/// Smallest power of two that is at least `n` (and at least 1).
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Swaps the two halves of a spectrum so bin 0 lands in the middle.
pub fn fftshift(buffer: &mut [SarComplex]) {
    let half = buffer.len() / 2;
    buffer.rotate_right(half);
}

/// FFT sample frequencies in standard ordering (non-negative bins first), scaled by `rate / N`.
pub fn fft_frequencies(n: usize, rate: f64) -> Vec<f64> {
    let positive = (n + 1) / 2;
    (0..n)
        .map(|i| {
            let k = if i < positive {
                i as f64
            } else {
                i as f64 - n as f64
            };
            k * rate / n as f64
        })
        .collect()
}
