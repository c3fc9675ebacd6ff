use crate::prelude::SarComplex;
use rustfft::num_traits::Zero;

/// Natural cubic spline interpolator over `n` uniformly spaced knots from
/// `x_first` to `x_last`.
///
/// The tridiagonal system for the knot second derivatives depends only on the
/// grid length, so its forward-elimination factors are computed once and reused
/// for every row that shares the grid.
///
/// End conditions are natural (zero curvature at both ends), not not-a-knot,
/// so values in the first and last two intervals differ slightly from a
/// not-a-knot cubic through the same samples.
#[derive(Debug, Clone)]
pub struct UniformCubicSpline {
    x_first: f64,
    x_last: f64,
    dx: f64,
    n: usize,
    /// Reciprocal of the modified diagonal from the Thomas elimination. The
    /// off-diagonals are all one, so this is also the modified super-diagonal.
    inv_diag: Vec<f64>,
}

impl UniformCubicSpline {
    /// Knots are `x_first + i·(x_last - x_first)/(n - 1)`. The end points are
    /// kept exactly as given, so `x_last` itself is always inside the support.
    pub fn new(x_first: f64, x_last: f64, n: usize) -> Self {
        let dx = if n > 1 {
            (x_last - x_first) / (n - 1) as f64
        } else {
            1.0
        };
        // Interior equations: M[i-1] + 4 M[i] + M[i+1] = 6 (y[i-1] - 2 y[i] + y[i+1]) / dx²
        let interior = n.saturating_sub(2);
        let mut inv_diag: Vec<f64> = Vec::with_capacity(interior);
        for i in 0..interior {
            let diag = if i == 0 { 4.0 } else { 4.0 - inv_diag[i - 1] };
            inv_diag.push(1.0 / diag);
        }
        Self {
            x_first,
            x_last,
            dx,
            n,
            inv_diag,
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Second derivatives at each knot for the samples `y` (natural end conditions).
    pub fn second_derivatives(&self, y: &[SarComplex]) -> Vec<SarComplex> {
        debug_assert_eq!(y.len(), self.n);
        let mut m = vec![SarComplex::zero(); self.n];
        let interior = self.inv_diag.len();
        if interior == 0 {
            return m;
        }

        let scale = 6.0 / (self.dx * self.dx);
        let mut d_prime = vec![SarComplex::zero(); interior];
        for i in 0..interior {
            let rhs = (y[i] - y[i + 1] * 2.0 + y[i + 2]) * scale;
            d_prime[i] = if i == 0 {
                rhs * self.inv_diag[0]
            } else {
                (rhs - d_prime[i - 1]) * self.inv_diag[i]
            };
        }
        m[interior] = d_prime[interior - 1];
        for i in (0..interior - 1).rev() {
            m[i + 1] = d_prime[i] - m[i + 2] * self.inv_diag[i];
        }
        m
    }

    /// Evaluates the spline at every point of `xi`, writing zero outside the grid.
    pub fn evaluate_into(&self, y: &[SarComplex], xi: &[f64], out: &mut [SarComplex]) {
        debug_assert_eq!(xi.len(), out.len());
        if self.n == 0 {
            out.iter_mut().for_each(|v| *v = SarComplex::zero());
            return;
        }
        let m = self.second_derivatives(y);
        let h2 = self.dx * self.dx / 6.0;

        for (value, &x) in out.iter_mut().zip(xi.iter()) {
            if !(x >= self.x_first && x <= self.x_last) {
                *value = SarComplex::zero();
                continue;
            }
            if self.n == 1 {
                *value = y[0];
                continue;
            }
            let pos = ((x - self.x_first) / self.dx).min((self.n - 1) as f64);
            let k = (pos.floor() as usize).min(self.n - 2);
            let b = pos - k as f64;
            let a = 1.0 - b;
            *value = y[k] * a
                + y[k + 1] * b
                + (m[k] * (a * a * a - a) + m[k + 1] * (b * b * b - b)) * h2;
        }
    }
}
