//! Fixed-size radix-2 FFT plan.
//!
//! The extractor transforms hundreds of frames of the same length per clip,
//! so the bit-reversal permutation and twiddle factors are computed once.

use std::f64::consts::PI;

/// Precomputed tables for a power-of-two FFT of one length.
#[derive(Debug, Clone)]
pub struct FftPlan {
    n: usize,
    swaps: Vec<(usize, usize)>,
    twiddles: Vec<(f64, f64)>,
}

impl FftPlan {
    /// Builds a plan for length `n`. `n` must be a power of two.
    pub fn new(n: usize) -> Self {
        debug_assert!(n.is_power_of_two(), "fft length {n} is not a power of two");
        let bits = n.trailing_zeros();
        let swaps = (0..n)
            .filter_map(|i| {
                let j = if bits == 0 {
                    0
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                };
                (i < j).then_some((i, j))
            })
            .collect();
        let twiddles = (0..n / 2)
            .map(|k| {
                let angle = -2.0 * PI * k as f64 / n as f64;
                (angle.cos(), angle.sin())
            })
            .collect();
        Self { n, swaps, twiddles }
    }

    /// Transforms `real`/`imag` in place. Both must have the plan length.
    pub fn process(&self, real: &mut [f64], imag: &mut [f64]) {
        debug_assert_eq!(real.len(), self.n);
        debug_assert_eq!(imag.len(), self.n);
        for &(i, j) in &self.swaps {
            real.swap(i, j);
            imag.swap(i, j);
        }

        let mut size = 2;
        while size <= self.n {
            let half = size / 2;
            let stride = self.n / size;
            for start in (0..self.n).step_by(size) {
                for k in 0..half {
                    let (w_r, w_i) = self.twiddles[k * stride];
                    let (u, v) = (start + k, start + k + half);
                    let t_r = w_r * real[v] - w_i * imag[v];
                    let t_i = w_r * imag[v] + w_i * real[v];
                    real[v] = real[u] - t_r;
                    imag[v] = imag[u] - t_i;
                    real[u] += t_r;
                    imag[u] += t_i;
                }
            }
            size *= 2;
        }
    }

    /// Writes `|X[k]|^2` for `k` in `0..=n/2` into `power` after a
    /// [`FftPlan::process`] call.
    pub fn power_spectrum(&self, real: &[f64], imag: &[f64], power: &mut [f64]) {
        for (k, p) in power.iter_mut().enumerate().take(self.n / 2 + 1) {
            *p = real[k] * real[k] + imag[k] * imag[k];
        }
    }
}
