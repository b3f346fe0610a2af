//! Mel-scale utilities and filterbank generation.

use std::f64::consts::PI;

/// Generates a Hamming window of the given length.
pub fn hamming_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Converts frequency in Hz to mel scale.
fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Converts mel scale frequency back to Hz.
fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// One triangular filter, stored as its non-zero span.
#[derive(Debug, Clone)]
pub struct MelFilter {
    start: usize,
    weights: Vec<f64>,
}

impl MelFilter {
    /// Weighted sum of the power spectrum under this filter.
    pub fn apply(&self, power: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(&power[self.start..])
            .map(|(w, p)| w * p)
            .sum()
    }

    fn from_dense(dense: &[f64]) -> Self {
        let first = dense.iter().position(|&w| w > 0.0);
        let last = dense.iter().rposition(|&w| w > 0.0);
        match (first, last) {
            (Some(start), Some(end)) => Self {
                start,
                weights: dense[start..=end].to_vec(),
            },
            _ => Self {
                start: 0,
                weights: Vec::new(),
            },
        }
    }
}

/// Creates the mel filterbank.
///
/// Returns `num_mels` filters over `fft_size / 2 + 1` power bins.
pub fn mel_filter_bank(
    num_mels: usize,
    fft_size: usize,
    sample_rate: u32,
    low_freq: f64,
    high_freq: f64,
) -> Vec<MelFilter> {
    let half_fft = fft_size / 2 + 1;
    let low_mel = hz_to_mel(low_freq);
    let high_mel = hz_to_mel(high_freq);

    // num_mels + 2 equally spaced mel points
    let step = (high_mel - low_mel) / (num_mels + 1) as f64;
    let mut bins: Vec<usize> = (0..num_mels + 2)
        .map(|i| {
            let hz = mel_to_hz(low_mel + i as f64 * step);
            let bin = (hz * fft_size as f64 / sample_rate as f64).round() as usize;
            bin.min(half_fft - 1)
        })
        .collect();

    // Every filter spans at least one bin.
    for i in 1..bins.len() {
        if bins[i] <= bins[i - 1] {
            bins[i] = bins[i - 1] + 1;
        }
    }

    let mut bank = Vec::with_capacity(num_mels);
    let mut dense = vec![0.0f64; half_fft];
    for m in 0..num_mels {
        dense.iter_mut().for_each(|w| *w = 0.0);
        let (left, center, right) = (bins[m], bins[m + 1], bins[m + 2]);

        for k in left..center.min(half_fft) {
            dense[k] = (k - left) as f64 / (center - left) as f64;
        }
        for k in center..=right.min(half_fft - 1) {
            dense[k] = (right - k) as f64 / (right - center) as f64;
        }
        bank.push(MelFilter::from_dense(&dense));
    }
    bank
}
