//! Deterministic melody rendering.
//!
//! Used to produce reference tracks and noisy queries for demos and tests
//! without shipping audio files.
//!
//! ```rust
//! use melodeez_audio::synth::Melody;
//! use std::time::Duration;
//!
//! let melody = Melody::by_id("twinkle_star").unwrap();
//! let clip = melody.render(22050, Duration::from_secs(6));
//! assert_eq!(clip.len(), 6 * 22050);
//! ```

mod melodies;
mod notes;

pub use melodies::*;
pub use notes::*;

use std::f64::consts::PI;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clip::AudioClip;

// Approximate sum of harmonic amplitudes, leaving some headroom.
const HARMONIC_NORMALIZATION: f64 = 2.5;

// (ratio, amplitude, decay rate)
const HARMONICS: [(f64, f64, f64); 8] = [
    (1.0, 1.0, 1.0),
    (2.0, 0.7, 1.2),
    (3.0, 0.45, 1.5),
    (4.0, 0.3, 1.8),
    (5.0, 0.2, 2.2),
    (6.0, 0.12, 2.6),
    (7.0, 0.08, 3.0),
    (8.0, 0.05, 3.5),
];

/// A single-voice melody.
#[derive(Debug)]
pub struct Melody {
    pub id: &'static str,
    pub title: &'static str,
    pub artist: &'static str,
    pub bpm: u32,
    pub notes: &'static [Note],
}

impl Melody {
    /// Finds a built-in melody by id.
    pub fn by_id(id: &str) -> Option<&'static Melody> {
        MELODIES.iter().copied().find(|m| m.id == id)
    }

    /// Ids of all built-in melodies.
    pub fn ids() -> Vec<&'static str> {
        MELODIES.iter().map(|m| m.id).collect()
    }

    /// Length of one pass through the melody.
    pub fn duration(&self) -> Duration {
        let beats: f64 = self.notes.iter().map(|n| n.beats).sum();
        Duration::from_secs_f64(beats * 60.0 / self.bpm as f64)
    }

    /// Renders exactly `length` of audio, looping the melody as needed.
    pub fn render(&self, sample_rate: u32, length: Duration) -> AudioClip {
        let total = (length.as_secs_f64() * sample_rate as f64).round() as usize;
        let beat_secs = 60.0 / self.bpm as f64;

        let mut pass = Vec::new();
        for note in self.notes {
            let len = (note.beats * beat_secs * sample_rate as f64).round() as usize;
            pass.extend(render_note(note.freq, len, sample_rate, 0.8));
        }

        let samples = if pass.is_empty() {
            vec![0.0; total]
        } else {
            pass.iter().copied().cycle().take(total).collect()
        };
        AudioClip::new(samples, sample_rate)
    }
}

/// Renders a piano-like note with decaying harmonics and an envelope.
/// A [`REST`] renders silence.
pub fn render_note(freq: f64, samples: usize, sample_rate: u32, volume: f64) -> Vec<f32> {
    if freq == REST || samples == 0 {
        return vec![0.0; samples];
    }

    let inharmonicity = 0.0001 * (freq / 440.0) * (freq / 440.0);
    let note_duration = samples as f64 / sample_rate as f64;
    let nyquist = sample_rate as f64 / 2.0;

    (0..samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let progress = t / note_duration;

            let mut sample = 0.0;
            for &(ratio, amplitude, decay) in &HARMONICS {
                let actual_ratio = ratio * (1.0 + inharmonicity * ratio * ratio).sqrt();
                let f = freq * actual_ratio;
                if f >= nyquist {
                    break;
                }
                sample += amplitude * (-progress * decay * 3.0).exp() * (2.0 * PI * f * t).sin();
            }
            sample /= HARMONIC_NORMALIZATION;

            let env = envelope(i, samples, sample_rate, note_duration);
            (sample * volume * env).clamp(-1.0, 1.0) as f32
        })
        .collect()
}

fn envelope(i: usize, samples: usize, sample_rate: u32, note_duration: f64) -> f64 {
    let t = i as f64 / sample_rate as f64;
    let progress = i as f64 / samples as f64;
    let attack_time = 0.003;
    let decay_rate = (2.0 / note_duration).clamp(0.5, 8.0);
    let release_start = 0.85;

    if t < attack_time {
        1.0 - (-5.0 * t / attack_time).exp()
    } else if progress < release_start {
        (-(t - attack_time) * decay_rate).exp() * 0.95 + 0.05
    } else {
        let release = (progress - release_start) / (1.0 - release_start);
        let base = (-(t - attack_time) * decay_rate).exp() * 0.95 + 0.05;
        base * (1.0 - release * release)
    }
}

/// Renders a pure sine tone.
pub fn sine(freq: f64, length: Duration, sample_rate: u32, amplitude: f32) -> AudioClip {
    let total = (length.as_secs_f64() * sample_rate as f64).round() as usize;
    let samples = (0..total)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (2.0 * PI * freq * t).sin() as f32 * amplitude
        })
        .collect();
    AudioClip::new(samples, sample_rate)
}

/// Returns a copy of `clip` with uniform white noise of the given peak
/// amplitude mixed in. The same seed always yields the same noise.
pub fn with_noise(clip: &AudioClip, amplitude: f32, seed: u64) -> AudioClip {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples = clip
        .samples()
        .iter()
        .map(|&s| {
            let noise = if amplitude > 0.0 {
                rng.gen_range(-amplitude..amplitude)
            } else {
                0.0
            };
            (s + noise).clamp(-1.0, 1.0)
        })
        .collect();
    AudioClip::new(samples, clip.sample_rate())
}
