//! Audio front end for melody matching.
//!
//! This crate turns an audio file into the fixed-shape time-frequency
//! representation consumed by the embedding model:
//!
//! - [`decode`]: any Symphonia-supported container -> mono [`AudioClip`]
//! - [`resampler`]: band-limited sample rate conversion (rubato)
//! - [`fbank`]: log mel filterbank extraction with fixed frame count
//! - [`synth`]: deterministic melody rendering for demos and tests
//! - [`wav`]: 16-bit PCM WAV output
//!
//! # Example
//!
//! ```rust
//! use melodeez_audio::fbank::{Config, FeatureExtractor};
//! use melodeez_audio::synth;
//! use std::time::Duration;
//!
//! let cfg = Config::default();
//! let extractor = FeatureExtractor::new(cfg.clone()).unwrap();
//! let clip = synth::sine(440.0, Duration::from_secs(1), cfg.sample_rate, 0.5);
//! let features = extractor.extract(&clip).unwrap();
//! assert_eq!(features.shape(), cfg.shape());
//! ```

mod clip;
pub mod decode;
mod error;
pub mod fbank;
pub mod resampler;
pub mod synth;
pub mod wav;

pub use clip::{AudioClip, ClipBounds};
pub use error::AudioError;
pub use fbank::{FeatureExtractor, FeatureShape, FeatureTensor};
