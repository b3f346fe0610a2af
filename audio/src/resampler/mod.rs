//! Sample rate conversion using rubato.
//!
//! Clips are resampled whole: the input is fed through an FFT-based fixed
//! in/out resampler in fixed-size chunks, the filter delay is trimmed from
//! the front and the output is cut to `round(len * to / from)` samples.
//!
//! # Example
//!
//! ```rust
//! use melodeez_audio::resampler::resample;
//!
//! let input = vec![0.0f32; 44100];
//! let output = resample(&input, 44100, 22050).unwrap();
//! assert_eq!(output.len(), 22050);
//! ```

mod rubato_impl;

pub use rubato_impl::{resample, resample_clip};
