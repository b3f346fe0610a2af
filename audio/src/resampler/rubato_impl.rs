//! Rubato-based whole-buffer resampler.

use rubato::{FftFixedInOut, Resampler as RubatoResampler};

use crate::clip::AudioClip;
use crate::error::AudioError;

/// Number of input frames per processing block.
const CHUNK_FRAMES: usize = 1024;

/// Resamples mono `input` from `from_rate` to `to_rate`.
///
/// Returns the input unchanged when the rates are equal.
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::InvalidConfig(format!(
            "sample rates must be positive, got {from_rate} -> {to_rate}"
        )));
    }
    if from_rate == to_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_FRAMES, 1)
            .map_err(|e| AudioError::Resample(e.to_string()))?;

    let expected = expected_len(input.len(), from_rate, to_rate);
    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(expected + delay + CHUNK_FRAMES);
    let mut chunk: Vec<f32> = Vec::with_capacity(resampler.input_frames_max());
    let mut pos = 0;

    // Keep feeding (zero padding past the end) until the delayed output
    // covers the whole input.
    while output.len() < expected + delay {
        let needed = resampler.input_frames_next();
        chunk.clear();
        if pos < input.len() {
            let end = (pos + needed).min(input.len());
            chunk.extend_from_slice(&input[pos..end]);
            pos = end;
        }
        chunk.resize(needed, 0.0);

        let out = resampler
            .process(&[chunk.as_slice()], None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        output.extend_from_slice(&out[0]);
    }

    output.drain(..delay);
    output.truncate(expected);
    Ok(output)
}

/// Resamples a clip to `to_rate`, returning a new clip.
pub fn resample_clip(clip: &AudioClip, to_rate: u32) -> Result<AudioClip, AudioError> {
    if clip.sample_rate() == to_rate {
        return Ok(clip.clone());
    }
    let samples = resample(clip.samples(), clip.sample_rate(), to_rate)?;
    Ok(AudioClip::new(samples, to_rate))
}

fn expected_len(n: usize, from_rate: u32, to_rate: u32) -> usize {
    let num = n as u64 * to_rate as u64 + from_rate as u64 / 2;
    (num / from_rate as u64) as usize
}
