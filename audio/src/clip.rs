use std::time::Duration;

use crate::error::AudioError;

/// A mono PCM clip with samples normalized to `[-1, 1]`.
///
/// Multi-channel sources are downmixed on construction, so a clip is always
/// single-channel. Clips are never modified in place; operations such as
/// [`AudioClip::truncated`] return a new clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    /// Creates a clip from mono samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Creates a mono clip from interleaved multi-channel samples by
    /// averaging each frame. A trailing partial frame is dropped.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Self {
        if channels <= 1 {
            return Self::new(interleaved.to_vec(), sample_rate);
        }
        let samples = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        Self::new(samples, sample_rate)
    }

    /// Creates a clip from signed 16-bit samples.
    pub fn from_i16(samples: &[i16], sample_rate: u32) -> Self {
        Self::new(
            samples.iter().map(|&s| s as f32 / 32768.0).collect(),
            sample_rate,
        )
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Always 1: clips are downmixed on construction.
    pub fn channels(&self) -> u16 {
        1
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the playback duration of the clip.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Returns a copy limited to at most `max` of audio.
    pub fn truncated(&self, max: Duration) -> Self {
        let max_samples = (max.as_secs_f64() * self.sample_rate as f64) as usize;
        let n = self.samples.len().min(max_samples);
        Self::new(self.samples[..n].to_vec(), self.sample_rate)
    }

    /// Consumes the clip and returns its samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Accepted duration range for query audio.
///
/// The default range (5 to 60 seconds) matches what the recording and
/// upload front end accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipBounds {
    pub min: Duration,
    pub max: Duration,
}

impl Default for ClipBounds {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(5),
            max: Duration::from_secs(60),
        }
    }
}

impl ClipBounds {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, duration: Duration) -> bool {
        duration >= self.min && duration <= self.max
    }

    /// Returns [`AudioError::DurationOutOfBounds`] when `duration` falls
    /// outside the range.
    pub fn check(&self, duration: Duration) -> Result<(), AudioError> {
        if self.contains(duration) {
            Ok(())
        } else {
            Err(AudioError::DurationOutOfBounds {
                got: duration,
                min: self.min,
                max: self.max,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let clip = AudioClip::from_interleaved(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, 8000);
        assert_eq!(clip.samples(), &[0.5, 0.5, 0.0]);
        assert_eq!(clip.channels(), 1);
    }

    #[test]
    fn downmix_drops_partial_frame() {
        let clip = AudioClip::from_interleaved(&[1.0, 1.0, 1.0], 2, 8000);
        assert_eq!(clip.len(), 1);
    }

    #[test]
    fn from_i16_normalizes() {
        let clip = AudioClip::from_i16(&[0, 16384, -32768], 8000);
        assert_eq!(clip.samples(), &[0.0, 0.5, -1.0]);
    }

    #[test]
    fn duration_and_truncation() {
        let clip = AudioClip::new(vec![0.0; 16000], 8000);
        assert_eq!(clip.duration(), Duration::from_secs(2));

        let short = clip.truncated(Duration::from_millis(500));
        assert_eq!(short.len(), 4000);
        assert_eq!(clip.len(), 16000, "original clip is untouched");

        let same = clip.truncated(Duration::from_secs(10));
        assert_eq!(same.len(), 16000);
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        assert_eq!(AudioClip::new(vec![0.0; 10], 0).duration(), Duration::ZERO);
    }

    #[test]
    fn bounds_check() {
        let bounds = ClipBounds::default();
        assert!(bounds.check(Duration::from_secs(5)).is_ok());
        assert!(bounds.check(Duration::from_secs(60)).is_ok());
        assert!(matches!(
            bounds.check(Duration::from_secs(4)),
            Err(AudioError::DurationOutOfBounds { .. })
        ));
        assert!(bounds.check(Duration::from_secs(61)).is_err());
    }
}
