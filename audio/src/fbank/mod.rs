//! Log mel filterbank extraction with a fixed output shape.
//!
//! The embedding model only accepts `num_mels x num_frames` input, so every
//! clip is mapped onto exactly that shape:
//!
//! - frames past `num_frames` are dropped (long clips are truncated),
//! - missing frames are filled with the silence value `ln(energy_floor)`,
//!   i.e. zero-energy spectral frames rather than zero-amplitude samples.
//!
//! Catalog building and querying must use the same [`Config`]. A mismatch
//! does not raise an error; it only degrades match quality.
//!
//! Default parameters:
//! - SampleRate: 22050
//! - WindowSize: 2048 (Hamming)
//! - HopSize: 512
//! - FFTSize: 2048
//! - NumMels: 80
//! - NumFrames: 630 (~14.6 s)
//! - LowFreq: 20 Hz
//! - HighFreq: Nyquist
//! - PreEmphasis: 0.97

mod fft;
mod mel;

use std::fmt;

use crate::clip::AudioClip;
use crate::error::AudioError;
use crate::resampler::resample;

/// Configuration for mel filterbank extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub sample_rate: u32,
    pub window_size: usize,
    pub hop_size: usize,
    pub fft_size: usize,
    pub num_mels: usize,
    /// Fixed number of output frames.
    pub num_frames: usize,
    pub low_freq: f64,
    /// High cutoff in Hz; zero or negative means offset from Nyquist.
    pub high_freq: f64,
    pub pre_emphasis: f64,
    /// Floor applied to mel energies before the log.
    pub energy_floor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            window_size: 2048,
            hop_size: 512,
            fft_size: 2048,
            num_mels: 80,
            num_frames: 630,
            low_freq: 20.0,
            high_freq: 0.0,
            pre_emphasis: 0.97,
            energy_floor: 1e-10,
        }
    }
}

impl Config {
    /// Output shape produced by this configuration.
    pub fn shape(&self) -> FeatureShape {
        FeatureShape {
            num_mels: self.num_mels,
            num_frames: self.num_frames,
        }
    }

    /// Value of a zero-energy frame, used for padding.
    pub fn silence_value(&self) -> f32 {
        self.energy_floor.ln() as f32
    }

    fn resolved_high_freq(&self) -> f64 {
        if self.high_freq <= 0.0 {
            self.sample_rate as f64 / 2.0 + self.high_freq
        } else {
            self.high_freq
        }
    }

    /// Checks that the parameters describe a usable filterbank.
    pub fn validate(&self) -> Result<(), AudioError> {
        let invalid = |msg: String| Err(AudioError::InvalidConfig(msg));
        if self.sample_rate == 0 {
            return invalid("sample_rate must be positive".into());
        }
        if self.window_size == 0 || self.hop_size == 0 {
            return invalid("window_size and hop_size must be positive".into());
        }
        if !self.fft_size.is_power_of_two() || self.fft_size < self.window_size {
            return invalid(format!(
                "fft_size {} must be a power of two >= window_size {}",
                self.fft_size, self.window_size
            ));
        }
        if self.num_mels == 0 || self.num_frames == 0 {
            return invalid("num_mels and num_frames must be positive".into());
        }
        let high = self.resolved_high_freq();
        if self.low_freq < 0.0 || high <= self.low_freq || high > self.sample_rate as f64 / 2.0 {
            return invalid(format!(
                "frequency range {}..{} Hz is invalid for {} Hz audio",
                self.low_freq, high, self.sample_rate
            ));
        }
        if !(self.energy_floor > 0.0) {
            return invalid("energy_floor must be positive".into());
        }
        Ok(())
    }
}

/// Shape of a feature tensor: mel bins x time frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureShape {
    pub num_mels: usize,
    pub num_frames: usize,
}

impl FeatureShape {
    pub fn len(&self) -> usize {
        self.num_mels * self.num_frames
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for FeatureShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.num_mels, self.num_frames)
    }
}

/// Fixed-shape log mel spectrogram of one clip.
///
/// Data is frame-major: frame `t` occupies `data[t * num_mels..(t + 1) * num_mels]`.
/// The first `valid_frames` frames carry signal; the rest are padding.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTensor {
    shape: FeatureShape,
    valid_frames: usize,
    data: Vec<f32>,
}

impl FeatureTensor {
    /// Assembles a tensor from raw parts, checking the data length.
    pub fn from_parts(
        shape: FeatureShape,
        valid_frames: usize,
        data: Vec<f32>,
    ) -> Result<Self, AudioError> {
        if data.len() != shape.len() {
            return Err(AudioError::InvalidConfig(format!(
                "feature data has {} values, shape {shape} needs {}",
                data.len(),
                shape.len()
            )));
        }
        if valid_frames > shape.num_frames {
            return Err(AudioError::InvalidConfig(format!(
                "valid_frames {valid_frames} exceeds {} frames",
                shape.num_frames
            )));
        }
        Ok(Self {
            shape,
            valid_frames,
            data,
        })
    }

    pub fn shape(&self) -> FeatureShape {
        self.shape
    }

    /// Number of leading frames computed from audio (the rest is padding).
    pub fn valid_frames(&self) -> usize {
        self.valid_frames
    }

    /// Returns the mel energies of frame `t`.
    pub fn frame(&self, t: usize) -> &[f32] {
        let m = self.shape.num_mels;
        &self.data[t * m..(t + 1) * m]
    }

    /// Iterates over all frames, padding included.
    pub fn frames(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.shape.num_mels)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_parts(self) -> (FeatureShape, usize, Vec<f32>) {
        (self.shape, self.valid_frames, self.data)
    }
}

/// Mel filterbank feature extractor.
///
/// Holds the precomputed window and filterbank; a single extractor can be
/// shared by any number of threads.
pub struct FeatureExtractor {
    cfg: Config,
    window: Vec<f64>,
    mel_bank: Vec<mel::MelFilter>,
    fft: fft::FftPlan,
}

impl FeatureExtractor {
    /// Creates a new extractor with the given config.
    pub fn new(cfg: Config) -> Result<Self, AudioError> {
        cfg.validate()?;
        let window = mel::hamming_window(cfg.window_size);
        let mel_bank = mel::mel_filter_bank(
            cfg.num_mels,
            cfg.fft_size,
            cfg.sample_rate,
            cfg.low_freq,
            cfg.resolved_high_freq(),
        );
        let fft = fft::FftPlan::new(cfg.fft_size);
        Ok(Self {
            cfg,
            window,
            mel_bank,
            fft,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn shape(&self) -> FeatureShape {
        self.cfg.shape()
    }

    /// Extracts the fixed-shape feature tensor of a clip.
    ///
    /// The clip is resampled to the configured rate first. Fails with
    /// [`AudioError::Empty`] for a zero-length clip and
    /// [`AudioError::Decode`] for non-finite samples or a zero sample rate.
    pub fn extract(&self, clip: &AudioClip) -> Result<FeatureTensor, AudioError> {
        if clip.is_empty() {
            return Err(AudioError::Empty);
        }
        if clip.samples().iter().any(|s| !s.is_finite()) {
            return Err(AudioError::Decode("non-finite sample".into()));
        }
        if clip.sample_rate() == 0 {
            return Err(AudioError::Decode("unknown sample rate".into()));
        }
        if clip.sample_rate() == self.cfg.sample_rate {
            return Ok(self.extract_samples(clip.samples()));
        }
        let samples = resample(clip.samples(), clip.sample_rate(), self.cfg.sample_rate)?;
        if samples.is_empty() {
            return Err(AudioError::Empty);
        }
        Ok(self.extract_samples(&samples))
    }

    /// Extracts features from samples already at the configured rate.
    ///
    /// Input shorter than one window is zero-padded to one frame.
    pub fn extract_samples(&self, pcm: &[f32]) -> FeatureTensor {
        let cfg = &self.cfg;
        let shape = cfg.shape();

        let padded;
        let pcm = if pcm.len() < cfg.window_size {
            padded = {
                let mut v = pcm.to_vec();
                v.resize(cfg.window_size, 0.0);
                v
            };
            &padded[..]
        } else {
            pcm
        };

        let available = (pcm.len() - cfg.window_size) / cfg.hop_size + 1;
        let valid_frames = available.min(cfg.num_frames);

        let nfft = cfg.fft_size;
        let half_fft = nfft / 2 + 1;
        let mut data = Vec::with_capacity(shape.len());
        let mut real = vec![0.0f64; nfft];
        let mut imag = vec![0.0f64; nfft];
        let mut power = vec![0.0f64; half_fft];

        for t in 0..valid_frames {
            let start = t * cfg.hop_size;

            // Pre-emphasis + windowing, zero-padded to the FFT size.
            for i in 0..cfg.window_size {
                let mut s = pcm[start + i] as f64;
                if start + i > 0 {
                    s -= cfg.pre_emphasis * pcm[start + i - 1] as f64;
                }
                real[i] = s * self.window[i];
            }
            real[cfg.window_size..].iter_mut().for_each(|v| *v = 0.0);
            imag.iter_mut().for_each(|v| *v = 0.0);

            self.fft.process(&mut real, &mut imag);
            self.fft.power_spectrum(&real, &imag, &mut power);

            for filter in &self.mel_bank {
                let energy = filter.apply(&power).max(cfg.energy_floor);
                data.push(energy.ln() as f32);
            }
        }

        data.resize(shape.len(), cfg.silence_value());

        FeatureTensor {
            shape,
            valid_frames,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn small_config() -> Config {
        Config {
            sample_rate: 8000,
            window_size: 256,
            hop_size: 128,
            fft_size: 256,
            num_mels: 20,
            num_frames: 50,
            ..Config::default()
        }
    }

    fn tone(freq: f64, n: usize, rate: u32) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / rate as f64).sin() as f32 * 0.5)
            .collect()
    }

    #[test]
    fn default_shape_matches_model_input() {
        let cfg = Config::default();
        assert_eq!(cfg.shape(), FeatureShape { num_mels: 80, num_frames: 630 });
        assert!(cfg.validate().is_ok());
        assert!((cfg.silence_value() - (1e-10f64).ln() as f32).abs() < 1e-6);
    }

    #[test]
    fn invalid_configs_rejected() {
        let bad_fft = Config { fft_size: 300, ..small_config() };
        assert!(FeatureExtractor::new(bad_fft).is_err());

        let bad_range = Config { low_freq: 5000.0, ..small_config() };
        assert!(FeatureExtractor::new(bad_range).is_err());

        let no_frames = Config { num_frames: 0, ..small_config() };
        assert!(FeatureExtractor::new(no_frames).is_err());
    }

    #[test]
    fn short_clip_is_padded_with_silence() {
        let cfg = small_config();
        let ex = FeatureExtractor::new(cfg.clone()).unwrap();
        // 10 frames worth of audio: (256 + 9 * 128) samples.
        let pcm = tone(440.0, 256 + 9 * 128, 8000);

        let features = ex.extract_samples(&pcm);
        assert_eq!(features.shape(), cfg.shape());
        assert_eq!(features.valid_frames(), 10);
        for t in 10..cfg.num_frames {
            assert!(features.frame(t).iter().all(|&v| v == cfg.silence_value()));
        }
        assert!(features.frame(0).iter().any(|&v| v > cfg.silence_value()));
    }

    #[test]
    fn long_clip_is_truncated() {
        let cfg = small_config();
        let ex = FeatureExtractor::new(cfg.clone()).unwrap();
        let pcm = tone(440.0, 8000 * 5, 8000);

        let features = ex.extract_samples(&pcm);
        assert_eq!(features.valid_frames(), cfg.num_frames);
        assert_eq!(features.as_slice().len(), cfg.shape().len());

        // Truncation keeps the leading frames unchanged.
        let prefix = ex.extract_samples(&pcm[..256 + 49 * 128]);
        assert_eq!(prefix.as_slice(), features.as_slice());
    }

    #[test]
    fn sub_window_clip_yields_one_frame() {
        let ex = FeatureExtractor::new(small_config()).unwrap();
        let features = ex.extract_samples(&tone(440.0, 100, 8000));
        assert_eq!(features.valid_frames(), 1);
    }

    #[test]
    fn empty_clip_is_an_error() {
        let ex = FeatureExtractor::new(small_config()).unwrap();
        let err = ex.extract(&AudioClip::new(Vec::new(), 8000)).unwrap_err();
        assert!(matches!(err, AudioError::Empty));
    }

    #[test]
    fn non_finite_samples_rejected() {
        let ex = FeatureExtractor::new(small_config()).unwrap();
        let clip = AudioClip::new(vec![0.0, f32::NAN, 0.0], 8000);
        assert!(matches!(ex.extract(&clip), Err(AudioError::Decode(_))));
    }

    #[test]
    fn zero_sample_rate_is_a_decode_error() {
        let ex = FeatureExtractor::new(small_config()).unwrap();
        let clip = AudioClip::new(vec![0.1; 4000], 0);
        assert!(matches!(ex.extract(&clip), Err(AudioError::Decode(_))));
    }

    #[test]
    fn extract_resamples_to_config_rate() {
        let cfg = small_config();
        let ex = FeatureExtractor::new(cfg.clone()).unwrap();
        let clip = AudioClip::new(tone(440.0, 16000, 16000), 16000);

        let features = ex.extract(&clip).unwrap();
        assert_eq!(features.shape(), cfg.shape());
        // One second at 8 kHz: (8000 - 256) / 128 + 1 = 61 frames, capped at 50.
        assert_eq!(features.valid_frames(), 50);
    }

    #[test]
    fn tone_energy_lands_in_matching_band() {
        let cfg = small_config();
        let ex = FeatureExtractor::new(cfg).unwrap();
        let low = ex.extract_samples(&tone(300.0, 8000, 8000));
        let high = ex.extract_samples(&tone(2500.0, 8000, 8000));

        let argmax = |frame: &[f32]| {
            (0..frame.len())
                .max_by(|&a, &b| frame[a].total_cmp(&frame[b]))
                .unwrap()
        };
        assert!(argmax(low.frame(5)) < argmax(high.frame(5)));
    }

    #[test]
    fn extraction_is_deterministic() {
        let ex = FeatureExtractor::new(small_config()).unwrap();
        let pcm = tone(660.0, 4000, 8000);
        assert_eq!(ex.extract_samples(&pcm), ex.extract_samples(&pcm));
    }

    #[test]
    fn from_parts_checks_length() {
        let shape = FeatureShape { num_mels: 2, num_frames: 3 };
        assert!(FeatureTensor::from_parts(shape, 3, vec![0.0; 6]).is_ok());
        assert!(FeatureTensor::from_parts(shape, 3, vec![0.0; 5]).is_err());
        assert!(FeatureTensor::from_parts(shape, 4, vec![0.0; 6]).is_err());
    }
}
