//! 16-bit PCM WAV output.

use std::path::Path;

use crate::clip::AudioClip;
use crate::error::AudioError;

/// Writes a clip as mono 16-bit PCM WAV.
pub fn write_clip(path: &Path, clip: &AudioClip) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| AudioError::Encode(e.to_string()))?;
    for &s in clip.samples() {
        let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        writer
            .write_sample(v)
            .map_err(|e| AudioError::Encode(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| AudioError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_file;

    #[test]
    fn written_clip_decodes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let clip = AudioClip::new(vec![0.0, 0.5, -0.5, 0.25], 11025);

        write_clip(&path, &clip).unwrap();
        let back = decode_file(&path).unwrap();
        assert_eq!(back.sample_rate(), 11025);
        assert_eq!(back.len(), 4);
        for (a, b) in clip.samples().iter().zip(back.samples()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn unwritable_path_fails() {
        let clip = AudioClip::new(vec![0.0; 4], 8000);
        let err = write_clip(Path::new("/nonexistent/dir/out.wav"), &clip).unwrap_err();
        assert!(matches!(err, AudioError::Encode(_)));
    }
}
