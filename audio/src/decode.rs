//! Container/codec decoding into mono [`AudioClip`]s.
//!
//! Anything Symphonia can probe is accepted (WAV, MP3, M4A/AAC, FLAC, Ogg
//! Vorbis). Interleaved output is downmixed to mono by averaging channels.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

use crate::clip::AudioClip;
use crate::error::AudioError;

/// Decodes an audio file into a mono clip at its native sample rate.
///
/// The file extension, if any, is passed to the format probe as a hint.
pub fn decode_file(path: &Path) -> Result<AudioClip, AudioError> {
    let file = File::open(path)?;
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    decode_stream(mss, &hint)
}

/// Decodes an in-memory audio file. `extension` is an optional format hint
/// such as `"mp3"`.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<AudioClip, AudioError> {
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    decode_stream(mss, &hint)
}

fn decode_stream(mss: MediaSourceStream, hint: &Hint) -> Result<AudioClip, AudioError> {
    let probed = symphonia::default::get_probe()
        .format(
            hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("probe: {e}")))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioError::Decode("no default track".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("unknown sample rate".into()))?;
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(format!("codec: {e}")))?;

    let mut interleaved: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Decode(format!("read packet: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("audio: skipping corrupt packet: {e}");
            }
            Err(e) => return Err(AudioError::Decode(format!("decode packet: {e}"))),
        }
    }

    if interleaved.is_empty() {
        return Err(AudioError::Empty);
    }
    if interleaved.iter().any(|s| !s.is_finite()) {
        return Err(AudioError::Decode("non-finite sample".into()));
    }

    Ok(AudioClip::from_interleaved(&interleaved, channels, sample_rate))
}
