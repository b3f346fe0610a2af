//! Where catalog audio comes from.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use melodeez_audio::AudioClip;
use serde::Deserialize;
use tracing::warn;

use crate::error::CatalogError;
use crate::label::parse_track_label;

/// File extensions picked up by [`sources_from_dir`].
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "flac", "ogg"];

/// Audio for one catalog entry.
#[derive(Debug, Clone)]
pub enum AudioSource {
    Path(PathBuf),
    Clip(AudioClip),
}

/// One reference track to be embedded into the catalog.
#[derive(Debug, Clone)]
pub struct TrackSource {
    pub track_id: String,
    pub title: String,
    pub artist: String,
    pub audio: AudioSource,
}

impl TrackSource {
    pub fn new(
        track_id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        audio: AudioSource,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            title: title.into(),
            artist: artist.into(),
            audio,
        }
    }

    /// Builds a source whose title and artist are parsed from an
    /// `"Artist - Title"` label. The label doubles as the track id.
    pub fn from_label(label: &str, audio: AudioSource) -> Self {
        let parsed = parse_track_label(label);
        Self::new(label.trim(), parsed.title, parsed.artist, audio)
    }
}

/// Lists audio files in `dir` (non-recursive), sorted by file name.
///
/// The file stem is the track id and is parsed as the display label.
/// Stems that are not valid UTF-8 are converted lossily. Directory entries
/// that cannot be read are logged and left out.
pub fn sources_from_dir(dir: &Path) -> Result<Vec<TrackSource>, CatalogError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(e) => {
                let path = e.path();
                if path.is_file() && is_audio_file(&path) {
                    paths.push(path);
                }
            }
            Err(err) => warn!("catalog: skipping unreadable entry in {}: {err}", dir.display()),
        }
    }
    paths.sort();

    Ok(paths
        .into_iter()
        .filter_map(|path| {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                warn!("catalog: skipping {}: no file name", path.display());
                return None;
            };
            Some(TrackSource::from_label(&stem, AudioSource::Path(path)))
        })
        .collect())
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

#[derive(Deserialize)]
struct ManifestEntry {
    file: PathBuf,
    title: String,
    artist: String,
    #[serde(default)]
    track_id: Option<String>,
}

/// Reads a JSON manifest:
///
/// ```text
/// [
///   { "file": "a.wav", "title": "Song A", "artist": "Artist X" },
///   { "file": "b.mp3", "title": "Song B", "artist": "Artist Y", "track_id": "b" }
/// ]
/// ```
///
/// Relative file paths resolve against the manifest's directory. A missing
/// `track_id` defaults to the file stem.
pub fn sources_from_manifest(path: &Path) -> Result<Vec<TrackSource>, CatalogError> {
    let entries: Vec<ManifestEntry> = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    entries
        .into_iter()
        .map(|e| {
            let file = if e.file.is_absolute() {
                e.file
            } else {
                base.join(e.file)
            };
            let track_id = match e.track_id {
                Some(id) => id,
                None => file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        CatalogError::InvalidFormat(format!(
                            "manifest entry {} has no usable file name",
                            file.display()
                        ))
                    })?,
            };
            Ok(TrackSource::new(track_id, e.title, e.artist, AudioSource::Path(file)))
        })
        .collect()
}
