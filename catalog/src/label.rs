/// Artist used when a label carries no artist part.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Display metadata parsed from a track label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLabel {
    pub title: String,
    pub artist: String,
}

/// Parses an `"Artist - Title"` label.
///
/// Splits on the first `" - "`. Without the delimiter, or when either side
/// is blank, the whole trimmed label becomes the title and the artist is
/// [`UNKNOWN_ARTIST`].
pub fn parse_track_label(label: &str) -> TrackLabel {
    let label = label.trim();
    if let Some((artist, title)) = label.split_once(" - ") {
        let (artist, title) = (artist.trim(), title.trim());
        if !artist.is_empty() && !title.is_empty() {
            return TrackLabel {
                title: title.to_string(),
                artist: artist.to_string(),
            };
        }
    }
    TrackLabel {
        title: label.to_string(),
        artist: UNKNOWN_ARTIST.to_string(),
    }
}
