/// Maps a distance to a confidence score in `[0, 100]`.
///
/// `confidence = clamp((1 - distance / max_distance) * 100, 0, 100)`.
///
/// The score decreases monotonically with distance and is clamped at both
/// ends. It is a rescaled distance, not a probability. Non-finite distances
/// score 0.
pub fn confidence(distance: f64, max_distance: f64) -> f64 {
    if !distance.is_finite() {
        return 0.0;
    }
    ((1.0 - distance / max_distance) * 100.0).clamp(0.0, 100.0)
}

/// Formats a confidence with one decimal, e.g. `"92.9%"`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{confidence:.1}%")
}
