//! Note frequencies and durations.

// Octave 3
pub const C3: f64 = 131.0;
pub const D3: f64 = 147.0;
pub const E3: f64 = 165.0;
pub const F3: f64 = 175.0;
pub const G3: f64 = 196.0;
pub const A3: f64 = 220.0;
pub const B3: f64 = 247.0;

// Octave 4
pub const C4: f64 = 262.0;
pub const D4: f64 = 294.0;
pub const E4: f64 = 330.0;
pub const F4: f64 = 349.0;
pub const FS4: f64 = 370.0;
pub const G4: f64 = 392.0;
pub const A4: f64 = 440.0;
pub const BB4: f64 = 466.0;
pub const B4: f64 = 494.0;

// Octave 5
pub const C5: f64 = 523.0;
pub const D5: f64 = 587.0;
pub const E5: f64 = 659.0;

pub const REST: f64 = 0.0;

// Beats, quarter note = 1
pub const WHOLE: f64 = 4.0;
pub const HALF: f64 = 2.0;
pub const QUARTER: f64 = 1.0;
pub const EIGHTH: f64 = 0.5;
pub const DOT_QUARTER: f64 = 1.5;

/// A pitched note (or rest) with a length in beats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub freq: f64,
    pub beats: f64,
}

impl Note {
    pub fn is_rest(&self) -> bool {
        self.freq == REST
    }
}

/// Shorthand constructor used by the melody tables.
pub const fn n(freq: f64, beats: f64) -> Note {
    Note { freq, beats }
}
