//! Built-in melodies.

use super::notes::*;
use super::Melody;

/// All built-in melodies.
pub static MELODIES: &[&Melody] = &[&TWINKLE_STAR, &ODE_TO_JOY, &SCALE_C_MAJOR, &MINOR_WALTZ];

pub static TWINKLE_STAR: Melody = Melody {
    id: "twinkle_star",
    title: "Twinkle Twinkle Little Star",
    artist: "Traditional",
    bpm: 100,
    notes: &[
        n(C4, QUARTER), n(C4, QUARTER), n(G4, QUARTER), n(G4, QUARTER),
        n(A4, QUARTER), n(A4, QUARTER), n(G4, HALF),
        n(F4, QUARTER), n(F4, QUARTER), n(E4, QUARTER), n(E4, QUARTER),
        n(D4, QUARTER), n(D4, QUARTER), n(C4, HALF),
        n(G4, QUARTER), n(G4, QUARTER), n(F4, QUARTER), n(F4, QUARTER),
        n(E4, QUARTER), n(E4, QUARTER), n(D4, HALF),
    ],
};

pub static ODE_TO_JOY: Melody = Melody {
    id: "ode_to_joy",
    title: "Ode to Joy",
    artist: "Ludwig van Beethoven",
    bpm: 120,
    notes: &[
        n(E4, QUARTER), n(E4, QUARTER), n(F4, QUARTER), n(G4, QUARTER),
        n(G4, QUARTER), n(F4, QUARTER), n(E4, QUARTER), n(D4, QUARTER),
        n(C4, QUARTER), n(C4, QUARTER), n(D4, QUARTER), n(E4, QUARTER),
        n(E4, DOT_QUARTER), n(D4, EIGHTH), n(D4, HALF),
    ],
};

pub static SCALE_C_MAJOR: Melody = Melody {
    id: "scale_c_major",
    title: "C Major Scale",
    artist: "Exercise",
    bpm: 140,
    notes: &[
        n(C4, QUARTER), n(D4, QUARTER), n(E4, QUARTER), n(F4, QUARTER),
        n(G4, QUARTER), n(A4, QUARTER), n(B4, QUARTER), n(C5, QUARTER),
        n(B4, QUARTER), n(A4, QUARTER), n(G4, QUARTER), n(F4, QUARTER),
        n(E4, QUARTER), n(D4, QUARTER), n(C4, HALF),
    ],
};

pub static MINOR_WALTZ: Melody = Melody {
    id: "minor_waltz",
    title: "Little Waltz in D Minor",
    artist: "Exercise",
    bpm: 150,
    notes: &[
        n(D3, QUARTER), n(A3, QUARTER), n(F4, QUARTER),
        n(E4, HALF), n(D4, QUARTER),
        n(BB4, QUARTER), n(A3, QUARTER), n(G3, QUARTER),
        n(A4, HALF), n(REST, QUARTER),
        n(D5, QUARTER), n(C5, QUARTER), n(BB4, QUARTER),
        n(A4, HALF), n(E3, QUARTER),
        n(FS4, QUARTER), n(G4, QUARTER), n(E5, QUARTER),
        n(D4, WHOLE),
    ],
};
