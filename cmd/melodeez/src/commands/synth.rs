use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::Args;
use melodeez_audio::synth::{self, Melody};
use melodeez_audio::wav;

use super::print_success;
use crate::Cli;

/// Render a built-in melody to a WAV file.
///
/// Useful for making a small reference catalog and noisy queries
/// against it without any real recordings.
#[derive(Args)]
pub struct SynthCommand {
    /// Melody id (run with an unknown id to list them)
    #[arg(long)]
    song: String,
    /// Length in seconds; the melody loops to fill it
    #[arg(long, default_value_t = 15.0)]
    seconds: f64,
    /// Output WAV path
    #[arg(long)]
    out: PathBuf,
    /// Sample rate in Hz
    #[arg(long, default_value_t = 22050)]
    rate: u32,
    /// Amplitude of added white noise
    #[arg(long, default_value_t = 0.0)]
    noise: f32,
    /// Noise seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

impl SynthCommand {
    pub fn run(&self, _cli: &Cli) -> anyhow::Result<()> {
        let melody = Melody::by_id(&self.song).with_context(|| {
            format!(
                "unknown song {:?}, available: {}",
                self.song,
                Melody::ids().join(", ")
            )
        })?;
        let length = Duration::try_from_secs_f64(self.seconds)
            .with_context(|| format!("invalid length {}", self.seconds))?;

        let mut clip = melody.render(self.rate, length);
        if self.noise > 0.0 {
            clip = synth::with_noise(&clip, self.noise, self.seed);
        }
        wav::write_clip(&self.out, &clip)?;

        print_success(&format!(
            "{} by {} ({:.1}s) written to {}",
            melody.title,
            melody.artist,
            clip.duration().as_secs_f64(),
            self.out.display()
        ));
        Ok(())
    }
}
