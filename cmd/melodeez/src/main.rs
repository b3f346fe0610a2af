//! melodeez - identify songs from short, noisy audio clips.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{
    BuildCommand, ConfigCommand, InitModelCommand, InspectCommand, SearchCommand, SynthCommand,
};

/// melodeez - identify songs from short, noisy audio clips.
///
/// Typical flow:
///   1. `melodeez init-model --out model.json`
///   2. `melodeez build --tracks ./songs --model model.json --out catalog.json`
///   3. `melodeez search clip.wav --model model.json --catalog catalog.json`
///
/// Defaults for every path and tunable are read from ~/.melodeez/config.yaml.
#[derive(Parser)]
#[command(name = "melodeez")]
#[command(about = "Identify songs from short, noisy audio clips")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.melodeez/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config(ConfigCommand),
    /// Write an untrained model checkpoint
    #[command(name = "init-model")]
    InitModel(InitModelCommand),
    /// Build a catalog from reference tracks
    Build(BuildCommand),
    /// Identify the song in an audio clip
    Search(SearchCommand),
    /// Show the contents of a catalog
    Inspect(InspectCommand),
    /// Render a built-in melody to WAV
    Synth(SynthCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli),
        Commands::InitModel(cmd) => cmd.run(&cli),
        Commands::Build(cmd) => cmd.run(&cli),
        Commands::Search(cmd) => cmd.run(&cli),
        Commands::Inspect(cmd) => cmd.run(&cli),
        Commands::Synth(cmd) => cmd.run(&cli),
    }
}
