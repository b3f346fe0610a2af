//! CLI commands module.

mod build;
mod config;
mod inspect;
mod model;
mod search;
mod synth;
mod util;

pub use build::BuildCommand;
pub use config::ConfigCommand;
pub use inspect::InspectCommand;
pub use model::InitModelCommand;
pub use search::SearchCommand;
pub use synth::SynthCommand;

pub(crate) use util::*;
