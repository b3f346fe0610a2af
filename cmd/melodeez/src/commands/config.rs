//! Configuration management commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::{get_config, print_json, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Configuration is stored in ~/.melodeez/config.yaml. Flags on each
/// command override the values here.
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Set one or more defaults
    Set {
        /// Model checkpoint
        #[arg(long)]
        model: Option<PathBuf>,
        /// Catalog path
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Scratch workspace directory
        #[arg(long)]
        workspace: Option<PathBuf>,
        /// Maximum number of matches
        #[arg(long)]
        top_k: Option<usize>,
        /// Distance at which confidence reaches 0
        #[arg(long)]
        max_distance: Option<f64>,
        /// Distance metric (euclidean or cosine)
        #[arg(long)]
        metric: Option<melodeez_search::Metric>,
        /// Shortest accepted query, in seconds
        #[arg(long)]
        min_clip_secs: Option<f64>,
        /// Longest accepted query, in seconds
        #[arg(long)]
        max_clip_secs: Option<f64>,
        /// Keep intermediate artifacts after a search
        #[arg(long)]
        keep_artifacts: Option<bool>,
    },
    /// View the current configuration
    View,
    /// Print the config file path
    Path,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Set {
                model,
                catalog,
                workspace,
                top_k,
                max_distance,
                metric,
                min_clip_secs,
                max_clip_secs,
                keep_artifacts,
            } => {
                let mut cfg = get_config(cli)?;
                if model.is_some() {
                    cfg.model = model.clone();
                }
                if catalog.is_some() {
                    cfg.catalog = catalog.clone();
                }
                if workspace.is_some() {
                    cfg.workspace = workspace.clone();
                }
                cfg.top_k = top_k.or(cfg.top_k);
                cfg.max_distance = max_distance.or(cfg.max_distance);
                cfg.metric = metric.or(cfg.metric);
                cfg.min_clip_secs = min_clip_secs.or(cfg.min_clip_secs);
                cfg.max_clip_secs = max_clip_secs.or(cfg.max_clip_secs);
                cfg.keep_artifacts = keep_artifacts.or(cfg.keep_artifacts);

                // Reject values the search would refuse later.
                cfg.clip_bounds()?;
                melodeez_search::MatchEngine::new(cfg.search_config())?;

                cfg.save()?;
                print_success(&format!("Config saved to {}", cfg.path().display()));
                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;
                if cli.json {
                    return print_json(&cfg);
                }
                let yaml = serde_yaml::to_string(&cfg)?;
                if yaml.trim() == "{}" {
                    println!("# {} (empty)", cfg.path().display());
                } else {
                    println!("# {}", cfg.path().display());
                    print!("{yaml}");
                }
                Ok(())
            }

            ConfigSubcommand::Path => {
                let cfg = get_config(cli)?;
                println!("{}", cfg.path().display());
                Ok(())
            }
        }
    }
}
