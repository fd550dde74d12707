//! Command-line argument parsing for the `tessera` baker.

use std::path::PathBuf;

use clap::Parser;

use crate::{ConfigFile, ViewMode};

/// Tessera world baker command-line arguments.
///
/// CLI values override settings loaded from the config file.
#[derive(Parser, Debug)]
#[command(name = "tessera", about = "Bake a procedural world into deduplicated tiles")]
pub struct CliArgs {
    /// Path to the JSON config file.
    #[arg(long)]
    pub config: PathBuf,

    /// Output directory (overrides `bake.output_dir`).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Worker thread count.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Bake only these view modes (repeatable).
    #[arg(long = "view-mode")]
    pub view_modes: Vec<ViewMode>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Re-decode a sample of baked tiles and compare them against a fresh computation.
    #[arg(long)]
    pub verify: bool,
}

impl ConfigFile {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref dir) = args.output {
            self.bake.output_dir = Some(dir.clone());
        }
        if let Some(workers) = args.workers {
            self.bake.workers = Some(workers);
        }
        if !args.view_modes.is_empty() {
            self.bake.view_modes = args.view_modes.clone();
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }
}
