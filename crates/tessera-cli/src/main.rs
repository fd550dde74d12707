//! `tessera`: bake a procedural world into deduplicated PNG tiles.
//!
//! Run with: `cargo run --release -p tessera-cli -- --config world.json`

use std::process::ExitCode;

use clap::Parser;
use tessera_bake::{BakeError, BakeOptions, bake_world, probe_chunks, sample_coords};
use tessera_config::{CliArgs, ConfigError, ConfigFile};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("Invalid world parameters: {0}")]
    Config(#[from] ConfigError),
    #[error("Bake failed: {0}")]
    Bake(#[from] BakeError),
    #[error("Verification failed: {0} chunk views differ from a fresh computation")]
    Verify(usize),
}

fn run(config: &ConfigFile, verify: bool) -> Result<(), RunError> {
    let settings = config.world_generation_parameters.resolve()?;
    let mut options = BakeOptions::new(config.output_dir());
    options.view_modes = config.bake.view_modes.clone();
    options.workers = config.bake.workers;

    let report = bake_world(&settings, &options)?;
    info!(
        "Baked world saved to {} ({} unique tiles)",
        report.output_dir.display(),
        report.unique_saved
    );

    if verify {
        let probe = probe_chunks(&options.output_dir, &sample_coords(&settings))?;
        if !probe.is_clean() {
            return Err(RunError::Verify(probe.mismatches.len()));
        }
        info!("Verification passed for {} chunk views", probe.checked);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let mut config = match ConfigFile::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tessera_log::init_logging(cfg!(debug_assertions), None);
            error!("Could not load {}: {e}", args.config.display());
            return ExitCode::FAILURE;
        }
    };
    config.apply_cli_overrides(&args);
    tessera_log::init_logging(cfg!(debug_assertions), Some(&config.logging));

    info!("Tessera world baker");
    info!("Loaded config from {}", args.config.display());
    info!(
        "World: {:?}x{:?} chunks | Seed: {} | Output: {}",
        config.world_generation_parameters.world_width_chunks,
        config.world_generation_parameters.world_height_chunks,
        config.world_generation_parameters.seed,
        config.output_dir().display()
    );

    match run(&config, args.verify) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
