use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
};
use clap::Parser;
use sdnet_burn::SdNetConfig;
use sdnet_demos::{
    create_device, get_backend_name, init_tracing, model_config, PresetArg, SelectedBackend,
};

/// Print an SDNet model summary.
#[derive(Parser)]
#[command(name = "print")]
struct Cli {
    /// Model preset
    #[arg(long, value_enum, default_value = "small")]
    preset: PresetArg,

    /// Number of segmentation classes
    #[arg(long, default_value_t = 21)]
    num_classes: usize,

    /// Model configuration file, overriding the preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the model configuration as JSON
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Write the freshly initialized weights
    #[arg(long)]
    save_weights: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let device = create_device();
    tracing::info!(backend = get_backend_name(), "using backend");

    let config = model_config(cli.config.as_deref(), cli.preset, cli.num_classes)?;
    let model = SdNetConfig::new(config.clone()).init::<SelectedBackend>(&device)?;

    println!("{model}");
    println!("Parameters: {}", model.num_params());

    if let Some(path) = cli.save_config {
        config
            .save(&path)
            .with_context(|| format!("Failed to save config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "saved config");
    }

    if let Some(path) = cli.save_weights {
        model
            .save_file(path.clone(), &NamedMpkFileRecorder::<FullPrecisionSettings>::new())
            .map_err(|e| anyhow::anyhow!("Failed to save weights to {}: {e:?}", path.display()))?;
        tracing::info!(path = %path.display(), "saved weights");
    }

    Ok(())
}
