use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use burn::prelude::*;
use clap::Parser;
use sdnet_burn::{SdNet, SdNetConfig};
use sdnet_demos::{
    create_device, get_backend_name,
    imaging::{class_map_to_image, load_image},
    init_tracing, model_config, PresetArg, SegmentConfig, SelectedBackend, SelectedDevice,
};
use walkdir::WalkDir;

/// Segment an image or every image under a directory.
#[derive(Parser)]
#[command(name = "segment")]
struct Cli {
    /// Input image path or directory
    input: PathBuf,

    /// Output directory for class maps
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Weights saved with `print --save-weights`
    #[arg(short, long)]
    weights: Option<PathBuf>,

    /// Model configuration written by `print --save-config`; overrides the preset flags
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "small")]
    preset: PresetArg,

    #[arg(long, default_value_t = 21)]
    num_classes: usize,

    /// Resize inputs to a square of this size before segmenting
    #[arg(long)]
    image_size: Option<u32>,

    /// Write raw class indices instead of spreading them over 0..=255
    #[arg(long)]
    raw_classes: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let device = create_device();
    tracing::info!(backend = get_backend_name(), "using backend");

    let config = SegmentConfig {
        image_size: cli.image_size,
        scale_classes: !cli.raw_classes,
        ..SegmentConfig::new(model_config(cli.config.as_deref(), cli.preset, cli.num_classes)?)
    };

    let mut model: SdNet<SelectedBackend> = SdNetConfig::new(config.model.clone()).init(&device)?;
    match &cli.weights {
        Some(path) => {
            model = model.load_weights(path, &device)?;
            tracing::info!(path = %path.display(), "loaded weights");
        }
        None => tracing::warn!("no weights given, segmenting with random initialization"),
    }

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;

    if cli.input.is_file() {
        segment_image(&model, &config, &cli.input, &cli.output, &device)?;
    } else if cli.input.is_dir() {
        for entry in WalkDir::new(&cli.input).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if entry.file_type().is_file() && is_supported_image(path) {
                if let Err(e) = segment_image(&model, &config, path, &cli.output, &device) {
                    tracing::error!(path = %path.display(), error = %e, "failed to segment image");
                }
            }
        }
    } else {
        anyhow::bail!("Input path does not exist: {}", cli.input.display());
    }

    tracing::info!("segmentation completed");
    Ok(())
}

fn segment_image(
    model: &SdNet<SelectedBackend>,
    config: &SegmentConfig,
    input: &Path,
    output_dir: &Path,
    device: &SelectedDevice,
) -> Result<()> {
    tracing::info!(path = %input.display(), "segmenting image");

    let x = load_image::<SelectedBackend>(
        input,
        config.model.stem.in_channels,
        config.image_size,
        device,
    )?;
    let classes = model.segment(x)?;
    let [_, h, w] = classes.dims();
    let classes = classes.reshape([h, w]);

    let mask = class_map_to_image(classes, config.model.head.num_classes, config.scale_classes)?;
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let output_path = output_dir.join(format!("{stem}_classes.png"));
    mask.save(&output_path)
        .with_context(|| format!("Failed to save {}", output_path.display()))?;

    tracing::info!(path = %output_path.display(), "saved class map");
    Ok(())
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
}
