use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use burn::{
    optim::{GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::{backend::AutodiffBackend, Distribution},
};
use clap::Parser;
use sdnet_burn::{BlockConfig, ModelConfig, Regularized, SdNet, SdNetConfig};
use sdnet_demos::{
    create_device, get_backend_name, init_tracing, model_config, train::segmentation_loss,
    EfficientTrainBackend, PresetArg, SelectedBackend, SelectedDevice, TrainBackend,
};

/// Time SDNet forward passes or training steps.
#[derive(Parser)]
#[command(name = "bench")]
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

    /// Square input size
    #[arg(long, default_value_t = 512)]
    size: usize,

    #[arg(long, default_value_t = 1)]
    batch_size: usize,

    #[arg(long, default_value_t = 20)]
    iterations: usize,

    /// Time full training steps instead of forward passes
    #[arg(long)]
    train: bool,

    /// Recompute activations in the backward pass instead of storing them
    #[arg(long)]
    efficient: bool,

    /// L2 scale on convolution kernels
    #[arg(long)]
    weight_decay: Option<f64>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let device = create_device();
    tracing::info!(backend = get_backend_name(), "using backend");

    let mut config = model_config(cli.config.as_deref(), cli.preset, cli.num_classes)?;
    if cli.weight_decay.is_some() {
        let block = BlockConfig::new()
            .with_weight_decay(cli.weight_decay)
            .with_bnorm_trainable(config.block.bnorm_trainable);
        config = config.with_block(block);
    }

    let timings = match (cli.train, cli.efficient) {
        (false, _) => bench_forward(&config, &cli, &device)?,
        (true, false) => bench_training::<TrainBackend>(&config, &cli, &device)?,
        (true, true) => bench_training::<EfficientTrainBackend>(&config, &cli, &device)?,
    };

    report(&timings, cli.batch_size);
    Ok(())
}

fn bench_forward(
    config: &ModelConfig,
    cli: &Cli,
    device: &SelectedDevice,
) -> Result<Vec<Duration>> {
    let model: SdNet<SelectedBackend> = SdNetConfig::new(config.clone()).init(device)?;
    let shape = [cli.batch_size, config.stem.in_channels, cli.size, cli.size];

    let mut timings = Vec::with_capacity(cli.iterations);
    for _ in 0..cli.iterations {
        let start = Instant::now();
        let x = Tensor::<SelectedBackend, 4>::zeros(shape, device);
        // Reading back forces the backend to finish the pass.
        let _ = model.forward(x)?.into_data();
        timings.push(start.elapsed());
    }
    Ok(timings)
}

fn bench_training<B: AutodiffBackend>(
    config: &ModelConfig,
    cli: &Cli,
    device: &B::Device,
) -> Result<Vec<Duration>> {
    let mut model: SdNet<B> = SdNetConfig::new(config.clone()).init(device)?;
    let mut optim = SgdConfig::new().init::<B, SdNet<B>>();
    let shape = [cli.batch_size, config.stem.in_channels, cli.size, cli.size];
    let num_classes = config.head.num_classes;

    let mut timings = Vec::with_capacity(cli.iterations);
    for step in 0..cli.iterations {
        let start = Instant::now();
        let x = Tensor::<B, 4>::random(shape, Distribution::Default, device);
        let targets = Tensor::<B, 3, Int>::random(
            [cli.batch_size, cli.size, cli.size],
            Distribution::Uniform(0.0, num_classes as f64),
            device,
        );

        let logits = model.forward(x)?;
        let loss = segmentation_loss(logits, targets) + model.regularization_loss();
        let loss_value = loss.clone().into_scalar();

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(1e-3, model, grads);

        timings.push(start.elapsed());
        tracing::debug!(step, loss = ?loss_value, "training step");
    }
    Ok(timings)
}

fn report(timings: &[Duration], batch_size: usize) {
    let total: Duration = timings.iter().sum();
    let per_iter = total.as_secs_f64() / timings.len().max(1) as f64;
    tracing::info!(
        iterations = timings.len(),
        total = ?total,
        per_iteration_ms = per_iter * 1e3,
        images_per_sec = batch_size as f64 / per_iter.max(f64::EPSILON),
        "benchmark finished"
    );
    println!("{timings:?}");
}
