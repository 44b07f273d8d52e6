//! SDNet Demos
//!
//! ## Available Demos
//!
//! - `print`: Model summary, optionally saving the configuration and random weights
//! - `bench`: Forward (and training step) timing, with optional gradient checkpointing
//! - `segment`: Class maps for an image or a directory of images
//!
//! ## Usage
//!
//! ```bash
//! # Inspect the small preset and save it
//! cargo run --bin print -- --preset small --save-config small.json --save-weights small.mpk
//!
//! # Time training steps with activation recomputation
//! cargo run --release --bin bench -- --train --efficient --size 256
//!
//! # Segment a directory
//! cargo run --release --bin segment -- images/ --weights small.mpk --config small.json
//! ```

pub mod backend;
pub mod config;
pub mod imaging;
pub mod train;

pub use backend::{
    create_device, get_backend_name, EfficientTrainBackend, SelectedBackend, SelectedDevice,
    TrainBackend,
};
pub use config::{model_config, PresetArg, SegmentConfig};

use tracing_subscriber::EnvFilter;

/// Installs the `tracing` subscriber, honoring `RUST_LOG` and defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
