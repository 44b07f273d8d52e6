//! Configuration for the demos.

use std::path::Path;

use anyhow::Result;
use burn::config::Config;
use clap::ValueEnum;
use sdnet_burn::{ModelConfig, ModelPreset};
use serde::{Deserialize, Serialize};

/// Command line name of a [`ModelPreset`].
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetArg {
    Tiny,
    Small,
    Base,
}

impl From<PresetArg> for ModelPreset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Tiny => Self::Tiny,
            PresetArg::Small => Self::Small,
            PresetArg::Base => Self::Base,
        }
    }
}

/// Settings of the segmentation demo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Model configuration.
    pub model: ModelConfig,
    /// Square size images are resized to. None keeps the original resolution.
    pub image_size: Option<u32>,
    /// Spread class indices over the full 8-bit range in the written masks.
    pub scale_classes: bool,
}

impl SegmentConfig {
    /// Default segmentation settings around a model configuration.
    pub const fn new(model: ModelConfig) -> Self {
        Self {
            model,
            image_size: None,
            scale_classes: true,
        }
    }
}

/// Loads a model configuration saved with `print --save-config`, or builds one from a
/// preset.
pub fn model_config(
    path: Option<&Path>,
    preset: PresetArg,
    num_classes: usize,
) -> Result<ModelConfig> {
    match path {
        Some(path) => ModelConfig::load(path).map_err(|e| {
            anyhow::anyhow!("Failed to load config file {}: {e:?}", path.display())
        }),
        None => Ok(ModelConfig::from_preset(preset.into(), num_classes)),
    }
}
