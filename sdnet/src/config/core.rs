//! Core configuration structures for SDNet.
//!
//! This module contains the primary configuration structures that define
//! the SDNet architecture and the options shared by all of its blocks.

use crate::error::{SdNetError, SdNetResult};
use burn::prelude::*;

use super::enums::{ModelPreset, UpsampleMode};

/// Main configuration for the SDNet model.
///
/// This struct aggregates the stem, encoder, decoder and head configurations,
/// together with the block options every layer reads.
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Stem convolution configuration.
    #[config(default = "StemConfig::new()")]
    pub stem: StemConfig,
    /// Encoder stages.
    #[config(default = "EncoderConfig::new()")]
    pub encoder: EncoderConfig,
    /// Upsampling path configuration.
    #[config(default = "DecoderConfig::new()")]
    pub decoder: DecoderConfig,
    /// Logits head configuration.
    #[config(default = "HeadConfig::new()")]
    pub head: HeadConfig,
    /// Options shared by every block.
    #[config(default = "BlockConfig::new()")]
    pub block: BlockConfig,
}

/// Options shared by every convolution, normalization and attention block.
#[derive(Config, Debug)]
pub struct BlockConfig {
    /// Scale of the L2 penalty on convolution kernels. `None` disables it.
    #[config(default = "None")]
    pub weight_decay: Option<f64>,
    /// Whether batch-norm scale and offset receive gradients.
    #[config(default = "true")]
    pub bnorm_trainable: bool,
}

/// Stem configuration: a single convolution block applied to the input image.
#[derive(Config, Debug)]
pub struct StemConfig {
    /// Number of input image channels.
    #[config(default = "3")]
    pub in_channels: usize,
    /// Output depth of the stem.
    #[config(default = "32")]
    pub depth: usize,
    #[config(default = "3")]
    pub kernel_size: usize,
    #[config(default = "2")]
    pub stride: usize,
}

/// One squeezing-dense encoder stage.
///
/// `depths`, `conv_sizes` and `strides` describe the dense layers of the stage and must
/// have the same length. Only the last layer may downsample.
#[derive(Config, Debug)]
pub struct EncoderStageConfig {
    pub depths: Vec<usize>,
    pub conv_sizes: Vec<usize>,
    pub strides: Vec<usize>,
    /// Bottleneck factor of the global context block on the decode feature.
    /// `None` disables the block.
    #[config(default = "None")]
    pub gc_factor: Option<usize>,
}

/// Encoder configuration.
#[derive(Config, Debug)]
pub struct EncoderConfig {
    #[config(default = "ModelPreset::Small")]
    pub preset: ModelPreset,
    /// Explicit stages. Takes precedence over `preset` when set.
    #[config(default = "None")]
    pub stages: Option<Vec<EncoderStageConfig>>,
}

/// Decoder configuration.
#[derive(Config, Debug)]
pub struct DecoderConfig {
    /// Kernel size of the transposed convolutions.
    #[config(default = "3")]
    pub up_kernel_size: usize,
    /// Depth the stem feature is projected to before it joins the decoder output.
    #[config(default = "32")]
    pub shortcut_depth: usize,
}

/// Logits head configuration.
#[derive(Config, Debug)]
pub struct HeadConfig {
    /// Number of segmentation classes.
    #[config(default = "21")]
    pub num_classes: usize,
    #[config(default = "1")]
    pub logit_kernel_size: usize,
    /// Resize of the logits back to the input resolution.
    #[config(default = "UpsampleMode::Nearest")]
    pub upsample_mode: UpsampleMode,
}

impl ModelConfig {
    /// Builds a configuration from a preset, sizing the stem after it.
    #[must_use]
    pub fn from_preset(preset: ModelPreset, num_classes: usize) -> Self {
        let stem_depth = preset.stem_depth();
        Self::new()
            .with_stem(StemConfig::new().with_depth(stem_depth))
            .with_encoder(EncoderConfig::new().with_preset(preset))
            .with_decoder(DecoderConfig::new().with_shortcut_depth(stem_depth))
            .with_head(HeadConfig::new().with_num_classes(num_classes))
    }

    /// Validate the configuration and return appropriate errors for invalid settings.
    ///
    /// # Errors
    ///
    /// Returns `Err(SdNetError::InvalidConfiguration)` if any validation rule is violated.
    pub fn validate(&self) -> SdNetResult<()> {
        self.block.validate()?;

        // 1. Stem
        if self.stem.in_channels == 0 {
            return Err(SdNetError::invalid_config("in_channels must be > 0"));
        }
        if self.stem.depth == 0 || self.stem.kernel_size == 0 || self.stem.stride == 0 {
            return Err(SdNetError::invalid_config(format!(
                "Stem depth, kernel size and stride must be > 0, got {}, {}, {}",
                self.stem.depth, self.stem.kernel_size, self.stem.stride
            )));
        }

        // 2. Encoder
        let stages = self.encoder.stages();
        if stages.is_empty() {
            return Err(SdNetError::invalid_config(
                "Encoder must have at least one stage",
            ));
        }
        for (i, stage) in stages.iter().enumerate() {
            stage.validate().map_err(|err| match err {
                SdNetError::InvalidConfiguration { reason } => {
                    SdNetError::invalid_config(format!("Stage {i}: {reason}"))
                }
                other => other,
            })?;
        }

        // 3. Decoder and head
        if self.decoder.up_kernel_size == 0 {
            return Err(SdNetError::invalid_config("up_kernel_size must be > 0"));
        }
        if self.decoder.shortcut_depth == 0 {
            return Err(SdNetError::invalid_config("shortcut_depth must be > 0"));
        }
        if self.head.num_classes == 0 {
            return Err(SdNetError::invalid_config("num_classes must be > 0"));
        }
        if self.head.logit_kernel_size == 0 {
            return Err(SdNetError::invalid_config("logit_kernel_size must be > 0"));
        }

        Ok(())
    }
}

impl BlockConfig {
    /// Checks that the weight decay, if any, is a finite non-negative scale.
    ///
    /// # Errors
    ///
    /// Returns `Err(SdNetError::InvalidConfiguration)` for a negative or non-finite decay.
    pub fn validate(&self) -> SdNetResult<()> {
        match self.weight_decay {
            Some(wd) if !wd.is_finite() || wd < 0.0 => Err(SdNetError::invalid_config(format!(
                "weight_decay must be finite and >= 0, got {wd}"
            ))),
            _ => Ok(()),
        }
    }

    /// The L2 scale to apply, or `None` when regularization is effectively disabled.
    #[must_use]
    pub fn l2_scale(&self) -> Option<f64> {
        self.weight_decay.filter(|wd| *wd > 0.0)
    }
}

impl EncoderStageConfig {
    /// Checks the dense layer description of this stage.
    ///
    /// # Errors
    ///
    /// Returns `Err(SdNetError::InvalidConfiguration)` when the layer lists are empty or
    /// of different lengths, contain zeros, downsample before the last layer, or when the
    /// global context factor does not fit the last depth.
    pub fn validate(&self) -> SdNetResult<()> {
        let layers = self.depths.len();
        if layers == 0 {
            return Err(SdNetError::invalid_config("depths must not be empty"));
        }
        if self.conv_sizes.len() != layers || self.strides.len() != layers {
            return Err(SdNetError::invalid_config(format!(
                "depths, conv_sizes and strides must have the same length, got {}, {}, {}",
                layers,
                self.conv_sizes.len(),
                self.strides.len()
            )));
        }
        if self
            .depths
            .iter()
            .chain(&self.conv_sizes)
            .chain(&self.strides)
            .any(|&v| v == 0)
        {
            return Err(SdNetError::invalid_config(
                "depths, conv_sizes and strides must be > 0",
            ));
        }
        // Dense concatenation needs every intermediate layer at the input resolution.
        if let Some(i) = self.strides[..layers - 1].iter().position(|&s| s != 1) {
            return Err(SdNetError::invalid_config(format!(
                "Only the last dense layer may be strided, layer {i} has stride {}",
                self.strides[i]
            )));
        }
        if let Some(factor) = self.gc_factor {
            let depth = self.out_depth();
            if factor == 0 || depth / factor == 0 {
                return Err(SdNetError::invalid_config(format!(
                    "gc_factor {factor} does not fit depth {depth}"
                )));
            }
        }
        Ok(())
    }

    /// Depth of both the stage output and its decode feature.
    #[must_use]
    pub fn out_depth(&self) -> usize {
        self.depths.last().copied().unwrap_or_default()
    }

    /// Downsampling factor of the stage.
    #[must_use]
    pub fn out_stride(&self) -> usize {
        self.strides.last().copied().unwrap_or(1)
    }
}

impl EncoderConfig {
    /// Resolved stages, shallowest first.
    #[must_use]
    pub fn stages(&self) -> Vec<EncoderStageConfig> {
        self.stages
            .clone()
            .unwrap_or_else(|| self.preset.stages())
    }
}
