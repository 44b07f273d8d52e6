//! Enumeration types for SDNet configuration.

use burn::{prelude::*, tensor::ops::InterpolateMode};

use super::core::EncoderStageConfig;

/// Predefined encoder layouts.
#[derive(Config, Debug, PartialEq, Eq)]
pub enum ModelPreset {
    /// Three shallow stages, for tests and quick experiments.
    Tiny,
    /// Four stages of three dense layers each.
    Small,
    /// Four stages of four dense layers each, with global context on the deep stages.
    Base,
}

impl ModelPreset {
    /// Returns the encoder stages of the preset, shallowest first.
    #[must_use]
    pub fn stages(&self) -> Vec<EncoderStageConfig> {
        let stage = |depth: usize, layers: usize, gc_factor: Option<usize>| {
            let mut strides = vec![1; layers];
            strides[layers - 1] = 2;
            EncoderStageConfig::new(vec![depth; layers], vec![3; layers], strides)
                .with_gc_factor(gc_factor)
        };

        match self {
            Self::Tiny => vec![stage(16, 2, None), stage(32, 2, None), stage(64, 2, Some(4))],
            Self::Small => vec![
                stage(32, 3, None),
                stage(64, 3, None),
                stage(128, 3, Some(8)),
                stage(256, 3, Some(8)),
            ],
            Self::Base => vec![
                stage(48, 4, None),
                stage(96, 4, None),
                stage(192, 4, Some(16)),
                stage(384, 4, Some(16)),
            ],
        }
    }

    /// Stem depth that pairs with the preset.
    #[must_use]
    pub const fn stem_depth(&self) -> usize {
        match self {
            Self::Tiny => 16,
            Self::Small => 32,
            Self::Base => 48,
        }
    }
}

/// Resize applied to the logits when the stem downsamples.
#[derive(Config, Debug, Copy, PartialEq, Eq)]
pub enum UpsampleMode {
    /// Nearest neighbour. Differentiable on every backend.
    Nearest,
    /// Bilinear. Smoother masks, but some backends (ndarray) have no backward pass for it,
    /// so it is only usable for inference there.
    Bilinear,
}

impl From<UpsampleMode> for InterpolateMode {
    fn from(mode: UpsampleMode) -> Self {
        match mode {
            UpsampleMode::Nearest => Self::Nearest,
            UpsampleMode::Bilinear => Self::Bilinear,
        }
    }
}
