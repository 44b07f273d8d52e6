//! # Squeezing Dense Block
//!
//! A densely connected encoder stage. Every dense layer squeezes the concatenation of
//! the stage input and all previous layer outputs with a pointwise convolution block,
//! then applies a spatial convolution block. The pointwise output of the last layer,
//! optionally refined by a global context block, is the stage's decode feature; the
//! last spatial convolution may downsample.

use burn::prelude::*;

use super::{ConvBlock, ConvBlockConfig, GcBlock, GcBlockConfig, Regularized};
use crate::config::{BlockConfig, EncoderStageConfig};
use crate::error::{SdNetError, SdNetResult};

/// Configuration for the `SqueezingDense` module.
#[derive(Config, Debug)]
pub struct SqueezingDenseConfig {
    /// Number of input channels.
    in_channels: usize,
    /// Layer description of the stage.
    stage: EncoderStageConfig,
    #[config(default = "BlockConfig::new()")]
    block: BlockConfig,
}

impl SqueezingDenseConfig {
    /// Initializes a new `SqueezingDense` module.
    ///
    /// # Errors
    ///
    /// Returns `Err(SdNetError::InvalidConfiguration)` if the stage description is
    /// invalid.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SdNetResult<SqueezingDense<B>> {
        self.stage.validate()?;

        let mut in_channels = self.in_channels;
        let mut layers = Vec::with_capacity(self.stage.depths.len());
        for ((&depth, &conv_size), &stride) in self
            .stage
            .depths
            .iter()
            .zip(&self.stage.conv_sizes)
            .zip(&self.stage.strides)
        {
            layers.push(DenseLayer {
                pw_conv: ConvBlockConfig::new(in_channels, depth)
                    .with_kernel_size(1)
                    .with_block(self.block.clone())
                    .init(device),
                conv: ConvBlockConfig::new(depth, depth)
                    .with_kernel_size(conv_size)
                    .with_stride(stride)
                    .with_block(self.block.clone())
                    .init(device),
            });
            // The next pointwise convolution also sees this layer's output.
            in_channels += depth;
        }

        let gc_main = self
            .stage
            .gc_factor
            .map(|factor| {
                GcBlockConfig::new(self.stage.out_depth(), factor)
                    .with_block(self.block.clone())
                    .init(device)
            })
            .transpose()?;

        let last = layers
            .pop()
            .ok_or_else(|| SdNetError::invalid_config("depths must not be empty"))?;

        Ok(SqueezingDense {
            layers,
            last,
            gc_main,
        })
    }
}

/// Pointwise squeeze followed by a spatial convolution.
#[derive(Module, Debug)]
pub struct DenseLayer<B: Backend> {
    pw_conv: ConvBlock<B>,
    conv: ConvBlock<B>,
}

impl<B: Backend> Regularized<B> for DenseLayer<B> {
    fn regularization_loss(&self) -> Tensor<B, 1> {
        self.pw_conv.regularization_loss() + self.conv.regularization_loss()
    }
}

/// Output of a `SqueezingDense` stage.
#[derive(Debug, Clone)]
pub struct SqueezingDenseOutput<B: Backend> {
    /// Stage output, `[batch_size, depth, ceil(height / stride), ceil(width / stride)]`.
    pub features: Tensor<B, 4>,
    /// Pre-downsampling feature, `[batch_size, depth, height, width]`.
    pub decode_feature: Tensor<B, 4>,
}

/// Densely connected encoder stage.
#[derive(Module, Debug)]
pub struct SqueezingDense<B: Backend> {
    layers: Vec<DenseLayer<B>>,
    last: DenseLayer<B>,
    gc_main: Option<GcBlock<B>>,
}

impl<B: Backend> SqueezingDense<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> SqueezingDenseOutput<B> {
        let mut branches = Vec::with_capacity(self.layers.len() + 1);
        let mut pipe = x;
        for layer in &self.layers {
            branches.push(pipe);
            pipe = layer.pw_conv.forward(Tensor::cat(branches.clone(), 1));
            pipe = layer.conv.forward(pipe);
        }

        branches.push(pipe);
        let mut decode_feature = self.last.pw_conv.forward(Tensor::cat(branches, 1));
        if let Some(gc) = &self.gc_main {
            decode_feature = gc.forward(decode_feature);
        }
        let features = self.last.conv.forward(decode_feature.clone());

        SqueezingDenseOutput {
            features,
            decode_feature,
        }
    }
}

impl<B: Backend> Regularized<B> for SqueezingDense<B> {
    fn regularization_loss(&self) -> Tensor<B, 1> {
        let loss = self.last.regularization_loss();
        let loss = self
            .layers
            .iter()
            .fold(loss, |acc, layer| acc + layer.regularization_loss());
        match &self.gc_main {
            Some(gc) => loss + gc.regularization_loss(),
            None => loss,
        }
    }
}
