//! # Convolution Block
//!
//! The basic unit of the network: a `SAME` convolution followed by batch
//! normalization and an ELU activation.

use burn::{nn::BatchNorm, prelude::*};
use burn_extra_ops::Elu;

use super::{batch_norm, Regularized, SameConv2d, SameConv2dConfig};
use crate::config::BlockConfig;

/// Configuration for the `ConvBlock` module.
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    /// Number of input channels.
    in_channels: usize,
    /// Number of output channels.
    out_channels: usize,
    #[config(default = "3")]
    kernel_size: usize,
    #[config(default = "1")]
    stride: usize,
    /// Shared block options.
    #[config(default = "BlockConfig::new()")]
    block: BlockConfig,
}

impl ConvBlockConfig {
    /// Initializes a new `ConvBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ConvBlock<B> {
        let conv = SameConv2dConfig::new([self.in_channels, self.out_channels], self.kernel_size)
            .with_stride(self.stride)
            .with_weight_decay(self.block.weight_decay)
            .init(device);
        let bn = batch_norm(self.out_channels, &self.block, device);

        ConvBlock {
            conv,
            bn,
            elu: Elu::default(),
        }
    }
}

/// Convolution, batch normalization and ELU.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: SameConv2d<B>,
    bn: BatchNorm<B, 2>,
    elu: Elu,
}

impl<B: Backend> ConvBlock<B> {
    /// # Shapes
    /// - input: `[batch_size, in_channels, height, width]`
    /// - output: `[batch_size, out_channels, ceil(height / stride), ceil(width / stride)]`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        self.elu.forward(x)
    }

    /// The convolution kernel, `[out, in, k, k]`.
    pub fn weight(&self) -> Tensor<B, 4> {
        self.conv.weight()
    }
}

impl<B: Backend> Regularized<B> for ConvBlock<B> {
    fn regularization_loss(&self) -> Tensor<B, 1> {
        self.conv.regularization_loss()
    }
}
