//! # Global Context Block
//!
//! Attention block from *GCNet: Non-local Networks Meet Squeeze-Excitation Networks
//! and Beyond*. A softmax-weighted pooling of the whole feature map produces one
//! context vector per image; a bottleneck transform of that vector is added back to
//! every position.

use burn::{
    nn::{LayerNorm, LayerNormConfig, Relu},
    prelude::*,
    tensor::activation::{sigmoid, softmax},
};

use super::{Regularized, SameConv2d, SameConv2dConfig};
use crate::config::BlockConfig;
use crate::error::{SdNetError, SdNetResult};

/// Configuration for the `GcBlock` module.
#[derive(Config, Debug)]
pub struct GcBlockConfig {
    /// Number of input (and output) channels.
    channels: usize,
    /// Bottleneck reduction of the transform, `channels / factor` intermediate channels.
    factor: usize,
    #[config(default = "BlockConfig::new()")]
    block: BlockConfig,
}

impl GcBlockConfig {
    /// Initializes a new `GcBlock` module.
    ///
    /// # Errors
    ///
    /// Returns `Err(SdNetError::InvalidConfiguration)` if `factor` is zero or leaves no
    /// intermediate channel.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SdNetResult<GcBlock<B>> {
        let inter_channels = self.channels.checked_div(self.factor).unwrap_or(0);
        if inter_channels == 0 {
            return Err(SdNetError::invalid_config(format!(
                "gc factor {} leaves no channel out of {}",
                self.factor, self.channels
            )));
        }
        let conv = |channels: [usize; 2]| {
            SameConv2dConfig::new(channels, 1)
                .with_weight_decay(self.block.weight_decay)
                .init(device)
        };

        Ok(GcBlock {
            context: conv([self.channels, 1]),
            shrink: conv([self.channels, inter_channels]),
            norm: LayerNormConfig::new(inter_channels)
                .with_epsilon(1e-12)
                .init(device),
            relu: Relu::new(),
            expand: conv([inter_channels, self.channels]),
        })
    }
}

/// Global context attention block.
#[derive(Module, Debug)]
pub struct GcBlock<B: Backend> {
    context: SameConv2d<B>,
    shrink: SameConv2d<B>,
    norm: LayerNorm<B>,
    relu: Relu,
    expand: SameConv2d<B>,
}

impl<B: Backend> GcBlock<B> {
    /// # Shapes
    /// - input: `[batch_size, channels, height, width]`
    /// - output: `[batch_size, channels, height, width]`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let context = self.context(x.clone());
        let transform = self.transform(context);
        x + transform
    }

    /// Softmax-pooled context, `[batch_size, channels, 1, 1]`.
    fn context(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [n, c, h, w] = x.dims();
        let weights = self.context.forward(x.clone()).reshape([n, h * w, 1]);
        let weights = softmax(weights, 1);
        x.reshape([n, c, h * w])
            .matmul(weights)
            .reshape([n, c, 1, 1])
    }

    fn transform(&self, context: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.shrink.forward(context);
        let [n, inter, _, _] = x.dims();
        let x = self
            .norm
            .forward(x.reshape([n, inter]))
            .reshape([n, inter, 1, 1]);
        let x = self.relu.forward(x);
        sigmoid(self.expand.forward(x))
    }
}

impl<B: Backend> Regularized<B> for GcBlock<B> {
    fn regularization_loss(&self) -> Tensor<B, 1> {
        self.context.regularization_loss()
            + self.shrink.regularization_loss()
            + self.expand.regularization_loss()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, module::Param, tensor::Distribution};

    type TestBackend = NdArray<f32>;

    #[test]
    fn gc_block_preserves_shape() {
        let device = Default::default();
        let block = GcBlockConfig::new(16, 4).init::<TestBackend>(&device).unwrap();

        let x = Tensor::<TestBackend, 4>::random([2, 16, 5, 7], Distribution::Default, &device);
        assert_eq!(block.forward(x).dims(), [2, 16, 5, 7]);
    }

    #[test]
    fn gc_block_adds_half_with_zero_expand_kernel() {
        let device = Default::default();
        let mut block = GcBlockConfig::new(8, 2).init::<TestBackend>(&device).unwrap();
        let zeros = Tensor::<TestBackend, 4>::zeros([8, 4, 1, 1], &device);
        block.expand.conv.weight = Param::from_tensor(zeros);

        let x = Tensor::<TestBackend, 4>::random([1, 8, 3, 3], Distribution::Default, &device);
        let diff = (block.forward(x.clone()) - x).sub_scalar(0.5).abs().max().into_scalar();
        assert!(diff < 1e-6);
    }

    #[test]
    fn gc_context_is_a_convex_combination() {
        let device = Default::default();
        let block = GcBlockConfig::new(4, 2).init::<TestBackend>(&device).unwrap();

        // A constant map pools to the same constant whatever the attention weights are.
        let x = Tensor::<TestBackend, 4>::ones([1, 4, 6, 6], &device).mul_scalar(3.0);
        let context = block.context(x);
        assert_eq!(context.dims(), [1, 4, 1, 1]);
        let diff = context.sub_scalar(3.0).abs().max().into_scalar();
        assert!(diff < 1e-5);
    }

    #[test]
    fn gc_block_rejects_oversized_factor() {
        let device = Default::default();
        let result = GcBlockConfig::new(4, 8).init::<TestBackend>(&device);
        assert!(matches!(
            result,
            Err(SdNetError::InvalidConfiguration { .. })
        ));

        let result = GcBlockConfig::new(4, 0).init::<TestBackend>(&device);
        assert!(result.is_err());
    }
}
