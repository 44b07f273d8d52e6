use burn::prelude::*;

use super::{Regularized, SameConv2d, SameConv2dConfig};
use crate::config::BlockConfig;

/// Configuration for the `LogitHead` module.
#[derive(Config, Debug)]
pub struct LogitHeadConfig {
    in_channels: usize,
    num_classes: usize,
    #[config(default = "1")]
    kernel_size: usize,
    #[config(default = "1")]
    stride: usize,
    #[config(default = "BlockConfig::new()")]
    block: BlockConfig,
}

impl LogitHeadConfig {
    /// Initializes a new `LogitHead` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> LogitHead<B> {
        LogitHead {
            conv: SameConv2dConfig::new([self.in_channels, self.num_classes], self.kernel_size)
                .with_stride(self.stride)
                .with_weight_decay(self.block.weight_decay)
                .init(device),
        }
    }
}

/// Per-class logits: a bare convolution, without normalization or activation.
#[derive(Module, Debug)]
pub struct LogitHead<B: Backend> {
    conv: SameConv2d<B>,
}

impl<B: Backend> LogitHead<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.conv.forward(x)
    }
}

impl<B: Backend> Regularized<B> for LogitHead<B> {
    fn regularization_loss(&self) -> Tensor<B, 1> {
        self.conv.regularization_loss()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray<f32>;

    #[test]
    fn logit_head_outputs_one_map_per_class() {
        let device = Default::default();
        let head = LogitHeadConfig::new(24, 5)
            .with_kernel_size(3)
            .init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::random([2, 24, 7, 9], Distribution::Default, &device);
        assert_eq!(head.forward(x).dims(), [2, 5, 7, 9]);
    }

    #[test]
    fn logit_head_is_linear() {
        let device = Default::default();
        let head = LogitHeadConfig::new(3, 2).init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::random([1, 3, 4, 4], Distribution::Default, &device);
        let doubled = head.forward(x.clone().mul_scalar(2.0));
        let diff = (doubled - head.forward(x).mul_scalar(2.0)).abs().max().into_scalar();
        assert!(diff < 1e-5);
    }
}
