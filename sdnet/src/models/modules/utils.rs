use core::f64::consts::SQRT_2;

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, Initializer, PaddingConfig2d,
    },
    prelude::*,
};
use burn_extra_ops::{pad_same, TensorExtraOps};

use crate::config::BlockConfig;

/// Blocks whose convolution kernels carry an L2 penalty.
pub trait Regularized<B: Backend> {
    /// Sum of the L2 penalties of every kernel in the block.
    ///
    /// Zero when no weight decay is configured.
    fn regularization_loss(&self) -> Tensor<B, 1>;
}

/// He-uniform initialization: `U(-sqrt(6 / fan_in), sqrt(6 / fan_in))`.
pub(crate) const fn he_uniform() -> Initializer {
    Initializer::KaimingUniform {
        gain: SQRT_2,
        fan_out_only: false,
    }
}

/// Batch normalization with TensorFlow's defaults (decay 0.99, epsilon 1e-3).
///
/// Scale and offset are frozen when `bnorm_trainable` is off.
pub(crate) fn batch_norm<B: Backend>(
    channels: usize,
    block: &BlockConfig,
    device: &Device<B>,
) -> BatchNorm<B, 2> {
    let bn = BatchNormConfig::new(channels)
        .with_epsilon(1e-3)
        .with_momentum(0.01)
        .init(device);
    if block.bnorm_trainable {
        bn
    } else {
        bn.no_grad()
    }
}

pub(crate) fn kernel_penalty<B: Backend, const D: usize>(
    weight: Tensor<B, D>,
    l2_scale: f64,
) -> Tensor<B, 1> {
    if l2_scale > 0.0 {
        weight.l2_penalty(l2_scale)
    } else {
        Tensor::zeros([1], &weight.device())
    }
}

/// Configuration for [`SameConv2d`].
#[derive(Config, Debug)]
pub struct SameConv2dConfig {
    /// Input and output channels.
    channels: [usize; 2],
    kernel_size: usize,
    #[config(default = "1")]
    stride: usize,
    #[config(default = "None")]
    weight_decay: Option<f64>,
}

impl SameConv2dConfig {
    /// Initializes a bias-free, He-uniform `SameConv2d`.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SameConv2d<B> {
        let conv = Conv2dConfig::new(self.channels, [self.kernel_size, self.kernel_size])
            .with_stride([self.stride, self.stride])
            .with_padding(PaddingConfig2d::Valid)
            .with_bias(false)
            .with_initializer(he_uniform())
            .init(device);

        SameConv2d {
            conv,
            kernel_size: self.kernel_size,
            stride: self.stride,
            l2_scale: self.weight_decay.filter(|wd| *wd > 0.0).unwrap_or(0.0),
        }
    }
}

/// A 2D convolution with TensorFlow `SAME` padding.
///
/// The output spatial size is `ceil(input / stride)`; odd padding goes to the
/// bottom/right.
#[derive(Module, Debug)]
pub struct SameConv2d<B: Backend> {
    pub(crate) conv: Conv2d<B>,
    kernel_size: usize,
    stride: usize,
    l2_scale: f64,
}

impl<B: Backend> SameConv2d<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let kernel = [self.kernel_size, self.kernel_size];
        let stride = [self.stride, self.stride];
        self.conv.forward(pad_same(x, kernel, stride))
    }

    /// The convolution kernel, `[out, in, k, k]`.
    pub fn weight(&self) -> Tensor<B, 4> {
        self.conv.weight.val()
    }
}

impl<B: Backend> Regularized<B> for SameConv2d<B> {
    fn regularization_loss(&self) -> Tensor<B, 1> {
        kernel_penalty(self.weight(), self.l2_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn same_conv_output_size() {
        let device = Default::default();
        let conv = SameConv2dConfig::new([3, 8], 3)
            .with_stride(2)
            .init::<TestBackend>(&device);

        let odd = Tensor::<TestBackend, 4>::zeros([2, 3, 9, 7], &device);
        assert_eq!(conv.forward(odd).dims(), [2, 8, 5, 4]);

        let even = Tensor::<TestBackend, 4>::zeros([1, 3, 8, 8], &device);
        assert_eq!(conv.forward(even).dims(), [1, 8, 4, 4]);
    }

    #[test]
    fn same_conv_has_no_bias() {
        let device = Default::default();
        let conv = SameConv2dConfig::new([4, 2], 1).init::<TestBackend>(&device);

        let y = conv.forward(Tensor::zeros([1, 4, 3, 3], &device));
        assert_eq!(y.abs().sum().into_scalar(), 0.0);
    }

    #[test]
    fn he_uniform_bounds() {
        let device = Default::default();
        let conv = SameConv2dConfig::new([16, 32], 3).init::<TestBackend>(&device);

        let limit = (6.0f32 / (3.0 * 3.0 * 16.0)).sqrt();
        let max_abs = conv.weight().abs().max().into_scalar();
        assert!(max_abs <= limit);
        assert_eq!(conv.weight().dims(), [32, 16, 3, 3]);
    }

    #[test]
    fn regularization_loss_follows_weight_decay() {
        let device = Default::default();
        let plain = SameConv2dConfig::new([2, 2], 3).init::<TestBackend>(&device);
        assert_eq!(plain.regularization_loss().into_scalar(), 0.0);

        let decayed = SameConv2dConfig::new([2, 2], 3)
            .with_weight_decay(Some(0.5))
            .init::<TestBackend>(&device);
        let w = decayed.weight();
        let expected = (w.clone() * w).sum().into_scalar() * 0.25;
        let loss = decayed.regularization_loss().into_scalar();
        assert!((loss - expected).abs() < 1e-5);
    }
}
