//! # Transposed Convolution Block
//!
//! Upsampling counterpart of [`ConvBlock`](super::ConvBlock): a transposed convolution
//! to an explicit output size, batch normalization and ELU.

use burn::{
    nn::{
        conv::{ConvTranspose2d, ConvTranspose2dConfig},
        BatchNorm,
    },
    prelude::*,
};
use burn_extra_ops::{crop_transpose_same, same_output_size, Elu};

use super::{batch_norm, he_uniform, kernel_penalty, Regularized};
use crate::config::BlockConfig;
use crate::error::{SdNetError, SdNetResult};

/// Configuration for the `TransposeConvBlock` module.
#[derive(Config, Debug)]
pub struct TransposeConvBlockConfig {
    in_channels: usize,
    out_channels: usize,
    #[config(default = "3")]
    kernel_size: usize,
    #[config(default = "2")]
    stride: usize,
    #[config(default = "BlockConfig::new()")]
    block: BlockConfig,
}

impl TransposeConvBlockConfig {
    /// Initializes a new `TransposeConvBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> TransposeConvBlock<B> {
        // He-uniform fan-in of a transposed kernel is k * k * out_channels.
        let conv = ConvTranspose2dConfig::new(
            [self.in_channels, self.out_channels],
            [self.kernel_size, self.kernel_size],
        )
        .with_stride([self.stride, self.stride])
        .with_bias(false)
        .with_initializer(he_uniform())
        .init(device);
        let bn = batch_norm(self.out_channels, &self.block, device);

        TransposeConvBlock {
            conv,
            bn,
            elu: Elu::default(),
            kernel_size: self.kernel_size,
            stride: self.stride,
            l2_scale: self.block.l2_scale().unwrap_or(0.0),
        }
    }
}

/// Transposed convolution with `SAME` output placement, batch normalization and ELU.
#[derive(Module, Debug)]
pub struct TransposeConvBlock<B: Backend> {
    conv: ConvTranspose2d<B>,
    bn: BatchNorm<B, 2>,
    elu: Elu,
    kernel_size: usize,
    stride: usize,
    l2_scale: f64,
}

impl<B: Backend> TransposeConvBlock<B> {
    /// Upsamples `x` to `out_size`.
    ///
    /// `out_size` must be a size a strided `SAME` convolution maps back onto the input,
    /// i.e. `ceil(out_size / stride) == input size` in both spatial dimensions.
    ///
    /// # Shapes
    /// - input: `[batch_size, in_channels, height, width]`
    /// - output: `[batch_size, out_channels, out_size[0], out_size[1]]`
    ///
    /// # Errors
    ///
    /// Returns `Err(SdNetError::InvalidTensorShape)` for an inconsistent `out_size`.
    pub fn forward(&self, x: Tensor<B, 4>, out_size: [usize; 2]) -> SdNetResult<Tensor<B, 4>> {
        let [_, _, h, w] = x.dims();
        let consistent = same_output_size(out_size[0], self.stride) == h
            && same_output_size(out_size[1], self.stride) == w;
        if !consistent {
            return Err(SdNetError::InvalidTensorShape {
                expected: format!(
                    "output size [H, W] with ceil(H / {s}) == {h} and ceil(W / {s}) == {w}",
                    s = self.stride
                ),
                actual: format!("{out_size:?}"),
            });
        }

        let x = self.conv.forward(x);
        let x = crop_transpose_same(
            x,
            [h, w],
            [self.kernel_size, self.kernel_size],
            [self.stride, self.stride],
            out_size,
        );
        let x = self.bn.forward(x);
        Ok(self.elu.forward(x))
    }

    /// The transposed kernel, `[in, out, k, k]`.
    pub fn weight(&self) -> Tensor<B, 4> {
        self.conv.weight.val()
    }
}

impl<B: Backend> Regularized<B> for TransposeConvBlock<B> {
    fn regularization_loss(&self) -> Tensor<B, 1> {
        kernel_penalty(self.weight(), self.l2_scale)
    }
}
