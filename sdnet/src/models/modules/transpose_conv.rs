use burn::prelude::*;

use super::{ConvBlock, ConvBlockConfig, Regularized, TransposeConvBlock, TransposeConvBlockConfig};
use crate::config::BlockConfig;
use crate::error::SdNetResult;

/// Configuration for the `TransposeConv` module.
#[derive(Config, Debug)]
pub struct TransposeConvConfig {
    /// Channels of the tensor being upsampled.
    in_channels: usize,
    /// Channels of the skip feature that fixes the output size.
    skip_channels: usize,
    out_channels: usize,
    #[config(default = "3")]
    kernel_size: usize,
    #[config(default = "2")]
    stride: usize,
    #[config(default = "BlockConfig::new()")]
    block: BlockConfig,
}

impl TransposeConvConfig {
    /// Initializes a new `TransposeConv` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> TransposeConv<B> {
        TransposeConv {
            conv_transpose: TransposeConvBlockConfig::new(self.in_channels, self.out_channels)
                .with_kernel_size(self.kernel_size)
                .with_stride(self.stride)
                .with_block(self.block.clone())
                .init(device),
            shortcut_res: ConvBlockConfig::new(self.skip_channels, self.out_channels)
                .with_kernel_size(1)
                .with_block(self.block.clone())
                .init(device),
        }
    }
}

/// Upsampling step of the decoder.
///
/// Upsamples the main pipe to the size of an encoder feature and adds a pointwise
/// projection of that feature as a residual.
#[derive(Module, Debug)]
pub struct TransposeConv<B: Backend> {
    conv_transpose: TransposeConvBlock<B>,
    shortcut_res: ConvBlock<B>,
}

impl<B: Backend> TransposeConv<B> {
    /// # Shapes
    /// - x: `[batch_size, in_channels, height, width]`
    /// - skip: `[batch_size, skip_channels, out_height, out_width]`
    /// - output: `[batch_size, out_channels, out_height, out_width]`
    ///
    /// # Errors
    ///
    /// Returns `Err(SdNetError::InvalidTensorShape)` if `skip` is not a valid upsampled
    /// size of `x` for the configured stride.
    pub fn forward(&self, x: Tensor<B, 4>, skip: Tensor<B, 4>) -> SdNetResult<Tensor<B, 4>> {
        let [_, _, h, w] = skip.dims();
        let x = self.conv_transpose.forward(x, [h, w])?;
        Ok(x + self.shortcut_res.forward(skip))
    }
}

impl<B: Backend> Regularized<B> for TransposeConv<B> {
    fn regularization_loss(&self) -> Tensor<B, 1> {
        self.conv_transpose.regularization_loss() + self.shortcut_res.regularization_loss()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdNetError;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray<f32>;

    #[test]
    fn transpose_conv_matches_skip_size() {
        let device = Default::default();
        let up = TransposeConvConfig::new(32, 16, 16).init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::random([2, 32, 4, 3], Distribution::Default, &device);
        let skip = Tensor::<TestBackend, 4>::random([2, 16, 7, 6], Distribution::Default, &device);
        assert_eq!(up.forward(x, skip).unwrap().dims(), [2, 16, 7, 6]);
    }

    #[test]
    fn transpose_conv_projects_skip_channels() {
        let device = Default::default();
        let up = TransposeConvConfig::new(8, 3, 5)
            .with_stride(1)
            .init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::zeros([1, 8, 5, 5], &device);
        let skip = Tensor::<TestBackend, 4>::zeros([1, 3, 5, 5], &device);
        assert_eq!(up.forward(x, skip).unwrap().dims(), [1, 5, 5, 5]);
    }

    #[test]
    fn transpose_conv_rejects_unrelated_skip() {
        let device = Default::default();
        let up = TransposeConvConfig::new(4, 4, 4).init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::zeros([1, 4, 2, 2], &device);
        let skip = Tensor::<TestBackend, 4>::zeros([1, 4, 9, 9], &device);
        assert!(matches!(
            up.forward(x, skip),
            Err(SdNetError::InvalidTensorShape { .. })
        ));
    }
}
