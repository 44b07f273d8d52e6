use burn::prelude::*;

use super::{ConvBlock, ConvBlockConfig, Regularized};
use crate::config::BlockConfig;
use crate::error::{SdNetError, SdNetResult};

/// Configuration for the `Shortcut` module.
#[derive(Config, Debug)]
pub struct ShortcutConfig {
    /// Channels of the low-level feature.
    low_level_channels: usize,
    /// Depth the low-level feature is projected to.
    out_channels: usize,
    #[config(default = "1")]
    kernel_size: usize,
    #[config(default = "1")]
    stride: usize,
    #[config(default = "BlockConfig::new()")]
    block: BlockConfig,
}

impl ShortcutConfig {
    /// Initializes a new `Shortcut` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> Shortcut<B> {
        Shortcut {
            conv: ConvBlockConfig::new(self.low_level_channels, self.out_channels)
                .with_kernel_size(self.kernel_size)
                .with_stride(self.stride)
                .with_block(self.block.clone())
                .init(device),
        }
    }
}

/// Projects a low-level feature and concatenates it to the main pipe.
#[derive(Module, Debug)]
pub struct Shortcut<B: Backend> {
    conv: ConvBlock<B>,
}

impl<B: Backend> Shortcut<B> {
    /// # Shapes
    /// - x: `[batch_size, channels, height, width]`
    /// - low_level: `[batch_size, low_level_channels, height * stride, width * stride]`
    /// - output: `[batch_size, channels + out_channels, height, width]`
    ///
    /// # Errors
    ///
    /// Returns `Err(SdNetError::InvalidTensorShape)` if the projected low-level feature
    /// does not match `x` in batch or spatial size.
    pub fn forward(&self, x: Tensor<B, 4>, low_level: Tensor<B, 4>) -> SdNetResult<Tensor<B, 4>> {
        let low_level = self.conv.forward(low_level);
        let [n, _, h, w] = x.dims();
        let [ln, lc, lh, lw] = low_level.dims();
        if [n, h, w] != [ln, lh, lw] {
            return Err(SdNetError::InvalidTensorShape {
                expected: format!("[{n}, {lc}, {h}, {w}]"),
                actual: format!("[{ln}, {lc}, {lh}, {lw}]"),
            });
        }
        Ok(Tensor::cat(vec![x, low_level], 1))
    }
}

impl<B: Backend> Regularized<B> for Shortcut<B> {
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
    fn shortcut_concatenates_channels() {
        let device = Default::default();
        let shortcut = ShortcutConfig::new(8, 6).init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::random([2, 10, 5, 5], Distribution::Default, &device);
        let low = Tensor::<TestBackend, 4>::random([2, 8, 5, 5], Distribution::Default, &device);
        let out = shortcut.forward(x.clone(), low).unwrap();

        assert_eq!(out.dims(), [2, 16, 5, 5]);
        // The main pipe passes through untouched in the leading channels.
        let head = out.slice([0..2, 0..10, 0..5, 0..5]);
        assert_eq!((head - x).abs().max().into_scalar(), 0.0);
    }

    #[test]
    fn shortcut_downsamples_low_level() {
        let device = Default::default();
        let shortcut = ShortcutConfig::new(4, 4)
            .with_kernel_size(3)
            .with_stride(2)
            .init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::zeros([1, 2, 4, 4], &device);
        let low = Tensor::<TestBackend, 4>::zeros([1, 4, 7, 8], &device);
        assert_eq!(shortcut.forward(x, low).unwrap().dims(), [1, 6, 4, 4]);
    }

    #[test]
    fn shortcut_rejects_spatial_mismatch() {
        let device = Default::default();
        let shortcut = ShortcutConfig::new(4, 4).init::<TestBackend>(&device);

        let x = Tensor::<TestBackend, 4>::zeros([1, 2, 4, 4], &device);
        let low = Tensor::<TestBackend, 4>::zeros([1, 4, 8, 8], &device);
        assert!(matches!(
            shortcut.forward(x, low),
            Err(SdNetError::InvalidTensorShape { .. })
        ));
    }
}
