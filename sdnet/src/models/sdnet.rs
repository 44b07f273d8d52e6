//! # SDNet Model Implementation
//!
//! This module assembles the building blocks into a segmentation encoder-decoder.
//!
//! ## Core Components
//!
//! - `SdNetConfig`: A configuration struct to initialize the `SdNet` model.
//! - `SdNet`: The main model struct. A stem convolution feeds a stack of squeezing
//!   dense stages; their decode features drive a transposed-convolution decoder back
//!   to stem resolution, where the stem feature joins through a shortcut before the
//!   logits head. Logits are resized to the input resolution with the configured
//!   `UpsampleMode`.

use burn::{
    module::Ignored,
    prelude::*,
    tensor::{module::interpolate, ops::InterpolateOptions},
};
use tracing::{debug, trace};

use super::modules::{
    ConvBlock, ConvBlockConfig, LogitHead, LogitHeadConfig, Regularized, Shortcut,
    ShortcutConfig, SqueezingDense, SqueezingDenseConfig, TransposeConv, TransposeConvConfig,
};
use crate::{
    config::{ModelConfig, UpsampleMode},
    error::{SdNetError, SdNetResult},
};

/// Configuration for the `SdNet` model.
#[derive(Config, Debug)]
pub struct SdNetConfig {
    /// The detailed model configuration.
    config: ModelConfig,
}

impl SdNetConfig {
    /// Initializes an `SdNet` model with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `device` - The device to create the model on.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> SdNetResult<SdNet<B>> {
        self.config.validate()?;
        let block = &self.config.block;
        let stem_cfg = &self.config.stem;
        let stages = self.config.encoder.stages();

        let stem = ConvBlockConfig::new(stem_cfg.in_channels, stem_cfg.depth)
            .with_kernel_size(stem_cfg.kernel_size)
            .with_stride(stem_cfg.stride)
            .with_block(block.clone())
            .init(device);

        let mut channels = stem_cfg.depth;
        let mut encoder = Vec::with_capacity(stages.len());
        for (i, stage) in stages.iter().enumerate() {
            debug!(
                stage = i,
                in_channels = channels,
                depths = ?stage.depths,
                stride = stage.out_stride(),
                gc_factor = ?stage.gc_factor,
                "encoder stage"
            );
            encoder.push(
                SqueezingDenseConfig::new(channels, stage.clone())
                    .with_block(block.clone())
                    .init(device)?,
            );
            channels = stage.out_depth();
        }

        // Applied deepest first.
        let mut decoder = Vec::with_capacity(stages.len());
        for (i, stage) in stages.iter().enumerate().rev() {
            let out_channels = stage.out_depth();
            debug!(
                stage = i,
                in_channels = channels,
                out_channels,
                stride = stage.out_stride(),
                "decoder stage"
            );
            decoder.push(
                TransposeConvConfig::new(channels, out_channels, out_channels)
                    .with_kernel_size(self.config.decoder.up_kernel_size)
                    .with_stride(stage.out_stride())
                    .with_block(block.clone())
                    .init(device),
            );
            channels = out_channels;
        }

        let shortcut_depth = self.config.decoder.shortcut_depth;
        let shortcut = ShortcutConfig::new(stem_cfg.depth, shortcut_depth)
            .with_block(block.clone())
            .init(device);
        channels += shortcut_depth;

        let logit = LogitHeadConfig::new(channels, self.config.head.num_classes)
            .with_kernel_size(self.config.head.logit_kernel_size)
            .with_block(block.clone())
            .init(device);

        debug!(
            num_classes = self.config.head.num_classes,
            head_channels = channels,
            "logits head"
        );

        Ok(SdNet {
            stem,
            encoder,
            decoder,
            shortcut,
            logit,
            in_channels: stem_cfg.in_channels,
            upsample_mode: Ignored(self.config.head.upsample_mode),
        })
    }
}

/// Squeeze-dense segmentation network.
#[derive(Module, Debug)]
pub struct SdNet<B: Backend> {
    stem: ConvBlock<B>,
    encoder: Vec<SqueezingDense<B>>,
    decoder: Vec<TransposeConv<B>>,
    shortcut: Shortcut<B>,
    logit: LogitHead<B>,
    in_channels: usize,
    upsample_mode: Ignored<UpsampleMode>,
}

impl<B: Backend> SdNet<B> {
    /// Computes per-class logits at input resolution.
    ///
    /// # Shapes
    /// - input: `[batch_size, in_channels, height, width]`
    /// - output: `[batch_size, num_classes, height, width]`
    ///
    /// # Errors
    ///
    /// Returns `Err(SdNetError::InvalidTensorShape)` if the input channel count does not
    /// match the configuration.
    pub fn forward(&self, x: Tensor<B, 4>) -> SdNetResult<Tensor<B, 4>> {
        let [n, c, h, w] = x.dims();
        if c != self.in_channels {
            return Err(SdNetError::InvalidTensorShape {
                expected: format!("[batch, {}, height, width]", self.in_channels),
                actual: format!("[{n}, {c}, {h}, {w}]"),
            });
        }

        let stem = self.stem.forward(x);
        trace!(dims = ?stem.dims(), "stem");

        let mut pipe = stem.clone();
        let mut decode_features = Vec::with_capacity(self.encoder.len());
        for (i, stage) in self.encoder.iter().enumerate() {
            let out = stage.forward(pipe);
            trace!(stage = i, dims = ?out.features.dims(), "encoder");
            decode_features.push(out.decode_feature);
            pipe = out.features;
        }

        for (up, skip) in self.decoder.iter().zip(decode_features.into_iter().rev()) {
            pipe = up.forward(pipe, skip)?;
            trace!(dims = ?pipe.dims(), "decoder");
        }

        let pipe = self.shortcut.forward(pipe, stem)?;
        let logits = self.logit.forward(pipe);

        let [_, _, lh, lw] = logits.dims();
        if [lh, lw] == [h, w] {
            return Ok(logits);
        }
        Ok(interpolate(
            logits,
            [h, w],
            InterpolateOptions::new((*self.upsample_mode).into()),
        ))
    }

    /// Predicts a class index per pixel.
    ///
    /// # Shapes
    /// - input: `[batch_size, in_channels, height, width]`
    /// - output: `[batch_size, height, width]`
    ///
    /// # Errors
    ///
    /// Same as [`SdNet::forward`].
    pub fn segment(&self, x: Tensor<B, 4>) -> SdNetResult<Tensor<B, 3, Int>> {
        Ok(self.forward(x)?.argmax(1).squeeze::<3>(1))
    }
}

impl<B: Backend> Regularized<B> for SdNet<B> {
    fn regularization_loss(&self) -> Tensor<B, 1> {
        // Seeded from the stem so the sum lives on the model's device.
        let loss = self.stem.regularization_loss()
            + self.shortcut.regularization_loss()
            + self.logit.regularization_loss();
        let loss = self
            .encoder
            .iter()
            .fold(loss, |acc, stage| acc + stage.regularization_loss());
        self.decoder
            .iter()
            .fold(loss, |acc, up| acc + up.regularization_loss())
    }
}

#[cfg(feature = "weights")]
mod weights {
    use std::path::PathBuf;

    use burn::{
        prelude::*,
        record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    };

    use super::SdNet;
    use crate::error::{SdNetError, SdNetResult};

    impl<B: Backend> SdNet<B> {
        /// Loads weights saved with a full precision `NamedMpkFileRecorder`.
        ///
        /// # Errors
        ///
        /// Returns `Err(SdNetError::WeightLoadingFailed)` if the file cannot be read or
        /// decoded.
        pub fn load_weights(
            self,
            path: impl Into<PathBuf>,
            device: &Device<B>,
        ) -> SdNetResult<Self> {
            let path = path.into();
            let record = NamedMpkFileRecorder::<FullPrecisionSettings>::new()
                .load(path.clone(), device)
                .map_err(|err| SdNetError::WeightLoadingFailed {
                    reason: format!("{}: {err:?}", path.display()),
                })?;
            Ok(self.load_record(record))
        }
    }
}
