//! Training step helpers shared by the benchmark.

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

/// Pixel-wise cross-entropy between logits `[n, classes, h, w]` and class indices
/// `[n, h, w]`.
pub fn segmentation_loss<B: Backend>(
    logits: Tensor<B, 4>,
    targets: Tensor<B, 3, Int>,
) -> Tensor<B, 1> {
    let [n, classes, h, w] = logits.dims();
    let logits = logits.permute([0, 2, 3, 1]).reshape([n * h * w, classes]);
    let targets = targets.reshape([n * h * w]);

    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EfficientTrainBackend;
    use burn::{backend::NdArray, tensor::Distribution};
    use sdnet_burn::{ModelConfig, ModelPreset, Regularized, SdNetConfig};

    type TestBackend = NdArray<f32>;

    #[test]
    fn training_step_with_checkpointing_reaches_parameters() {
        let device = Default::default();
        let config = ModelConfig::from_preset(ModelPreset::Tiny, 3);
        let model = SdNetConfig::new(config)
            .init::<EfficientTrainBackend>(&device)
            .unwrap();

        let x = Tensor::<EfficientTrainBackend, 4>::random(
            [1, 3, 17, 17],
            Distribution::Default,
            &device,
        );
        let targets = Tensor::<EfficientTrainBackend, 3, Int>::zeros([1, 17, 17], &device);
        let loss = segmentation_loss(model.forward(x).unwrap(), targets)
            + model.regularization_loss();
        let grads = loss.backward();

        let params = burn::optim::GradientsParams::from_grads(grads, &model);
        assert!(params.len() > 0);
    }

    #[test]
    fn confident_correct_logits_have_low_loss() {
        let device = Default::default();
        // Class 1 everywhere, strongly predicted.
        let logits = Tensor::<TestBackend, 4>::cat(
            vec![
                Tensor::zeros([1, 1, 2, 2], &device),
                Tensor::ones([1, 1, 2, 2], &device).mul_scalar(20.0),
            ],
            1,
        );
        let targets = Tensor::<TestBackend, 3, Int>::ones([1, 2, 2], &device);

        assert!(segmentation_loss(logits, targets).into_scalar() < 1e-6);
    }

    #[test]
    fn uniform_logits_cost_log_classes() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 4>::zeros([2, 4, 3, 3], &device);
        let targets = Tensor::<TestBackend, 3, Int>::zeros([2, 3, 3], &device);

        let loss = segmentation_loss(logits, targets).into_scalar();
        assert!((loss - 4.0f32.ln()).abs() < 1e-5);
    }
}
