//! Backend used by the demo binaries.
//!
//! The inference backend comes from the `cuda`, `wgpu` or `ndarray` cargo feature (first
//! match wins). Training wraps it in `Autodiff`, optionally with activation
//! checkpointing for `bench --efficient`.

use burn::{
    backend::{autodiff::checkpoint::strategy::BalancedCheckpointing, Autodiff},
    tensor::backend::Backend,
};
use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "cuda")] {
        /// Inference backend.
        pub type SelectedBackend = burn::backend::Cuda;
        const NAME: &str = "CUDA (NVIDIA GPU)";
    } else if #[cfg(feature = "wgpu")] {
        /// Inference backend.
        pub type SelectedBackend = burn::backend::Wgpu;
        const NAME: &str = "WGPU (GPU)";
    } else {
        /// Inference backend.
        pub type SelectedBackend = burn::backend::NdArray;
        const NAME: &str = "NdArray (CPU)";
    }
}

pub type SelectedDevice = <SelectedBackend as Backend>::Device;

/// Training backend keeping every activation for the backward pass.
pub type TrainBackend = Autodiff<SelectedBackend>;

/// Training backend recomputing activations during the backward pass to save memory.
pub type EfficientTrainBackend = Autodiff<SelectedBackend, BalancedCheckpointing>;

pub fn create_device() -> SelectedDevice {
    SelectedDevice::default()
}

/// Human readable backend name for logs.
pub const fn get_backend_name() -> &'static str {
    NAME
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;

    #[test]
    fn checkpointed_backend_computes_gradients() {
        let device = create_device();
        let x = Tensor::<EfficientTrainBackend, 1>::from_floats([1.0, -2.0], &device)
            .require_grad();

        let grads = (x.clone() * x.clone()).sum().backward();
        let grad = x.grad(&grads).unwrap().into_data().to_vec::<f32>().unwrap();
        assert_eq!(grad, vec![2.0, -4.0]);
        assert!(!get_backend_name().is_empty());
    }
}
