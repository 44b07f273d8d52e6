//! Additional operations for the Burn deep learning framework
//!
//! This crate provides operations that are commonly used in deep learning but are not
//! yet available in the core Burn framework.

use burn::prelude::*;

mod elu;
mod l2_penalty;
mod padding;

// Convenient re-exports
pub use elu::{elu, Elu};
pub use l2_penalty::l2_penalty;
pub use padding::{
    crop_transpose_same, pad_same, same_output_size, same_padding, same_transpose_crop,
};

/// Additional operations for Burn tensors
pub trait TensorExtraOps<B: Backend, const D: usize> {
    /// Apply the exponential linear unit with the given `alpha`
    fn elu(self, alpha: f64) -> Self;

    /// Half the scaled sum of squares, as used for L2 weight decay
    fn l2_penalty(self, scale: f64) -> Tensor<B, 1>;
}

impl<B: Backend, const D: usize> TensorExtraOps<B, D> for Tensor<B, D> {
    fn elu(self, alpha: f64) -> Self {
        elu(self, alpha)
    }

    fn l2_penalty(self, scale: f64) -> Tensor<B, 1> {
        l2_penalty(self, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{ndarray::NdArray, Autodiff},
        tensor::Tensor,
    };

    type TestBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_tensor_extra_ops() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 4>::random(
            [2, 3, 4, 5],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );

        let activated = tensor.clone().elu(1.0);
        assert_eq!(activated.dims(), tensor.dims());

        // ELU never goes below -alpha
        let min = activated.min().into_scalar();
        assert!(min > -1.0);
    }

    #[test]
    fn test_elu_gradient_flows_through_both_halves() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([-1.0, 2.0], &device).require_grad();

        let grads = x.clone().elu(1.0).sum().backward();
        let grad = x.grad(&grads).unwrap().into_data().to_vec::<f32>().unwrap();

        assert!((grad[0] - (-1.0f32).exp()).abs() < 1e-6);
        assert!((grad[1] - 1.0).abs() < 1e-6);
    }
}
