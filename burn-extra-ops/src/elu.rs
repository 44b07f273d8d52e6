//! # Exponential Linear Unit
//!
//! `burn::tensor::activation` has no ELU, so it lives here together with a
//! parameter-free module wrapper.

use burn::prelude::*;

use crate::TensorExtraOps;

/// Applies `x` for `x > 0` and `alpha * (exp(x) - 1)` otherwise, element-wise.
///
/// Written with clamps instead of a mask so the gradient flows through both halves.
pub fn elu<B: Backend, const D: usize>(x: Tensor<B, D>, alpha: f64) -> Tensor<B, D> {
    let positive = x.clone().clamp_min(0.0);
    let negative = x.clamp_max(0.0).exp().sub_scalar(1.0).mul_scalar(alpha);
    positive + negative
}

/// ELU activation module.
#[derive(Module, Clone, Debug)]
pub struct Elu {
    alpha: f64,
}

impl Elu {
    /// Creates an ELU with the given `alpha`.
    pub const fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        input.elu(self.alpha)
    }
}

impl Default for Elu {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn elu_keeps_positive_values() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([0.5, 2.0, 0.0], &device);
        let y = Elu::default().forward(x).into_data().to_vec::<f32>().unwrap();

        assert_eq!(y, vec![0.5, 2.0, 0.0]);
    }

    #[test]
    fn elu_saturates_negative_values() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([-1.0, -20.0], &device);
        let y = elu(x, 1.0).into_data().to_vec::<f32>().unwrap();

        assert!((y[0] - ((-1.0f32).exp() - 1.0)).abs() < 1e-6);
        assert!((y[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn elu_scales_by_alpha() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([-1.0], &device);
        let y = elu(x, 2.0).into_scalar();

        assert!((y - 2.0 * ((-1.0f32).exp() - 1.0)).abs() < 1e-6);
    }
}
