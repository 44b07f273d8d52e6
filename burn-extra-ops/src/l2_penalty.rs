//! L2 weight penalty.

use burn::prelude::*;

/// Returns `scale * sum(w^2) / 2`, the penalty TensorFlow's `l2_regularizer` adds for
/// a kernel.
pub fn l2_penalty<B: Backend, const D: usize>(weight: Tensor<B, D>, scale: f64) -> Tensor<B, 1> {
    (weight.clone() * weight).sum().mul_scalar(scale / 2.0)
}
