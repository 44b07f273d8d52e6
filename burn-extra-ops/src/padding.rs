//! # TensorFlow-style `SAME` padding
//!
//! Burn's `PaddingConfig2d::Same` pads symmetrically and keeps the input size, which
//! only matches TensorFlow's `SAME` mode for unit strides. These helpers reproduce the
//! TensorFlow arithmetic: the output size is `ceil(input / stride)` and any odd padding
//! goes to the bottom/right.

use burn::{prelude::*, tensor::ElementConversion};

/// Output size of a `SAME` convolution along one spatial dimension.
pub const fn same_output_size(size: usize, stride: usize) -> usize {
    size.div_ceil(stride)
}

/// Padding `(before, after)` a `SAME` convolution applies along one spatial dimension.
pub const fn same_padding(size: usize, kernel_size: usize, stride: usize) -> (usize, usize) {
    let out = same_output_size(size, stride);
    let total = (out.saturating_sub(1) * stride + kernel_size).saturating_sub(size);
    (total / 2, total - total / 2)
}

/// Zero-pads an NCHW tensor so that a `Valid` convolution with the given kernel and
/// stride produces the `SAME` output size.
pub fn pad_same<B: Backend>(
    x: Tensor<B, 4>,
    kernel_size: [usize; 2],
    stride: [usize; 2],
) -> Tensor<B, 4> {
    let [_, _, h, w] = x.dims();
    let (pad_t, pad_b) = same_padding(h, kernel_size[0], stride[0]);
    let (pad_l, pad_r) = same_padding(w, kernel_size[1], stride[1]);
    if pad_t + pad_b + pad_l + pad_r == 0 {
        return x;
    }
    x.pad((pad_l, pad_r, pad_t, pad_b), B::FloatElem::from_elem(0.0))
}

/// Leading crop a `SAME` transposed convolution applies to its full output.
///
/// The full (unpadded) transposed convolution of `size` inputs has
/// `(size - 1) * stride + kernel_size` outputs; TensorFlow removes
/// `max(full - out_size, 0) / 2` of them from the start.
pub const fn same_transpose_crop(
    size: usize,
    kernel_size: usize,
    stride: usize,
    out_size: usize,
) -> usize {
    let full = size.saturating_sub(1) * stride + kernel_size;
    full.saturating_sub(out_size) / 2
}

/// Crops (and, if needed, zero-extends) the full output of a transposed convolution
/// to `out_size`, following TensorFlow's `SAME` placement.
pub fn crop_transpose_same<B: Backend>(
    full: Tensor<B, 4>,
    input_size: [usize; 2],
    kernel_size: [usize; 2],
    stride: [usize; 2],
    out_size: [usize; 2],
) -> Tensor<B, 4> {
    let [n, c, full_h, full_w] = full.dims();
    let top = same_transpose_crop(input_size[0], kernel_size[0], stride[0], out_size[0]);
    let left = same_transpose_crop(input_size[1], kernel_size[1], stride[1], out_size[1]);
    let end_h = (top + out_size[0]).min(full_h);
    let end_w = (left + out_size[1]).min(full_w);

    let x = full.slice([0..n, 0..c, top..end_h, left..end_w]);
    let missing_h = out_size[0] - (end_h - top);
    let missing_w = out_size[1] - (end_w - left);
    if missing_h + missing_w == 0 {
        return x;
    }
    x.pad((0, missing_w, 0, missing_h), B::FloatElem::from_elem(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn same_padding_matches_tensorflow() {
        assert_eq!(same_padding(5, 3, 2), (1, 1));
        assert_eq!(same_padding(4, 3, 2), (0, 1));
        assert_eq!(same_padding(7, 1, 1), (0, 0));
        assert_eq!(same_padding(6, 5, 1), (2, 2));
        assert_eq!(same_padding(6, 4, 1), (1, 2));
        // Large strides with small kernels never need padding.
        assert_eq!(same_padding(8, 1, 4), (0, 0));
    }

    #[test]
    fn same_output_size_rounds_up() {
        assert_eq!(same_output_size(5, 2), 3);
        assert_eq!(same_output_size(4, 2), 2);
        assert_eq!(same_output_size(1, 3), 1);
    }

    #[test]
    fn pad_same_extends_bottom_right() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([1, 2, 4, 4], &device);
        let padded = pad_same(x, [3, 3], [2, 2]);

        assert_eq!(padded.dims(), [1, 2, 5, 5]);
        let corner = padded.clone().slice([0..1, 0..1, 4..5, 4..5]).into_scalar();
        let origin = padded.slice([0..1, 0..1, 0..1, 0..1]).into_scalar();
        assert_eq!(corner, 0.0);
        assert_eq!(origin, 1.0);
    }

    #[test]
    fn crop_transpose_same_yields_requested_size() {
        let device = Default::default();
        // in = 3, k = 3, s = 2 -> full = 7
        let full = Tensor::<TestBackend, 4>::ones([2, 1, 7, 7], &device);
        assert_eq!(
            crop_transpose_same(full.clone(), [3, 3], [3, 3], [2, 2], [6, 5]).dims(),
            [2, 1, 6, 5]
        );
        assert_eq!(same_transpose_crop(3, 3, 2, 6), 0);
        assert_eq!(same_transpose_crop(3, 3, 2, 5), 1);
    }

    #[test]
    fn crop_transpose_same_zero_extends_short_outputs() {
        let device = Default::default();
        // in = 2, k = 1, s = 3 -> full = 4, TensorFlow accepts out = 6
        let full = Tensor::<TestBackend, 4>::ones([1, 1, 4, 4], &device);
        let out = crop_transpose_same(full, [2, 2], [1, 1], [3, 3], [6, 6]);

        assert_eq!(out.dims(), [1, 1, 6, 6]);
        assert_eq!(out.sum().into_scalar(), 16.0);
    }
}
