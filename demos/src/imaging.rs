//! Image conversion utilities for the segmentation demo.

use std::path::Path;

use anyhow::{Context, Result};
use burn::tensor::{backend::Backend, Int, Tensor, TensorData};
use image::{imageops::FilterType, DynamicImage, GenericImageView, GrayImage};

/// Loads an image as a `[1, channels, height, width]` tensor in `[0, 1]`.
///
/// `channels` must be 1 (grayscale) or 3 (RGB). With `size`, the image is resized to
/// `size x size` first.
pub fn load_image<B: Backend>(
    path: &Path,
    channels: usize,
    size: Option<u32>,
    device: &B::Device,
) -> Result<Tensor<B, 4>> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image at {}", path.display()))?;
    let img = match size {
        Some(size) => img.resize_exact(size, size, FilterType::Triangle),
        None => img,
    };
    dynamic_image_to_tensor(img, channels, device)
}

/// Converts an image to a `[1, channels, height, width]` tensor in `[0, 1]`.
pub fn dynamic_image_to_tensor<B: Backend>(
    img: DynamicImage,
    channels: usize,
    device: &B::Device,
) -> Result<Tensor<B, 4>> {
    let (width, height) = img.dimensions();
    let buf = match channels {
        1 => img.to_luma32f().into_raw(),
        3 => img.into_rgb32f().into_raw(),
        _ => anyhow::bail!("Unsupported channel count: {}", channels),
    };

    let data = TensorData::new(buf, [height as usize, width as usize, channels])
        .convert::<B::FloatElem>();
    let tensor = Tensor::<B, 3>::from_data(data, device);

    // Permute to [channels, height, width] and add batch dimension
    Ok(tensor.permute([2, 0, 1]).unsqueeze::<4>())
}

/// Turns a `[height, width]` class map into a grayscale image.
///
/// With `scale`, class indices are spread over `0..=255`; otherwise they are written
/// as-is.
pub fn class_map_to_image<B: Backend>(
    classes: Tensor<B, 2, Int>,
    num_classes: usize,
    scale: bool,
) -> Result<GrayImage> {
    let [height, width] = classes.dims();
    let values = classes
        .float()
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Failed to read class map: {:?}", e))?;

    let step = if scale {
        255.0 / num_classes.saturating_sub(1).max(1) as f32
    } else {
        1.0
    };
    let pixels = values
        .into_iter()
        .map(|class| (class * step).round().clamp(0.0, 255.0) as u8)
        .collect();

    GrayImage::from_raw(width as u32, height as u32, pixels)
        .context("Failed to create grayscale image buffer")
}
