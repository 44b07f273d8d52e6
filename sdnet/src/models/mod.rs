//! # Model Architectures
//!
//! This module aggregates the SDNet architecture:
//!
//! - `modules`: Provides the neural network building blocks, such as convolution and
//!   transposed convolution blocks, the global context block, the squeezing dense
//!   stage, the shortcut and the logits head.
//! - `sdnet`: Defines the `SdNet` segmentation model assembled from those blocks.
//!
//! The components are re-exported for easy access from the parent `models` module.

pub mod modules;
pub mod sdnet;

pub use modules::*;
pub use sdnet::*;
