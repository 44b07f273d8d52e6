//! Squeeze-dense segmentation network building blocks for Burn.
//!
//! Gradient checkpointing is chosen at the backend level: train on
//! `Autodiff<B, BalancedCheckpointing>` to recompute activations during the backward
//! pass instead of storing them.
//!
//! Training needs the `std` feature (enabled by default): batch normalization tracks its
//! running statistics per thread.

mod config;
mod error;
mod models;


pub use config::*;
pub use error::{SdNetError, SdNetResult};
pub use models::*;
