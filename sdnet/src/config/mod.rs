//! Configuration module for SDNet.
//!
//! This module provides configuration structures and enums for the SDNet model.
//! It is organized into two main submodules:
//! - `core`: Contains the main configuration structures
//! - `enums`: Contains all enumeration types used in configurations

pub mod core;
pub mod enums;

// Re-export all configuration structures from core
pub use core::{
    BlockConfig, DecoderConfig, EncoderConfig, EncoderStageConfig, HeadConfig, ModelConfig,
    StemConfig,
};

// Re-export all enums from enums
pub use enums::{ModelPreset, UpsampleMode};
