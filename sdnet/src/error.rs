use thiserror::Error;

/// The error type for `SDNet-Burn` operations.
///
/// Shape errors that only Burn itself can detect (for example a convolution receiving
/// the wrong channel count) still surface as framework panics; this enum covers the
/// checks the blocks perform on their own.
#[derive(Error, Debug)]
pub enum SdNetError {
    /// Error for when an invalid model or block configuration is provided.
    /// This can happen if configuration parameters are logically inconsistent.
    #[error("Invalid model configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error for when an input tensor has an invalid shape.
    #[error("Invalid input tensor shape: expected {expected}, got {actual}")]
    InvalidTensorShape {
        /// The expected tensor shape.
        expected: String,
        /// The actual tensor shape.
        actual: String,
    },

    /// Error for when loading model weights fails.
    #[error("Failed to load weights: {reason}")]
    WeightLoadingFailed {
        /// The reason for the weight loading failure.
        reason: String,
    },
}

/// A specialized `Result` type for `SDNet-Burn` operations.
pub type SdNetResult<T> = Result<T, SdNetError>;

impl SdNetError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}
