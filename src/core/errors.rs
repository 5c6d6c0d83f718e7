//! Error types for the cell counting pipeline.
//!
//! Every failure the pipeline can produce is a variant of [`CellError`]. Step
//! failures are wrapped at the coordinator boundary with the [`PipelineStep`]
//! that produced them, so callers always learn where a run stopped.
//!
//! # Usage
//!
//! ```rust
//! use cell_count::core::errors::{CellError, PipelineStep};
//!
//! let error = CellError::invalid_input("image has zero width");
//! let wrapped = error.in_step(PipelineStep::Segmentation);
//!
//! assert!(matches!(wrapped.root(), CellError::InvalidInput { .. }));
//! assert_eq!(wrapped.step(), Some(PipelineStep::Segmentation));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Steps of a pipeline run, used to tag errors with their origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStep {
    /// Checking the request and loading the input image.
    Validation,
    /// Running the segmentation model to produce a label mask.
    Segmentation,
    /// Deriving statistics from the mask.
    Metrics,
    /// Rendering the overlay image.
    Overlay,
    /// Writing artifacts to the output directory.
    Export,
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStep::Validation => write!(f, "validation"),
            PipelineStep::Segmentation => write!(f, "segmentation"),
            PipelineStep::Metrics => write!(f, "metrics"),
            PipelineStep::Overlay => write!(f, "overlay"),
            PipelineStep::Export => write!(f, "export"),
        }
    }
}

/// Errors produced by the segmentation-to-metrics pipeline.
#[derive(Error, Debug)]
pub enum CellError {
    /// The input image or request is malformed or unsupported.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// The segmentation model could not be loaded.
    #[error("model unavailable at '{model_path}': {reason}{suggestion}")]
    ModelUnavailable {
        /// Path of the model that failed to load.
        model_path: String,
        /// Why loading failed.
        reason: String,
        /// Optional hint, already prefixed with "; suggested fix: ".
        suggestion: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Inference failed on an input that passed validation.
    #[error("segmentation failed: {context}")]
    Segmentation {
        /// Additional context about the failure.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Image and mask disagree in spatial dimensions.
    #[error(
        "dimension mismatch: image is {}x{}, mask is {}x{}",
        .image.0,
        .image.1,
        .mask.0,
        .mask.1
    )]
    DimensionMismatch {
        /// Image (width, height).
        image: (u32, u32),
        /// Mask (width, height).
        mask: (u32, u32),
    },

    /// A run is already in flight on this coordinator.
    #[error("a pipeline run is already in progress")]
    Busy,

    /// The run was cancelled before it finished.
    #[error("pipeline run was cancelled")]
    Cancelled,

    /// A step of the pipeline failed.
    #[error("{step} step failed")]
    Pipeline {
        /// The step in which the failure occurred.
        step: PipelineStep,
        /// The error raised by the step.
        #[source]
        source: Box<CellError>,
    },

    /// A configuration value is invalid.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred while writing an image.
    #[error("image save to '{path}'")]
    ImageSave {
        /// Destination path.
        path: String,
        /// The underlying encoder error.
        #[source]
        source: image::ImageError,
    },

    /// Error from tensor shape handling.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// JSON (de)serialization error.
    #[error("serialization")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for pipeline operations.
pub type CellResult<T> = Result<T, CellError>;

/// Minimal string-backed error used as a source where no library error exists.
#[derive(Debug)]
pub struct SimpleError(String);

impl SimpleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SimpleError {}

impl CellError {
    /// Creates an `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a `ConfigError`.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a `ModelUnavailable` error.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path of the model that failed to load.
    /// * `reason` - Short description of the failure.
    /// * `suggestion` - Optional fix shown to the user.
    /// * `source` - Optional underlying error.
    pub fn model_unavailable(
        model_path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        let suggestion = suggestion
            .map(|s| format!("; suggested fix: {}", s))
            .unwrap_or_default();
        Self::ModelUnavailable {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            suggestion,
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates a `Segmentation` error from an underlying failure.
    pub fn segmentation(
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Segmentation {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a `Segmentation` error that has no underlying library error.
    pub fn segmentation_msg(context: impl Into<String>) -> Self {
        let context = context.into();
        Self::Segmentation {
            source: Box::new(SimpleError::new(context.clone())),
            context,
        }
    }

    /// Wraps this error with the pipeline step it came from.
    ///
    /// Errors that already carry a step, `Busy` and `Cancelled` are returned
    /// unchanged.
    pub fn in_step(self, step: PipelineStep) -> Self {
        match self {
            Self::Pipeline { .. } | Self::Busy | Self::Cancelled => self,
            other => Self::Pipeline {
                step,
                source: Box::new(other),
            },
        }
    }

    /// Returns the step this error is tagged with, if any.
    pub fn step(&self) -> Option<PipelineStep> {
        match self {
            Self::Pipeline { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Returns the innermost error, skipping step wrappers.
    pub fn root(&self) -> &CellError {
        match self {
            Self::Pipeline { source, .. } => source.root(),
            other => other,
        }
    }

    /// Renders the error and its source chain on one line for display.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(source) = current {
            message.push_str(": ");
            message.push_str(&source.to_string());
            current = source.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_step_wraps_once() {
        let error = CellError::invalid_input("empty image")
            .in_step(PipelineStep::Validation)
            .in_step(PipelineStep::Segmentation);

        assert_eq!(error.step(), Some(PipelineStep::Validation));
        assert!(matches!(error.root(), CellError::InvalidInput { .. }));
    }

    #[test]
    fn test_busy_and_cancelled_stay_unwrapped() {
        assert!(matches!(
            CellError::Busy.in_step(PipelineStep::Segmentation),
            CellError::Busy
        ));
        assert!(matches!(
            CellError::Cancelled.in_step(PipelineStep::Overlay),
            CellError::Cancelled
        ));
    }

    #[test]
    fn test_model_unavailable_message() {
        let error = CellError::model_unavailable(
            "models/cyto.onnx",
            "file not found",
            Some("download the cyto model"),
            None::<std::io::Error>,
        );
        let message = error.to_string();
        assert!(message.contains("models/cyto.onnx"));
        assert!(message.contains("suggested fix: download the cyto model"));
    }

    #[test]
    fn test_report_includes_source_chain() {
        let error = CellError::segmentation_msg("output tensor has 2 channels")
            .in_step(PipelineStep::Segmentation);
        let report = error.report();
        assert!(report.starts_with("segmentation step failed"));
        assert!(report.contains("output tensor has 2 channels"));
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let error = CellError::DimensionMismatch {
            image: (4, 3),
            mask: (2, 2),
        };
        assert_eq!(
            error.to_string(),
            "dimension mismatch: image is 4x3, mask is 2x2"
        );
    }

    #[test]
    fn test_step_display() {
        assert_eq!(PipelineStep::Overlay.to_string(), "overlay");
        assert_eq!(PipelineStep::Export.to_string(), "export");
    }
}
