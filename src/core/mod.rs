//! The core module of the pipeline.
//!
//! This module contains the fundamental components shared by every step:
//! - Configuration management
//! - Constants used throughout the pipeline
//! - Error handling
//! - ONNX Runtime inference engine integration
//! - Parameter validation helpers
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod validation;

pub use config::{ConfigValidator, OrtGraphOptimizationLevel, OrtSessionConfig};
pub use constants::*;
pub use errors::{CellError, CellResult, PipelineStep, SimpleError};
pub use inference::OrtInfer;
pub use validation::{
    validate_finite, validate_image_dimensions, validate_positive, validate_range,
    validate_tensor_shape,
};
