//! Configuration management for the pipeline.
//!
//! This module provides the validation trait shared by all configuration
//! types, JSON loading helpers, and the ONNX Runtime session configuration.

pub mod onnx;
pub mod validator;

pub use onnx::{OrtGraphOptimizationLevel, OrtSessionConfig};
pub use validator::{ConfigValidator, config_from_json_file, config_from_json_str};
