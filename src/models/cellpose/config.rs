//! Configuration for the Cellpose-style ONNX backend.

use crate::core::config::{ConfigValidator, OrtSessionConfig};
use crate::core::{
    CellError, DEFAULT_CELLPROB_THRESHOLD, DEFAULT_DIAM_MEAN, DEFAULT_FLOW_ITERATIONS,
    DEFAULT_MAX_MASK_FRACTION, DEFAULT_MIN_MASK_SIZE, validate_finite, validate_positive,
    validate_range,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings controlling model loading, preprocessing and mask decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellposeConfig {
    /// Path to the exported `.onnx` network.
    pub model_path: PathBuf,
    /// Input tensor name; the model's first input when `None`.
    pub input_name: Option<String>,
    /// Output tensor name; the model's first output when `None`.
    pub output_name: Option<String>,
    /// Cell probability logit above which a pixel is foreground.
    pub cellprob_threshold: f32,
    /// Number of flow-following steps.
    pub niter: usize,
    /// Minimum mask size in pixels.
    pub min_size: usize,
    /// Expected object diameter in pixels. `None` runs at native scale.
    pub diameter: Option<f32>,
    /// Diameter the network was trained at.
    pub diam_mean: f32,
    /// Masks covering more than this fraction of the image are dropped.
    pub max_mask_fraction: f32,
    /// ONNX Runtime session settings.
    pub ort_session: Option<OrtSessionConfig>,
}

impl Default for CellposeConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/cyto.onnx"),
            input_name: None,
            output_name: None,
            cellprob_threshold: DEFAULT_CELLPROB_THRESHOLD,
            niter: DEFAULT_FLOW_ITERATIONS,
            min_size: DEFAULT_MIN_MASK_SIZE,
            diameter: None,
            diam_mean: DEFAULT_DIAM_MEAN,
            max_mask_fraction: DEFAULT_MAX_MASK_FRACTION,
            ort_session: None,
        }
    }
}

impl CellposeConfig {
    /// Creates a configuration for the model at `model_path` with default settings.
    pub fn with_model_path(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Factor applied to the image before inference.
    ///
    /// 1.0 when no diameter is configured.
    pub fn rescale_factor(&self) -> f32 {
        match self.diameter {
            Some(diameter) if diameter > 0.0 => self.diam_mean / diameter,
            _ => 1.0,
        }
    }
}

impl ConfigValidator for CellposeConfig {
    fn validate(&self) -> Result<(), CellError> {
        validate_finite(self.cellprob_threshold, "cellprob_threshold")?;
        validate_positive(self.niter, "niter")?;
        validate_positive(self.diam_mean, "diam_mean")?;
        validate_range(self.max_mask_fraction, 0.0, 1.0, "max_mask_fraction")?;
        if let Some(diameter) = self.diameter {
            validate_finite(diameter, "diameter")?;
            validate_positive(diameter, "diameter")?;
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(CellError::config_error("model_path must not be empty"));
        }
        Ok(())
    }
}
