//! Configuration file loading for the pipeline.

use super::export::ExportOptions;
use crate::core::CellError;
use crate::core::config::{ConfigValidator, config_from_json_file, config_from_json_str};
use crate::models::{CellposeConfig, ModelKind};
use crate::processors::OverlayConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for a coordinator and the model it drives.
///
/// Every section is optional in JSON; missing values take their defaults.
///
/// ```json
/// {
///   "model": { "model_path": "models/cyto.onnx", "diameter": 30.0 },
///   "overlay": { "style": "fill_and_outline" },
///   "export": { "save_mask": true }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Segmentation model settings.
    pub model: CellposeConfig,
    /// Model family requested from the segmenter.
    pub model_kind: ModelKind,
    /// Overlay appearance.
    pub overlay: OverlayConfig,
    /// Artifacts written when a run has an output directory.
    pub export: ExportOptions,
}

impl ConfigValidator for PipelineConfig {
    fn validate(&self) -> Result<(), CellError> {
        self.model.validate()?;
        self.overlay.validate()
    }
}

/// Configuration loader for the pipeline
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates a JSON configuration file.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use cell_count::pipeline::ConfigLoader;
    /// use std::path::Path;
    ///
    /// let config = ConfigLoader::load_from_file(Path::new("cell_count.json"))?;
    /// # Ok::<(), cell_count::core::CellError>(())
    /// ```
    pub fn load_from_file(path: &Path) -> Result<PipelineConfig, CellError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => config_from_json_file(path),
            other => Err(CellError::config_error(format!(
                "unsupported config file extension: {:?}",
                other
            ))),
        }
    }

    /// Loads and validates a JSON configuration string.
    pub fn load_from_str(content: &str) -> Result<PipelineConfig, CellError> {
        config_from_json_str(content)
    }
}
