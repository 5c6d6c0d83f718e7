use super::*;
use crate::core::config::{OrtGraphOptimizationLevel, OrtSessionConfig};
use ort::logging::LogLevel;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use std::path::Path;
use tracing::debug;

const LOAD_SUGGESTION: &str = "verify the model path and that the file is a valid ONNX export";

impl OrtInfer {
    /// Loads a model with default ONNX Runtime settings.
    pub fn new(model_path: impl AsRef<Path>, input_name: Option<&str>) -> Result<Self, CellError> {
        Self::from_config(model_path, None, input_name, None)
    }

    /// Loads a model, applying the optional session configuration.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to the `.onnx` file.
    /// * `ort_config` - Threading/optimization settings; `None` keeps ORT defaults.
    /// * `input_name` - Name of the input tensor; the model's first input when `None`.
    /// * `output_name` - Name of the output tensor; the model's first output when `None`.
    ///
    /// # Errors
    ///
    /// Every failure is reported as [`CellError::ModelUnavailable`].
    pub fn from_config(
        model_path: impl AsRef<Path>,
        ort_config: Option<&OrtSessionConfig>,
        input_name: Option<&str>,
        output_name: Option<&str>,
    ) -> Result<Self, CellError> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(CellError::model_unavailable(
                path,
                "model file not found",
                Some(LOAD_SUGGESTION),
                None::<ort::Error>,
            ));
        }

        let builder = Session::builder().map_err(|e| load_error(path, e))?;
        let builder = match ort_config {
            Some(cfg) => Self::apply_ort_config(builder, cfg),
            None => builder.with_log_level(LogLevel::Error),
        }
        .map_err(|e| load_error(path, e))?;
        let session = builder
            .commit_from_file(path)
            .map_err(|e| load_error(path, e))?;

        let input_name = match input_name {
            Some(name) => name.to_string(),
            None => session
                .inputs
                .first()
                .map(|input| input.name.clone())
                .ok_or_else(|| {
                    CellError::model_unavailable(
                        path,
                        "model declares no inputs",
                        Some(LOAD_SUGGESTION),
                        None::<ort::Error>,
                    )
                })?,
        };

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        debug!(
            "Loaded ONNX model '{}' from {} (input '{}')",
            model_name,
            path.display(),
            input_name
        );

        Ok(OrtInfer {
            session: Mutex::new(session),
            input_name,
            output_name: output_name.map(|s| s.to_string()),
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        if let Some(threads) = cfg.intra_threads {
            builder = builder.with_intra_threads(threads)?;
        }
        if let Some(threads) = cfg.inter_threads {
            builder = builder.with_inter_threads(threads)?;
        }
        if let Some(level) = cfg.optimization_level {
            let level = match level {
                OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
                OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
                OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
                OrtGraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
            };
            builder = builder.with_optimization_level(level)?;
        }
        let log_level = match cfg.log_severity_level.unwrap_or(3) {
            i32::MIN..=0 => LogLevel::Verbose,
            1 => LogLevel::Info,
            2 => LogLevel::Warning,
            3 => LogLevel::Error,
            _ => LogLevel::Fatal,
        };
        builder.with_log_level(log_level)
    }
}

fn load_error(path: &Path, error: ort::Error) -> CellError {
    CellError::model_unavailable(
        path,
        "failed to create ONNX session",
        Some(LOAD_SUGGESTION),
        Some(error),
    )
}
