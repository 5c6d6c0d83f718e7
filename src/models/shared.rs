//! A segmenter whose model is loaded on first use and kept for the process.

use super::cellpose::{CellposeConfig, CellposeModel, CellposeModelBuilder};
use super::segmenter::{ModelKind, Segmenter};
use crate::core::CellError;
use crate::domain::{LabelMask, MicroscopyImage};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{info, warn};

/// Lazily loads a [`CellposeModel`] and reuses it for every run.
///
/// Loading happens on the first call to [`Segmenter::segment`] (or
/// [`SharedSegmenter::model`]). A failed load leaves nothing cached, so a
/// later call tries again.
#[derive(Debug)]
pub struct SharedSegmenter {
    config: CellposeConfig,
    model: OnceCell<Arc<CellposeModel>>,
}

impl SharedSegmenter {
    /// Creates a segmenter that will load the model described by `config`.
    pub fn new(config: CellposeConfig) -> Self {
        Self {
            config,
            model: OnceCell::new(),
        }
    }

    /// Wraps an already loaded model.
    pub fn from_model(model: CellposeModel) -> Self {
        let config = model.config().clone();
        Self {
            config,
            model: OnceCell::with_value(Arc::new(model)),
        }
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Returns the model, loading it first if needed.
    pub fn model(&self) -> Result<Arc<CellposeModel>, CellError> {
        self.model
            .get_or_try_init(|| {
                info!("loading segmentation model {}", self.config.model_path.display());
                CellposeModelBuilder::new()
                    .config(self.config.clone())
                    .build(&self.config.model_path)
                    .map(Arc::new)
                    .inspect_err(|e| warn!("model load failed: {}", e))
            })
            .cloned()
    }
}

impl Segmenter for SharedSegmenter {
    fn segment(&self, image: &MicroscopyImage, kind: ModelKind) -> Result<LabelMask, CellError> {
        self.model()?.segment(image, kind)
    }
}
