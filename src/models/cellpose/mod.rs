//! Cellpose-style cell segmentation model.
//!
//! The network predicts, for every pixel, a flow vector pointing towards the
//! centre of the cell the pixel belongs to and a cell probability. Masks are
//! recovered by following the flows (see [`dynamics`]).

pub mod config;
pub mod dynamics;
pub mod preprocess;

pub use config::CellposeConfig;
pub use dynamics::DynamicsParams;
pub use preprocess::{InputGeometry, NetworkOutput};

use crate::core::config::ConfigValidator;
use crate::core::inference::OrtInfer;
use crate::core::{CellError, validate_image_dimensions};
use crate::domain::{LabelMask, MicroscopyImage};
use crate::models::segmenter::{ModelKind, Segmenter};
use ndarray::Array4;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Cellpose network running on ONNX Runtime.
#[derive(Debug)]
pub struct CellposeModel {
    /// ONNX Runtime inference engine
    inference: OrtInfer,
    /// Preprocessing and decoding settings
    config: CellposeConfig,
}

impl CellposeModel {
    /// Creates a model from a loaded engine and its settings.
    pub fn new(inference: OrtInfer, config: CellposeConfig) -> Self {
        Self { inference, config }
    }

    /// Settings this model was built with.
    pub fn config(&self) -> &CellposeConfig {
        &self.config
    }

    /// Builds the network input for an image.
    pub fn preprocess(
        &self,
        image: &MicroscopyImage,
    ) -> Result<(Array4<f32>, InputGeometry), CellError> {
        let (width, height) = image.dimensions();
        validate_image_dimensions(width, height, "cellpose")?;
        let (tensor, geometry) = preprocess::prepare_input(image, self.config.rescale_factor())?;
        debug!(
            "input tensor {:?} (image {}x{}, scaled {}x{})",
            tensor.shape(),
            width,
            height,
            geometry.scaled.1,
            geometry.scaled.0
        );
        Ok((tensor, geometry))
    }

    /// Runs the network.
    pub fn infer(&self, tensor: &Array4<f32>) -> Result<Array4<f32>, CellError> {
        self.inference.infer_4d(tensor)
    }

    /// Turns raw predictions into a label mask at image resolution.
    pub fn postprocess(
        &self,
        predictions: &Array4<f32>,
        geometry: &InputGeometry,
    ) -> Result<LabelMask, CellError> {
        decode_predictions(predictions, geometry, &self.config)
    }

    /// Runs the complete forward pass: preprocess -> infer -> postprocess.
    pub fn forward(&self, image: &MicroscopyImage) -> Result<LabelMask, CellError> {
        let started = Instant::now();
        let (tensor, geometry) = self.preprocess(image)?;
        let predictions = self.infer(&tensor)?;
        let mask = self.postprocess(&predictions, &geometry)?;
        info!(
            "segmented {}x{} image into {} objects in {:.2?}",
            image.width(),
            image.height(),
            mask.max_label(),
            started.elapsed()
        );
        Ok(mask)
    }
}

/// Decodes a raw `[1, 3, H, W]` network output into a label mask at the
/// original image resolution.
///
/// Objects split by the decoding are separated, and pieces smaller than
/// `min_size` are dropped so every remaining label is one connected cell.
pub fn decode_predictions(
    predictions: &Array4<f32>,
    geometry: &InputGeometry,
    config: &CellposeConfig,
) -> Result<LabelMask, CellError> {
    let output = preprocess::unpack_output(predictions, geometry)?;
    let params = DynamicsParams {
        cellprob_threshold: config.cellprob_threshold,
        niter: config.niter,
        min_size: config.min_size,
        max_mask_fraction: config.max_mask_fraction,
    };
    let labels = dynamics::compute_masks(&output, &params);
    Ok(LabelMask::new(labels)?
        .relabel_connected()
        .remove_small_objects(config.min_size))
}

impl Segmenter for CellposeModel {
    fn segment(&self, image: &MicroscopyImage, kind: ModelKind) -> Result<LabelMask, CellError> {
        match kind {
            ModelKind::Cyto => self.forward(image),
        }
    }
}

/// Builder for [`CellposeModel`].
#[derive(Debug, Clone, Default)]
pub struct CellposeModelBuilder {
    config: CellposeConfig,
}

impl CellposeModelBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: CellposeConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the expected object diameter in pixels.
    pub fn diameter(mut self, diameter: f32) -> Self {
        self.config.diameter = Some(diameter);
        self
    }

    /// Sets the cell probability threshold.
    pub fn cellprob_threshold(mut self, threshold: f32) -> Self {
        self.config.cellprob_threshold = threshold;
        self
    }

    /// Sets the minimum mask size in pixels.
    pub fn min_size(mut self, min_size: usize) -> Self {
        self.config.min_size = min_size;
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn with_ort_config(mut self, config: crate::core::config::OrtSessionConfig) -> Self {
        self.config.ort_session = Some(config);
        self
    }

    /// Loads the network at `model_path` and builds the model.
    ///
    /// # Errors
    ///
    /// [`CellError::InvalidInput`] for invalid settings, [`CellError::ModelUnavailable`]
    /// when the network cannot be loaded.
    pub fn build(mut self, model_path: &Path) -> Result<CellposeModel, CellError> {
        self.config.model_path = model_path.to_path_buf();
        self.config.validate()?;

        let inference = OrtInfer::from_config(
            model_path,
            self.config.ort_session.as_ref(),
            self.config.input_name.as_deref(),
            self.config.output_name.as_deref(),
        )?;
        info!("loaded cellpose model from {}", model_path.display());

        Ok(CellposeModel::new(inference, self.config))
    }
}
