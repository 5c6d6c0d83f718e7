//! Run requests, run states and run results.

use crate::domain::{LabelMask, MicroscopyImage, PixelSize};
use crate::models::ModelKind;
use crate::processors::{MetricsResult, OverlayImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle state of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    /// No run has started since creation or the last reset.
    Idle,
    /// A run is in flight.
    Running,
    /// The last run finished successfully.
    Completed,
    /// The last run failed or was cancelled.
    Failed,
}

impl PipelineState {
    /// Whether the state accepts a new run.
    pub fn accepts_new_run(self) -> bool {
        !matches!(self, PipelineState::Running)
    }

    /// Whether a run has finished (successfully or not).
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed)
    }
}

/// Where the input image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An image file on disk.
    Path(PathBuf),
    /// An image already in memory, with a name used for exported files.
    InMemory {
        /// The image.
        image: Arc<MicroscopyImage>,
        /// Base name for exported files.
        name: String,
    },
}

impl ImageSource {
    /// Base name used for exported files: the file stem, or the given name.
    pub fn stem(&self) -> String {
        match self {
            ImageSource::Path(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string()),
            ImageSource::InMemory { name, .. } => name.clone(),
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::InMemory { name, .. } => format!("<memory:{}>", name),
        }
    }
}

/// Everything needed to start one run.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Input image.
    pub source: ImageSource,
    /// Directory receiving exported artifacts; nothing is written when `None`.
    pub output_dir: Option<PathBuf>,
    /// Physical pixel size, if known.
    pub pixel_size: Option<PixelSize>,
    /// Model to run; the coordinator's configured kind when `None`.
    pub model_kind: Option<ModelKind>,
}

impl PipelineRequest {
    /// Request for an image file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(ImageSource::Path(path.into()))
    }

    /// Request for an in-memory image.
    pub fn from_image(image: MicroscopyImage, name: impl Into<String>) -> Self {
        Self::new(ImageSource::InMemory {
            image: Arc::new(image),
            name: name.into(),
        })
    }

    fn new(source: ImageSource) -> Self {
        Self {
            source,
            output_dir: None,
            pixel_size: None,
            model_kind: None,
        }
    }

    /// Sets the export directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Sets the pixel size.
    pub fn with_pixel_size(mut self, pixel_size: Option<PixelSize>) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    /// Sets the model kind.
    pub fn with_model_kind(mut self, kind: ModelKind) -> Self {
        self.model_kind = Some(kind);
        self
    }
}

/// Files written by the export step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedArtifacts {
    /// 16-bit label mask PNG.
    pub mask: Option<PathBuf>,
    /// Overlay PNG.
    pub overlay: Option<PathBuf>,
    /// Metrics JSON.
    pub metrics_json: Option<PathBuf>,
    /// Per-cell areas CSV.
    pub cells_csv: Option<PathBuf>,
}

impl ExportedArtifacts {
    /// Every written path.
    pub fn paths(&self) -> Vec<&Path> {
        [&self.mask, &self.overlay, &self.metrics_json, &self.cells_csv]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect()
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Segmentation mask.
    pub mask: LabelMask,
    /// Count and area statistics.
    pub metrics: MetricsResult,
    /// Rendered overlay.
    pub overlay: OverlayImage,
    /// Files written by the export step.
    pub artifacts: ExportedArtifacts,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SampleFormat;
    use ndarray::Array2;

    #[test]
    fn test_state_transitions_allowed() {
        assert!(PipelineState::Idle.accepts_new_run());
        assert!(PipelineState::Completed.accepts_new_run());
        assert!(PipelineState::Failed.accepts_new_run());
        assert!(!PipelineState::Running.accepts_new_run());
        assert!(!PipelineState::Idle.is_terminal());
        assert!(PipelineState::Failed.is_terminal());
    }

    #[test]
    fn test_source_stem() {
        let path = ImageSource::Path(PathBuf::from("/data/plate_01.tif"));
        assert_eq!(path.stem(), "plate_01");

        let image = MicroscopyImage::from_gray(Array2::zeros((2, 2)), SampleFormat::U8).unwrap();
        let request = PipelineRequest::from_image(image, "well_b3");
        assert_eq!(request.source.stem(), "well_b3");
        assert_eq!(request.model_kind, None);
        let request = request.with_model_kind(ModelKind::Cyto);
        assert_eq!(request.model_kind, Some(ModelKind::Cyto));
    }

    #[test]
    fn test_artifact_paths() {
        let artifacts = ExportedArtifacts {
            overlay: Some(PathBuf::from("out/a_overlay.png")),
            ..ExportedArtifacts::default()
        };
        assert_eq!(artifacts.paths(), vec![Path::new("out/a_overlay.png")]);
    }
}
