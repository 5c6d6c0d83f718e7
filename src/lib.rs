//! # cell-count
//!
//! Segments the cells in a single microscopy image with a Cellpose-style ONNX
//! model, counts them, measures their mean area (in pixels and, when a pixel
//! size is known, in µm²) and renders an overlay of the detected objects.
//!
//! ## Features
//!
//! - Cellpose flow decoding on the CPU through ONNX Runtime
//! - 8/16-bit and float PNG, JPEG and TIFF input
//! - Background runs with cancellation, one run at a time per coordinator
//! - Mask, overlay, metrics JSON and per-cell CSV export
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, constants and the ONNX Runtime wrapper
//! * [`domain`] - Image, label mask and pixel size types
//! * [`models`] - The `Segmenter` seam and the Cellpose backend
//! * [`processors`] - Metrics, normalization, outlines and overlay rendering
//! * [`pipeline`] - The run coordinator, export and statistics
//! * [`utils`] - Image file I/O, visualization and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cell_count::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig {
//!     model: CellposeConfig::with_model_path("models/cyto.onnx"),
//!     ..PipelineConfig::default()
//! };
//! let coordinator = PipelineCoordinator::from_config(config)?;
//!
//! let request = PipelineRequest::from_path("plate_01.tif")
//!     .with_output_dir("results")
//!     .with_pixel_size(PixelSize::parse_lenient("0.65"));
//! let handle = coordinator.start(request)?;
//! let result = handle.wait()?;
//!
//! println!("{}", result.metrics.summary_line());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use cell_count::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{CellError, CellResult, PipelineStep};
    pub use crate::domain::{LabelMask, MicroscopyImage, PixelSize};
    pub use crate::models::{CellposeConfig, ModelKind, Segmenter, SharedSegmenter};
    pub use crate::pipeline::{
        PipelineConfig, PipelineCoordinator, PipelineRequest, PipelineResult, PipelineState,
        RunHandle,
    };
    pub use crate::processors::{MetricsResult, OverlayConfig, OverlayStyle, compute_metrics};
    pub use crate::utils::load_image;
}
