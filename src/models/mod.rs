//! Segmentation models.
//!
//! [`Segmenter`] is the seam between the pipeline and any model. The bundled
//! implementation is a Cellpose-style network on ONNX Runtime, usually used
//! through [`SharedSegmenter`] so the weights are loaded once.

pub mod cellpose;
pub mod segmenter;
pub mod shared;

pub use cellpose::{CellposeConfig, CellposeModel, CellposeModelBuilder};
pub use segmenter::{ModelKind, Segmenter};
pub use shared::SharedSegmenter;
