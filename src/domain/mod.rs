//! Domain types flowing through the pipeline.
//!
//! - [`MicroscopyImage`]: the immutable input image
//! - [`LabelMask`]: the integer mask produced by segmentation
//! - [`PixelSize`]: optional physical calibration

pub mod image;
pub mod mask;
pub mod pixel_size;

pub use image::{MicroscopyImage, SampleFormat};
pub use mask::{Gray16Image, LabelMask};
pub use pixel_size::PixelSize;
