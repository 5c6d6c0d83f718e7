//! Processing steps applied around segmentation.
//!
//! # Modules
//!
//! * `metrics` - Cell count and area statistics from a label mask
//! * `normalization` - Intensity normalization for model input and display
//! * `outlines` - Object boundary extraction
//! * `overlay` - Rendering of masks over the original image

pub mod metrics;
pub mod normalization;
pub mod outlines;
pub mod overlay;

pub use metrics::{MetricsResult, PerLabelArea, compute_metrics, per_label_areas};
pub use normalization::{normalize_percentile, percentile, to_display_u8};
pub use outlines::masks_to_outlines;
pub use overlay::{DEFAULT_PALETTE, OverlayConfig, OverlayImage, OverlayStyle, render_overlay};
