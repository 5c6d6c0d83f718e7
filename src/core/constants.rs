//! Constants used throughout the pipeline.
//!
//! Defaults for the Cellpose-style mask decoding follow the values the
//! reference cytoplasm model was trained and evaluated with.

/// Mean object diameter (pixels) the cytoplasm model was trained at.
pub const DEFAULT_DIAM_MEAN: f32 = 30.0;

/// Cell probability logit above which a pixel is considered foreground.
pub const DEFAULT_CELLPROB_THRESHOLD: f32 = 0.0;

/// Number of Euler steps used when following the predicted flows.
pub const DEFAULT_FLOW_ITERATIONS: usize = 200;

/// Masks with fewer pixels than this are discarded.
pub const DEFAULT_MIN_MASK_SIZE: usize = 15;

/// Masks covering more than this fraction of the image are discarded.
pub const DEFAULT_MAX_MASK_FRACTION: f32 = 0.4;

/// Network input sides are padded up to a multiple of this value.
pub const NETWORK_SIZE_DIVISOR: usize = 16;

/// Lower percentile mapped to 0 during intensity normalization.
pub const NORMALIZE_LOWER_PERCENTILE: f32 = 1.0;

/// Upper percentile mapped to 1 during intensity normalization.
pub const NORMALIZE_UPPER_PERCENTILE: f32 = 99.0;

/// Row count above which per-row image work is split across rayon threads.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// The maximum allowed tensor size.
///
/// Guards against absurd allocations when an image is upscaled for a small
/// configured diameter.
pub const MAX_TENSOR_SIZE: usize = 100_000_000;
