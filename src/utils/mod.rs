//! Utility functions for the pipeline.
//!
//! Image file input/output, optional visualization helpers, and logging setup.

pub mod image;
#[cfg(feature = "visualization")]
pub mod visualization;

pub use image::{load_image, save_gray16, save_rgb};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging. Calling it
/// again after a subscriber is installed has no effect.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
