//! The cell counting pipeline.
//!
//! [`PipelineCoordinator`] drives segmentation, metrics, overlay rendering and
//! optional export for one image at a time on a background thread.

pub mod config;
pub mod coordinator;
pub mod export;
pub mod result;
pub mod stats;

pub use config::{ConfigLoader, PipelineConfig};
pub use coordinator::{CompletionCallback, PipelineCoordinator, RunHandle, RunOutcome};
pub use export::{ExportInput, ExportOptions, MetricsReport, export_artifacts};
pub use result::{ExportedArtifacts, ImageSource, PipelineRequest, PipelineResult, PipelineState};
pub use stats::{PipelineStats, StatsManager};
