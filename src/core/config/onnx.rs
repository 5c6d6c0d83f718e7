//! ONNX Runtime session settings.
//!
//! Inference is CPU-only, so the settings cover threading, graph
//! optimization and ORT's own log verbosity.

use serde::{Deserialize, Serialize};

/// Graph optimization level applied when the session is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrtGraphOptimizationLevel {
    DisableAll,
    #[default]
    Level1,
    Level2,
    Level3,
}

/// Session settings for the segmentation model.
///
/// Unset fields keep ONNX Runtime's own defaults, except the log level which
/// falls back to errors only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrtSessionConfig {
    /// Threads used inside a single operator.
    pub intra_threads: Option<usize>,
    /// Threads used to run independent operators concurrently.
    pub inter_threads: Option<usize>,
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
    /// ORT log severity (0=Verbose, 1=Info, 2=Warning, 3=Error, 4=Fatal).
    pub log_severity_level: Option<i32>,
}

impl OrtSessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }

    /// Sets ORT's log severity (0=Verbose ... 4=Fatal).
    pub fn with_log_severity_level(mut self, level: i32) -> Self {
        self.log_severity_level = Some(level);
        self
    }
}
