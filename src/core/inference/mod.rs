//! ONNX Runtime integration.
//!
//! [`OrtInfer`] owns a single CPU session and exposes the tensor-in,
//! tensor-out call the segmentation model needs.

pub mod ort_infer;

pub use ort_infer::OrtInfer;
