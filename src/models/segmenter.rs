//! The mask producer abstraction.

use crate::core::CellError;
use crate::domain::{LabelMask, MicroscopyImage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pretrained model families a [`Segmenter`] can be asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// General cytoplasm model.
    #[default]
    Cyto,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Cyto => write!(f, "cyto"),
        }
    }
}

/// Turns an image into a label mask.
///
/// Implementations must be deterministic for identical weights and input and
/// must return a mask with the image's spatial dimensions.
///
/// # Errors
///
/// - [`CellError::InvalidInput`] for images the model cannot take
/// - [`CellError::ModelUnavailable`] when weights cannot be loaded
/// - [`CellError::Segmentation`] when inference fails on valid input
pub trait Segmenter: Send + Sync {
    /// Segments `image` with the model selected by `kind`.
    fn segment(&self, image: &MicroscopyImage, kind: ModelKind) -> Result<LabelMask, CellError>;
}

impl<S: Segmenter + ?Sized> Segmenter for std::sync::Arc<S> {
    fn segment(&self, image: &MicroscopyImage, kind: ModelKind) -> Result<LabelMask, CellError> {
        (**self).segment(image, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_serde_name() {
        assert_eq!(serde_json::to_string(&ModelKind::Cyto).unwrap(), "\"cyto\"");
        let kind: ModelKind = serde_json::from_str("\"cyto\"").unwrap();
        assert_eq!(kind, ModelKind::Cyto);
        assert_eq!(ModelKind::default().to_string(), "cyto");
    }
}
