use super::*;
use ndarray::{Array4, ArrayView4};
use ort::value::TensorRef;

impl OrtInfer {
    /// Runs the model on an NCHW tensor and returns its NCHW `f32` output.
    ///
    /// # Errors
    ///
    /// Runtime failures and unexpected output layouts are reported as
    /// [`CellError::Segmentation`].
    pub fn infer_4d(&self, x: &Array4<f32>) -> Result<Array4<f32>, CellError> {
        let input_shape = x.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            CellError::segmentation(
                format!(
                    "model '{}': failed to convert input tensor with shape {:?}",
                    self.model_name, input_shape
                ),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self.session.lock().map_err(|_| {
            CellError::segmentation_msg(format!(
                "model '{}': session lock poisoned by an earlier panic",
                self.model_name
            ))
        })?;

        let output_name = match &self.output_name {
            Some(name) => name.clone(),
            None => session
                .outputs
                .first()
                .map(|output| output.name.clone())
                .ok_or_else(|| {
                    CellError::segmentation_msg(format!(
                        "model '{}' declares no outputs",
                        self.model_name
                    ))
                })?,
        };

        let outputs = session.run(inputs).map_err(|e| {
            CellError::segmentation(
                format!(
                    "model '{}': forward pass failed for input '{}' with shape {:?}",
                    self.model_name, self.input_name, input_shape
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                CellError::segmentation(
                    format!("failed to extract output tensor '{}' as f32", output_name),
                    e,
                )
            })?;

        if output_shape.len() != 4 {
            return Err(CellError::segmentation_msg(format!(
                "model '{}': expected 4D output tensor, got {}D with shape {:?}",
                self.model_name,
                output_shape.len(),
                output_shape
            )));
        }

        let dims = (
            output_shape[0] as usize,
            output_shape[1] as usize,
            output_shape[2] as usize,
            output_shape[3] as usize,
        );
        let expected_len = dims.0 * dims.1 * dims.2 * dims.3;
        if output_data.len() != expected_len {
            return Err(CellError::segmentation_msg(format!(
                "output data size mismatch: expected {}, got {}",
                expected_len,
                output_data.len()
            )));
        }

        let array_view = ArrayView4::from_shape(dims, output_data)?;
        Ok(array_view.to_owned())
    }
}
