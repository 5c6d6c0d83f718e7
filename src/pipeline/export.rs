//! Writing run artifacts to an output directory.

use super::result::ExportedArtifacts;
use crate::core::CellError;
use crate::domain::{LabelMask, PixelSize};
use crate::processors::{MetricsResult, OverlayImage, PerLabelArea};
use crate::utils::{save_gray16, save_rgb};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which artifacts a run writes when it has an output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// `<stem>_masks.png`, 16-bit labels.
    pub save_mask: bool,
    /// `<stem>_overlay.png`.
    pub save_overlay: bool,
    /// `<stem>_metrics.json`.
    pub save_metrics: bool,
    /// `<stem>_cells.csv`, one row per object.
    pub save_cells_csv: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            save_mask: false,
            save_overlay: true,
            save_metrics: true,
            save_cells_csv: true,
        }
    }
}

/// Metrics file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Base name of the analysed image.
    pub image: String,
    /// µm per pixel, when calibrated.
    pub pixel_size_microns: Option<f64>,
    /// The computed statistics.
    #[serde(flatten)]
    pub metrics: MetricsResult,
}

/// Data available to the export step.
#[derive(Debug, Clone, Copy)]
pub struct ExportInput<'a> {
    /// Base name for the files.
    pub stem: &'a str,
    /// Segmentation mask.
    pub mask: &'a LabelMask,
    /// Summary statistics.
    pub metrics: &'a MetricsResult,
    /// Per-object areas.
    pub cells: &'a [PerLabelArea],
    /// Rendered overlay.
    pub overlay: &'a OverlayImage,
    /// Calibration used for the metrics.
    pub pixel_size: Option<PixelSize>,
}

/// Writes the artifacts selected by `options` into `dir`.
///
/// Existing files with the same names are overwritten. When any artifact
/// fails, the files written by this call are removed again so a failed run
/// leaves no partial export behind.
pub fn export_artifacts(
    dir: &Path,
    input: &ExportInput<'_>,
    options: &ExportOptions,
) -> Result<ExportedArtifacts, CellError> {
    let mut artifacts = ExportedArtifacts::default();
    if let Err(e) = write_artifacts(dir, input, options, &mut artifacts) {
        for path in artifacts.paths() {
            if let Err(remove_error) = fs::remove_file(path) {
                warn!("failed to remove {}: {}", path.display(), remove_error);
            }
        }
        return Err(e);
    }

    for path in artifacts.paths() {
        info!("Saved {}", path.display());
    }
    Ok(artifacts)
}

fn write_artifacts(
    dir: &Path,
    input: &ExportInput<'_>,
    options: &ExportOptions,
    artifacts: &mut ExportedArtifacts,
) -> Result<(), CellError> {
    let target = |suffix: &str| -> PathBuf { dir.join(format!("{}_{}", input.stem, suffix)) };

    if options.save_mask {
        let path = target("masks.png");
        save_gray16(&input.mask.to_gray16()?, &path)?;
        artifacts.mask = Some(path);
    }

    if options.save_overlay {
        let path = target("overlay.png");
        save_rgb(input.overlay, &path)?;
        artifacts.overlay = Some(path);
    }

    if options.save_metrics {
        let path = target("metrics.json");
        let report = MetricsReport {
            image: input.stem.to_string(),
            pixel_size_microns: input.pixel_size.map(PixelSize::microns),
            metrics: *input.metrics,
        };
        let mut writer = BufWriter::new(File::create(&path)?);
        artifacts.metrics_json = Some(path);
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writer.flush()?;
    }

    if options.save_cells_csv {
        let path = target("cells.csv");
        write_cells_csv(&path, input.cells)?;
        artifacts.cells_csv = Some(path);
    }
    Ok(())
}

fn write_cells_csv(path: &Path, cells: &[PerLabelArea]) -> Result<(), CellError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "label,area_pixels,area_microns")?;
    for cell in cells {
        match cell.area_microns {
            Some(microns) => writeln!(writer, "{},{},{}", cell.label, cell.area_pixels, microns)?,
            None => writeln!(writer, "{},{},", cell.label, cell.area_pixels)?,
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{compute_metrics, per_label_areas};
    use image::RgbImage;

    fn write_all(dir: &Path, options: &ExportOptions) -> ExportedArtifacts {
        let mask = LabelMask::from_rows(&[vec![0, 1], vec![1, 2]]).unwrap();
        let pixel_size = Some(PixelSize::new(0.5).unwrap());
        let metrics = compute_metrics(&mask, pixel_size);
        let cells = per_label_areas(&mask, pixel_size);
        let overlay = RgbImage::new(2, 2);
        let input = ExportInput {
            stem: "sample",
            mask: &mask,
            metrics: &metrics,
            cells: &cells,
            overlay: &overlay,
            pixel_size,
        };
        export_artifacts(dir, &input, options).unwrap()
    }

    #[test]
    fn test_default_options_skip_mask() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = write_all(dir.path(), &ExportOptions::default());

        assert_eq!(artifacts.mask, None);
        assert!(dir.path().join("sample_overlay.png").is_file());
        assert!(dir.path().join("sample_metrics.json").is_file());
        assert!(dir.path().join("sample_cells.csv").is_file());
        assert!(!dir.path().join("sample_masks.png").exists());
    }

    #[test]
    fn test_mask_roundtrips_through_png() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            save_mask: true,
            ..ExportOptions::default()
        };
        let artifacts = write_all(dir.path(), &options);
        let path = artifacts.mask.unwrap();

        let decoded = image::open(&path).unwrap().into_luma16();
        let mask = LabelMask::from_gray16(&decoded).unwrap();
        assert_eq!(mask, LabelMask::from_rows(&[vec![0, 1], vec![1, 2]]).unwrap());
    }

    #[test]
    fn test_metrics_json_contents() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = write_all(dir.path(), &ExportOptions::default());
        let text = std::fs::read_to_string(artifacts.metrics_json.unwrap()).unwrap();
        let report: MetricsReport = serde_json::from_str(&text).unwrap();

        assert_eq!(report.image, "sample");
        assert_eq!(report.pixel_size_microns, Some(0.5));
        assert_eq!(report.metrics.cell_count, 2);
        assert_eq!(report.metrics.mean_area_microns, Some(0.375));
    }

    #[test]
    fn test_cells_csv_contents() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = write_all(dir.path(), &ExportOptions::default());
        let text = std::fs::read_to_string(artifacts.cells_csv.unwrap()).unwrap();
        assert_eq!(text, "label,area_pixels,area_microns\n1,2,0.5\n2,1,0.25\n");
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mask = LabelMask::background(1, 1).unwrap();
        let metrics = compute_metrics(&mask, None);
        let overlay = RgbImage::new(1, 1);
        let input = ExportInput {
            stem: "x",
            mask: &mask,
            metrics: &metrics,
            cells: &[],
            overlay: &overlay,
            pixel_size: None,
        };
        let result = export_artifacts(&dir.path().join("gone"), &input, &ExportOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_export_removes_written_files() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the CSV makes the last artifact fail.
        std::fs::create_dir(dir.path().join("x_cells.csv")).unwrap();

        let mask = LabelMask::from_rows(&[vec![0, 1], vec![1, 2]]).unwrap();
        let metrics = compute_metrics(&mask, None);
        let cells = per_label_areas(&mask, None);
        let overlay = RgbImage::new(2, 2);
        let input = ExportInput {
            stem: "x",
            mask: &mask,
            metrics: &metrics,
            cells: &cells,
            overlay: &overlay,
            pixel_size: None,
        };
        let options = ExportOptions {
            save_mask: true,
            ..ExportOptions::default()
        };

        assert!(export_artifacts(dir.path(), &input, &options).is_err());
        assert!(!dir.path().join("x_masks.png").exists());
        assert!(!dir.path().join("x_overlay.png").exists());
        assert!(!dir.path().join("x_metrics.json").exists());
        assert!(dir.path().join("x_cells.csv").is_dir());
    }
}
