//! Cell Count Example
//!
//! Segments the cells in one microscopy image, prints the count and mean area,
//! and writes the overlay and metrics into an output folder.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example cell_count -- [OPTIONS] --model-path <MODEL> <IMAGE>
//! ```
//!
//! # Arguments
//!
//! * `-m, --model-path` - Path to the Cellpose ONNX model
//! * `-o, --output-dir` - Folder receiving the overlay, metrics and (optionally) mask
//! * `-p, --pixel-size` - Pixel size in µm/pixel; ignored when not a positive number
//! * `-c, --config` - JSON configuration file
//! * `<IMAGE>` - Image to analyse
//!
//! # Example
//!
//! ```bash
//! cargo run --example cell_count -- -m models/cyto.onnx -o results/ -p 0.65 plate_01.tif
//! ```

use cell_count::pipeline::ConfigLoader;
use cell_count::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Command-line arguments for the cell count example
#[derive(Parser)]
#[command(name = "cell_count")]
#[command(about = "Cell Count Example - segments cells and reports count and mean area")]
struct Args {
    /// Path to the Cellpose ONNX model
    #[arg(short, long)]
    model_path: Option<PathBuf>,

    /// Image to analyse
    image: PathBuf,

    /// Folder receiving exported artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Pixel size in µm/pixel
    #[arg(short, long)]
    pixel_size: Option<String>,

    /// Expected cell diameter in pixels (native scale when omitted)
    #[arg(long)]
    diameter: Option<f32>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also save the 16-bit label mask
    #[arg(long)]
    save_mask: bool,

    /// Write a side-by-side panel next to the overlay
    #[cfg(feature = "visualization")]
    #[arg(long)]
    panel: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    cell_count::utils::init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(model_path) = &args.model_path {
        config.model.model_path = model_path.clone();
    }
    if args.diameter.is_some() {
        config.model.diameter = args.diameter;
    }
    if args.save_mask {
        config.export.save_mask = true;
    }

    let pixel_size = args.pixel_size.as_deref().and_then(|text| {
        let parsed = PixelSize::parse_lenient(text);
        if parsed.is_none() {
            warn!("Ignoring pixel size '{}': not a positive number", text);
        }
        parsed
    });

    info!("Model: {}", config.model.model_path.display());
    let coordinator = PipelineCoordinator::from_config(config)?;

    let mut request = PipelineRequest::from_path(&args.image).with_pixel_size(pixel_size);
    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
        request = request.with_output_dir(dir);
    }

    let handle = coordinator.start(request)?;
    let result = match handle.wait() {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e.report());
            return Err(e.into());
        }
    };

    println!("{}", result.metrics.summary_line());
    for path in result.artifacts.paths() {
        println!("Saved {}", path.display());
    }

    #[cfg(feature = "visualization")]
    {
        if args.panel
            && let Some(dir) = &args.output_dir
        {
            write_panel(&args.image, dir, &result)?;
        }
    }

    info!("{}", coordinator.stats());
    Ok(())
}

#[cfg(feature = "visualization")]
fn write_panel(
    image_path: &std::path::Path,
    dir: &std::path::Path,
    result: &PipelineResult,
) -> Result<(), Box<dyn std::error::Error>> {
    use cell_count::utils::visualization::{VisualizationConfig, create_side_by_side};

    let image = load_image(image_path)?;
    let vis_config = VisualizationConfig::with_system_font();
    let summary = result.metrics.summary_line();
    let panel = create_side_by_side(&image, &result.overlay, Some(&summary), &vis_config)?;
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let path = dir.join(format!("{}_panel.png", stem));
    cell_count::utils::save_rgb(&panel, &path)?;
    println!("Saved {}", path.display());
    Ok(())
}
