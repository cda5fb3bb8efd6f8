// Frontal licence plate candidate detection without deep learning: only
// classical image processing. This binary reads one image, runs the detection
// pipeline with the plate-size filter and prints every candidate box.

use clap::Parser;
use plate_vision::core_modules::input::read_image_file;
use plate_vision::core_modules::utils::image_helper::image_helper::save_raster;
use plate_vision::{BoxList, DetectionPipeline, PipelineConfig, PipelineError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "plate_vision")]
#[command(about = "Find licence-plate candidate regions in an image")]
#[command(version)]
struct Cli {
    /// Input image (any format the image crate can decode).
    #[arg(default_value = "samples/plate.jpg")]
    image: PathBuf,

    /// JSON pipeline configuration; missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Binarization threshold in (0, 1).
    #[arg(long)]
    threshold: Option<f32>,

    /// Number of 3x3 dilation passes.
    #[arg(long)]
    dilations: Option<u32>,

    /// Skip the Gaussian blur before edge detection.
    #[arg(long)]
    no_reduce_noise: bool,

    /// Print the candidate boxes as JSON.
    #[arg(long)]
    json: bool,

    /// Write the binary, edge and dilated rasters as PNGs into this directory.
    #[arg(long)]
    dump_stages: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", failure_label(&err));
            ExitCode::from(err.exit_code())
        }
    }
}

fn failure_label(err: &PipelineError) -> &'static str {
    match err {
        PipelineError::Open { .. } => "File error",
        PipelineError::Allocation { .. } => "Memory error",
        PipelineError::ShortRead { .. } => "Reading error",
        PipelineError::InvalidConfig(_) | PipelineError::Config(_) => "Configuration error",
        PipelineError::Encode(_) | PipelineError::Output(_) | PipelineError::Io(_) => "Output error",
        _ => "Detection error",
    }
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, PipelineError> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if let Some(dilations) = cli.dilations {
        config.dilation_iterations = dilations;
    }
    if cli.no_reduce_noise {
        config.canny.reduce_noise = false;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), PipelineError> {
    let config = build_config(cli)?;
    let bytes = read_image_file(&cli.image)?;
    let pipeline = DetectionPipeline::new(config)?;

    let detected = match &cli.dump_stages {
        Some(dir) => pipeline
            .detect_staged(&bytes, &pipeline.config().plate_filter)
            .and_then(|staged| dump_stages(dir, &staged).map(|()| staged.boxes)),
        None => pipeline.detect_plates(&bytes),
    };

    match detected {
        Ok(boxes) => print_boxes(&boxes, cli.json),
        // An undecodable image yields no candidates rather than a failed run.
        Err(err) if err.is_load_failure() => {
            eprintln!("Cannot load input image..exiting: {err}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn dump_stages(dir: &Path, staged: &plate_vision::pipeline::StagedDetection) -> Result<(), PipelineError> {
    std::fs::create_dir_all(dir)?;
    save_raster(&dir.join("binary.png"), &staged.binary)?;
    save_raster(&dir.join("edges.png"), &staged.edges)?;
    save_raster(&dir.join("dilated.png"), &staged.dilated)?;
    tracing::info!(dir = %dir.display(), "stage rasters written");
    Ok(())
}

fn print_boxes(boxes: &BoxList, json: bool) -> Result<(), PipelineError> {
    if json {
        let text = serde_json::to_string_pretty(boxes).map_err(PipelineError::Output)?;
        println!("{text}");
        return Ok(());
    }
    for b in boxes {
        println!(
            "Plate found at ({},{}) with width ({}x{}) and confidence {:.6}",
            b.x(),
            b.y(),
            b.width(),
            b.height(),
            b.score()
        );
    }
    Ok(())
}
