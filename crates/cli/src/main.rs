use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use faceattr_core::capture::infrastructure::image_file_source::ImageFileSource;
use faceattr_core::encoding::domain::layout::Layout;
use faceattr_core::inference::domain::inference_engine::InferenceEngine;
use faceattr_core::inference::infrastructure::onnx_inference_engine::OnnxInferenceEngine;
use faceattr_core::inference::infrastructure::timeout_inference_engine::TimeoutInferenceEngine;
use faceattr_core::pipeline::classify_frames_use_case::{ClassifyFramesUseCase, FrameOutcome};
use faceattr_core::pipeline::face_attribute_pipeline::FaceAttributePipeline;
use faceattr_core::pipeline::pipeline_config::PipelineConfig;
use faceattr_core::pipeline::pipeline_logger::SummaryPipelineLogger;
use faceattr_core::shared::constants::IMAGE_EXTENSIONS;
use faceattr_core::shared::model_resolver::{self, ModelLocation};

/// Age, gender and embedding drift for a sequence of face crops.
#[derive(Parser)]
#[command(name = "faceattr")]
struct Cli {
    /// Face images, classified in order as consecutive frames.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Model file or name (defaults to the configured model).
    #[arg(long)]
    model: Option<String>,

    /// Download the model from this URL when it is not found locally.
    #[arg(long)]
    model_url: Option<String>,

    /// Directory of bundled models, searched after the user cache.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Pipeline configuration file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tensor layout: planar or flattened.
    #[arg(long)]
    layout: Option<Layout>,

    /// Square model input size in pixels.
    #[arg(long)]
    input_size: Option<u32>,

    /// Per-frame inference deadline in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print one JSON object per frame instead of text.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let engine = build_engine(&cli, &config)?;
    let (width, height) = (config.input_width, config.input_height);

    let pipeline = FaceAttributePipeline::new(config, engine)?
        .with_logger(Box::new(SummaryPipelineLogger::default()));
    let source = ImageFileSource::new(cli.inputs.clone()).with_target_size(width, height);

    let json = cli.json;
    let inputs = cli.inputs;
    let report = Box::new(move |outcome: &FrameOutcome| {
        print_outcome(&inputs[outcome.index], outcome, json);
    });

    let mut use_case = ClassifyFramesUseCase::new(Box::new(source), pipeline, Some(report));
    let outcomes = use_case.execute()?;
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    log::info!(
        "Classified {} of {} frames",
        outcomes.len() - failed,
        outcomes.len()
    );
    Ok(())
}

fn build_config(cli: &Cli) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(model) = &cli.model {
        config.model_identifier = model.clone();
    }
    if let Some(layout) = cli.layout {
        config.layout = layout;
    }
    if let Some(size) = cli.input_size {
        config.input_width = size;
        config.input_height = size;
    }
    if let Some(ms) = cli.timeout_ms {
        config.inference_timeout_ms = Some(ms);
    }
    config.validate()?;
    Ok(config)
}

fn build_engine(
    cli: &Cli,
    config: &PipelineConfig,
) -> Result<Box<dyn InferenceEngine>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", config.model_identifier);
    let location = ModelLocation {
        bundled_dir: cli.models_dir.as_deref(),
        url: cli.model_url.as_deref(),
    };
    let model_path = model_resolver::resolve(
        &config.model_identifier,
        location,
        Some(Box::new(download_progress)),
    )?;
    if cli.model_url.is_some() {
        eprintln!();
    }

    let base: Box<dyn InferenceEngine> = Box::new(OnnxInferenceEngine::new(
        &model_path,
        config.outputs.names(),
    )?);

    match config.inference_timeout() {
        Some(timeout) => Ok(Box::new(TimeoutInferenceEngine::new(base, timeout))),
        None => Ok(base),
    }
}

fn print_outcome(path: &Path, outcome: &FrameOutcome, json: bool) {
    if json {
        let line = match &outcome.result {
            Ok(result) => serde_json::json!({
                "frame": outcome.index,
                "path": path.display().to_string(),
                "result": result,
            }),
            Err(e) => serde_json::json!({
                "frame": outcome.index,
                "path": path.display().to_string(),
                "error": { "kind": e.kind(), "message": e.to_string() },
            }),
        };
        println!("{line}");
        return;
    }
    match &outcome.result {
        Ok(result) => println!("[{}] {}: {result}", outcome.index, path.display()),
        Err(e) => println!("[{}] {}: error: {e}", outcome.index, path.display()),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for input in &cli.inputs {
        if !input.is_file() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
        if !is_image(input) {
            return Err(format!(
                "Unsupported input {}, expected one of: {}",
                input.display(),
                IMAGE_EXTENSIONS.join(", ")
            )
            .into());
        }
    }
    if let Some(config) = &cli.config {
        if !config.is_file() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    if cli.input_size == Some(0) {
        return Err("Input size must be positive".into());
    }
    if cli.timeout_ms == Some(0) {
        return Err("Timeout must be positive".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading age/gender model... {pct}%");
    } else {
        eprint!("\rDownloading age/gender model... {downloaded} bytes");
    }
}
