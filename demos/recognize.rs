//! Captcha Recognition Example
//!
//! This example reads one or more captcha images with the networks listed in
//! a parameters file and prints the decoded text.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example recognize -- [OPTIONS]
//! ```
//!
//! # Arguments
//!
//! * `-c, --config` - Parameters file (default: params.yaml)
//! * `-t, --type` - Captcha type to run (e.g. type1, recaptcha)
//! * `-i, --image` - Image to recognize
//! * `-s, --shards` - Directory holding the weight shards (default: data/models/<type>)
//! * `--all` - Run the bundled sample of every registered type
//! * `--device` - Device to use for inference (e.g., 'cpu', 'cuda', 'cuda:0')
//!
//! # Example
//!
//! ```bash
//! cargo run --example recognize -- -t type1 -i data/example1.png
//! cargo run --example recognize -- --all
//! ```

use captcha_ocr::core::config::{OrtExecutionProvider, OrtSessionConfig};
use captcha_ocr::core::constants::{DATA_ROOT, DEFAULT_PARAMS_FILE, MODEL_ROOT};
use captcha_ocr::prelude::*;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Command-line arguments for the recognition example
#[derive(Parser)]
#[command(name = "recognize")]
#[command(about = "Captcha Recognition Example - decodes captcha images with CTC networks")]
struct Args {
    /// Parameters file describing every type
    #[arg(short, long, default_value = DEFAULT_PARAMS_FILE)]
    config: PathBuf,

    /// Captcha type to run
    #[arg(short = 't', long = "type", required_unless_present = "all")]
    model_type: Option<String>,

    /// Image to recognize
    #[arg(short, long, required_unless_present = "all")]
    image: Option<PathBuf>,

    /// Directory holding the weight shards
    #[arg(short, long)]
    shards: Option<PathBuf>,

    /// Run the bundled sample of every registered type
    #[arg(long, conflicts_with_all = ["model_type", "image"])]
    all: bool,

    /// Device to use for inference (e.g., 'cpu', 'cuda', 'cuda:0')
    #[arg(long, default_value = "cpu")]
    device: String,

    /// Session pool size for concurrent inference
    #[arg(long, default_value = "1")]
    session_pool_size: usize,

    /// Keep repeated classes instead of merging them
    #[arg(long)]
    no_merge: bool,

    /// Log raw predictions and decoder output
    #[arg(short, long)]
    debug: bool,
}

fn parse_device(device: &str) -> Result<Vec<OrtExecutionProvider>, Box<dyn std::error::Error>> {
    let device = device.to_lowercase();
    if device == "cpu" {
        return Ok(vec![OrtExecutionProvider::CPU]);
    }

    let device_id = match device.strip_prefix("cuda") {
        Some("") => 0,
        Some(rest) => match rest.strip_prefix(':') {
            Some(id) => id.parse()?,
            None => return Err(format!("Unsupported device: {}", device).into()),
        },
        None => {
            return Err(format!(
                "Unsupported device: {}. Supported devices: cpu, cuda, cuda:N",
                device
            )
            .into());
        }
    };

    if !cfg!(feature = "cuda") {
        warn!("CUDA requested but cuda feature not enabled. Falling back to CPU.");
        return Ok(vec![OrtExecutionProvider::CPU]);
    }
    Ok(vec![
        OrtExecutionProvider::CUDA {
            device_id: Some(device_id),
        },
        OrtExecutionProvider::CPU,
    ])
}

fn default_shards(model_type: &str) -> PathBuf {
    Path::new(DATA_ROOT).join(MODEL_ROOT).join(model_type)
}

fn sample_jobs() -> Vec<RecognitionJob> {
    let samples = [
        (ModelType::Type1, "example1.png"),
        (ModelType::Type3, "example3.png"),
        (ModelType::Type4, "example4.png"),
        (ModelType::Type5, "example5.png"),
        (ModelType::Type6, "example6.png"),
        (ModelType::Type7, "example7.jpg"),
        (ModelType::Type8, "example8.png"),
        (ModelType::Recaptcha, "example9.jpg"),
    ];
    samples
        .iter()
        .map(|(model_type, image)| {
            RecognitionJob::new(
                model_type.as_str(),
                Path::new(DATA_ROOT).join(image),
                default_shards(model_type.as_str()),
            )
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    captcha_ocr::utils::init_tracing();

    let args = Args::parse();

    info!("Captcha Recognition Example");

    let jobs = if args.all {
        sample_jobs()
    } else {
        let model_type = args.model_type.ok_or("missing --type")?;
        let image = args.image.ok_or("missing --image")?;
        let shards = args.shards.unwrap_or_else(|| default_shards(&model_type));
        vec![RecognitionJob::new(model_type, image, shards)]
    };

    let catalog = ModelCatalog::from_path(&args.config)?;
    let config = RecognizerConfig::new()
        .debug(args.debug)
        .merge_repeated(!args.no_merge)
        .session_pool_size(args.session_pool_size)
        .ort_session(
            OrtSessionConfig::new().with_execution_providers(parse_device(&args.device)?),
        );
    let recognizer = Recognizer::new(catalog, config)?;

    let start = Instant::now();
    let results = recognizer.run_all(&jobs);
    let mut failures = 0;
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(text) => println!("{} {}: {}", job.type_name, job.image_path.display(), text),
            Err(e) => {
                failures += 1;
                error!("{} {}: {}", job.type_name, job.image_path.display(), e);
            }
        }
    }
    info!(
        "Processed {} job(s) in {:.2?}, {} failed",
        jobs.len(),
        start.elapsed(),
        failures
    );

    if failures > 0 {
        return Err(format!("{} job(s) failed", failures).into());
    }
    Ok(())
}
