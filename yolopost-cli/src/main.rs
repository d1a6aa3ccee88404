use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yolopost::{BranchConfig, ClassColumn, Engine, EngineConfig, OutputTensors, RawOutputTensor};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "yolopost CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
struct BranchJson {
    name: String,
    num_classes: usize,
    #[serde(default)]
    labels: Option<PathBuf>,
    tensor_path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    score_threshold: f32,
    nms_threshold: f32,
    max_detections: usize,
    parallel: bool,
    branches: Vec<BranchJson>,
    output_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let cfg = EngineConfig::default();
        Self {
            score_threshold: cfg.score_threshold,
            nms_threshold: cfg.nms_threshold,
            max_detections: cfg.max_detections,
            parallel: cfg.parallel,
            branches: Vec::new(),
            output_path: None,
        }
    }
}

/// On-disk tensor: `[batch, channels, cells]` in channel-major order.
#[derive(Debug, Deserialize)]
struct TensorJson {
    shape: [usize; 3],
    data: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ClassesRecord {
    Int32(Vec<i32>),
    Text(Vec<String>),
}

impl From<ClassColumn> for ClassesRecord {
    fn from(value: ClassColumn) -> Self {
        match value {
            ClassColumn::Int32(v) => ClassesRecord::Int32(v),
            ClassColumn::Text(v) => ClassesRecord::Text(v),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    num_detections: [i32; 1],
    detection_boxes: Vec<[f32; 4]>,
    detection_scores: Vec<f32>,
    detection_classes: ClassesRecord,
    truncated: usize,
}

impl From<OutputTensors> for Output {
    fn from(value: OutputTensors) -> Self {
        Self {
            num_detections: value.num_detections,
            detection_boxes: value.detection_boxes,
            detection_scores: value.detection_scores,
            detection_classes: value.detection_classes.into(),
            truncated: value.truncated,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("yolopost=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.branches.is_empty() {
        return Err("at least one branch must be set in the config".into());
    }

    let mut tensors = Vec::with_capacity(config.branches.len());
    let mut branches = Vec::with_capacity(config.branches.len());
    for branch in config.branches {
        let text = fs::read_to_string(&branch.tensor_path)?;
        let tensor: TensorJson = serde_json::from_str(&text)?;
        tensors.push(RawOutputTensor::new(tensor.data, tensor.shape)?);
        branches.push(BranchConfig {
            name: branch.name,
            num_classes: branch.num_classes,
            labels: branch.labels,
        });
    }

    let engine = Engine::new(EngineConfig {
        score_threshold: config.score_threshold,
        nms_threshold: config.nms_threshold,
        max_detections: config.max_detections,
        parallel: config.parallel,
        branches,
    })?;

    let views: Vec<_> = tensors.iter().map(RawOutputTensor::view).collect();
    let set = engine.process(&views)?;
    tracing::info!(detections = set.count(), named = engine.is_named(), "processed");

    let output = Output::from(engine.pack(&set));
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
