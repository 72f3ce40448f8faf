//! Default generation and pipeline settings.
//!
//! Every knob the generation call depends on is a named default here and is
//! passed explicitly into [`crate::generation::create_video`], so it can be
//! overridden from the config file or the command line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Negative prompt used when the user leaves the field blank
pub const DEFAULT_NEGATIVE_PROMPT: &str = "Distorted, discontinuous, Ugly, blurry, low resolution, motionless, static, disfigured, disconnected limbs, Ugly faces, incomplete arms";

pub const DEFAULT_NUM_INFERENCE_STEPS: u32 = 50;
pub const DEFAULT_GUIDANCE_SCALE: f32 = 9.0;
pub const DEFAULT_SEED: u64 = 8888;

/// Name of the GIF written into the output folder
pub const OUTPUT_FILE_NAME: &str = "output_i2v.gif";

/// Per-frame delay, matches the diffusers `export_to_gif` default
pub const DEFAULT_FRAME_DELAY_MS: u64 = 100;

pub const DEFAULT_MODEL_ID: &str = "ali-vilab/i2vgen-xl";
pub const DEFAULT_MODEL_VARIANT: &str = "fp16";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_WORKER_SCRIPT: &str = "scripts/i2v_worker.py";

pub const DEFAULT_PREVIEW_FRAMES: u32 = 16;
pub const DEFAULT_PREVIEW_SIZE: u32 = 512;

/// Hyperparameters and output naming for a single generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub seed: u64,
    pub negative_prompt: String,
    pub output_file_name: String,
    pub frame_delay_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            num_inference_steps: DEFAULT_NUM_INFERENCE_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            seed: DEFAULT_SEED,
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            output_file_name: OUTPUT_FILE_NAME.to_string(),
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
        }
    }
}

impl GenerationSettings {
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }
}

/// Which pipeline implementation backs the generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Persistent Python worker hosting the diffusers I2VGen-XL pipeline
    #[default]
    #[value(name = "worker")]
    Worker,
    /// In-process seeded camera drift over the input image (no model required)
    #[value(name = "preview")]
    Preview,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Worker => write!(f, "worker"),
            Backend::Preview => write!(f, "preview"),
        }
    }
}

/// How to construct the pipeline at startup
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub backend: Backend,
    pub python_path: PathBuf,
    pub script_path: PathBuf,
    pub model_id: String,
    /// Weight variant passed to `from_pretrained`; empty means the default weights
    pub variant: String,
    pub cpu_offload: bool,
    pub preview_frames: u32,
    pub preview_size: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            python_path: PathBuf::from(DEFAULT_PYTHON),
            script_path: PathBuf::from(DEFAULT_WORKER_SCRIPT),
            model_id: DEFAULT_MODEL_ID.to_string(),
            variant: DEFAULT_MODEL_VARIANT.to_string(),
            cpu_offload: true,
            preview_frames: DEFAULT_PREVIEW_FRAMES,
            preview_size: DEFAULT_PREVIEW_SIZE,
        }
    }
}
