use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::{Backend, GenerationSettings, PipelineSettings};

/// Represents the JSON config file format
///
/// Every key is optional; missing keys keep their built-in defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub generation: Option<GenerationConfigJson>,
    pub pipeline: Option<PipelineConfigJson>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfigJson {
    pub num_inference_steps: Option<u32>,
    pub guidance_scale: Option<f32>,
    pub seed: Option<u64>,
    pub negative_prompt: Option<String>,
    pub output_file_name: Option<String>,
    pub frame_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfigJson {
    pub backend: Option<Backend>,
    pub python_path: Option<PathBuf>,
    pub script_path: Option<PathBuf>,
    pub model_id: Option<String>,
    pub variant: Option<String>,
    pub cpu_offload: Option<bool>,
    pub preview_frames: Option<u32>,
    pub preview_size: Option<u32>,
}

impl ConfigFile {
    /// `<config dir>/i2v-gif/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("i2v-gif").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: ConfigFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load the explicitly requested file, or the default one if it exists
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<(PathBuf, Self)>> {
        if let Some(path) = explicit {
            return Ok(Some((path.to_path_buf(), Self::load(path)?)));
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                let config = Self::load(&path)?;
                Ok(Some((path, config)))
            }
            _ => Ok(None),
        }
    }

    /// Overlay file values on top of the given settings
    pub fn apply(&self, generation: &mut GenerationSettings, pipeline: &mut PipelineSettings) {
        if let Some(config) = &self.generation {
            if let Some(steps) = config.num_inference_steps {
                generation.num_inference_steps = steps;
            }
            if let Some(scale) = config.guidance_scale {
                generation.guidance_scale = scale;
            }
            if let Some(seed) = config.seed {
                generation.seed = seed;
            }
            if let Some(prompt) = &config.negative_prompt {
                generation.negative_prompt = prompt.clone();
            }
            if let Some(name) = &config.output_file_name {
                generation.output_file_name = name.clone();
            }
            if let Some(delay) = config.frame_delay_ms {
                generation.frame_delay_ms = delay;
            }
        }

        if let Some(config) = &self.pipeline {
            if let Some(backend) = config.backend {
                pipeline.backend = backend;
            }
            if let Some(python) = &config.python_path {
                pipeline.python_path = python.clone();
            }
            if let Some(script) = &config.script_path {
                pipeline.script_path = script.clone();
            }
            if let Some(model) = &config.model_id {
                pipeline.model_id = model.clone();
            }
            if let Some(variant) = &config.variant {
                pipeline.variant = variant.clone();
            }
            if let Some(offload) = config.cpu_offload {
                pipeline.cpu_offload = offload;
            }
            if let Some(frames) = config.preview_frames {
                pipeline.preview_frames = frames;
            }
            if let Some(size) = config.preview_size {
                pipeline.preview_size = size;
            }
        }
    }
}
