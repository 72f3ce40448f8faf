use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config_file::ConfigFile;
use crate::settings::{Backend, GenerationSettings, PipelineSettings};

/// Overrides for the generation hyperparameters
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerationArgs {
    /// Number of denoising steps [default: 50]
    #[arg(long = "steps", value_name = "N")]
    pub num_inference_steps: Option<u32>,

    /// Classifier-free guidance scale [default: 9.0]
    #[arg(long = "guidance-scale", value_name = "SCALE")]
    pub guidance_scale: Option<f32>,

    /// Generator seed [default: 8888]
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Delay between GIF frames in milliseconds [default: 100]
    #[arg(long = "frame-delay-ms", value_name = "MS")]
    pub frame_delay_ms: Option<u64>,
}

/// Overrides for pipeline construction
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Pipeline backend [default: worker]
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Python interpreter used to run the worker [default: python3]
    #[arg(long = "python", value_name = "PATH")]
    pub python_path: Option<PathBuf>,

    /// Worker script hosting the model [default: scripts/i2v_worker.py]
    #[arg(long = "script", value_name = "FILE")]
    pub script_path: Option<PathBuf>,

    /// Model id or local path passed to from_pretrained [default: ali-vilab/i2vgen-xl]
    #[arg(long = "model", value_name = "ID")]
    pub model_id: Option<String>,
}

impl GenerationArgs {
    pub fn apply(&self, settings: &mut GenerationSettings) {
        if let Some(steps) = self.num_inference_steps {
            settings.num_inference_steps = steps;
        }
        if let Some(scale) = self.guidance_scale {
            settings.guidance_scale = scale;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(delay) = self.frame_delay_ms {
            settings.frame_delay_ms = delay;
        }
    }
}

impl PipelineArgs {
    pub fn apply(&self, settings: &mut PipelineSettings) {
        if let Some(backend) = self.backend {
            settings.backend = backend;
        }
        if let Some(python) = &self.python_path {
            settings.python_path = python.clone();
        }
        if let Some(script) = &self.script_path {
            settings.script_path = script.clone();
        }
        if let Some(model) = &self.model_id {
            settings.model_id = model.clone();
        }
    }
}

/// Resolve settings: defaults, then the config file, then command-line flags
pub fn resolve_settings(
    config_path: Option<&Path>,
    generation_args: &GenerationArgs,
    pipeline_args: &PipelineArgs,
) -> Result<(GenerationSettings, PipelineSettings)> {
    let mut generation = GenerationSettings::default();
    let mut pipeline = PipelineSettings::default();

    if let Some((path, config)) = ConfigFile::discover(config_path)? {
        log::info!("Loaded configuration from: {}", path.display());
        config.apply(&mut generation, &mut pipeline);
    }

    generation_args.apply(&mut generation);
    pipeline_args.apply(&mut pipeline);

    Ok((generation, pipeline))
}

#[derive(Parser, Debug)]
#[command(
    name = "i2v-gif",
    about = "Animate a still image into a GIF with an image-to-video diffusion model",
    long_about = "
Image to Video (GIF) Generator

Loads an image, runs it through an image-to-video pipeline together with a text
prompt and a negative prompt, and writes the frames as output_i2v.gif into the
output folder. The folder must already exist.

Example Usage:
  # Generate with the I2VGen-XL worker (loads the model on start)
  i2v-gif -i ~/Photos/cat.png -p \"a cat running\" -o ~/gifs

  # Quick seeded camera drift without the model
  i2v-gif -i ~/Photos/cat.png -p \"a cat running\" -o ~/gifs --backend preview

  # Custom hyperparameters and a config file
  i2v-gif -i cat.jpg -p \"a cat running\" -o out --steps 30 --guidance-scale 7.5 \\
    --seed 1234 --config ./i2v-gif.json --verbose"
)]
pub struct Args {
    /// Source image (JPEG or PNG)
    #[arg(short = 'i', long = "image", value_name = "FILE")]
    pub image_path: String,

    /// Text prompt describing the motion
    #[arg(short = 'p', long = "prompt")]
    pub prompt: String,

    /// Negative prompt; blank uses the built-in default
    #[arg(short = 'n', long = "negative-prompt")]
    pub negative_prompt: Option<String>,

    /// Existing folder that receives output_i2v.gif
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_folder: String,

    #[command(flatten)]
    pub generation: GenerationArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// JSON configuration file [default: <config dir>/i2v-gif/config.json if present]
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "i2v-gif-gui",
    about = "Desktop window for the image to video (GIF) generator"
)]
pub struct GuiArgs {
    #[command(flatten)]
    pub generation: GenerationArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// JSON configuration file [default: <config dir>/i2v-gif/config.json if present]
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
        GuiArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_minimal_args() {
        let args = Args::try_parse_from([
            "i2v-gif", "-i", "/tmp/cat.png", "-p", "a cat running", "-o", "/tmp/out",
        ])
        .unwrap();

        assert_eq!(args.image_path, "/tmp/cat.png");
        assert_eq!(args.prompt, "a cat running");
        assert_eq!(args.negative_prompt, None);
        assert_eq!(args.output_folder, "/tmp/out");
        assert!(args.generation.seed.is_none());
        assert!(args.pipeline.backend.is_none());
    }

    #[test]
    fn test_parse_requires_image_prompt_output() {
        assert!(Args::try_parse_from(["i2v-gif", "-p", "x", "-o", "/tmp"]).is_err());
        assert!(Args::try_parse_from(["i2v-gif", "-i", "a.png", "-o", "/tmp"]).is_err());
        assert!(Args::try_parse_from(["i2v-gif", "-i", "a.png", "-p", "x"]).is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "i2v-gif",
            "-i",
            "cat.png",
            "-p",
            "a cat running",
            "-o",
            "out",
            "--steps",
            "30",
            "--guidance-scale",
            "7.5",
            "--seed",
            "1234",
            "--backend",
            "preview",
            "--model",
            "/models/i2vgen-xl",
        ])
        .unwrap();

        let mut generation = GenerationSettings::default();
        let mut pipeline = PipelineSettings::default();
        args.generation.apply(&mut generation);
        args.pipeline.apply(&mut pipeline);

        assert_eq!(generation.num_inference_steps, 30);
        assert_eq!(generation.guidance_scale, 7.5);
        assert_eq!(generation.seed, 1234);
        assert_eq!(generation.frame_delay_ms, 100);
        assert_eq!(pipeline.backend, Backend::Preview);
        assert_eq!(pipeline.model_id, "/models/i2vgen-xl");
    }

    #[test]
    fn test_resolve_settings_flag_beats_config_file() {
        let path = std::env::temp_dir().join(format!("i2v-gif-cli-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{ "generation": { "seed": 1, "guidanceScale": 5.0 }, "pipeline": { "backend": "preview" } }"#,
        )
        .unwrap();

        let generation_args = GenerationArgs {
            seed: Some(99),
            ..GenerationArgs::default()
        };
        let (generation, pipeline) =
            resolve_settings(Some(&path), &generation_args, &PipelineArgs::default()).unwrap();

        assert_eq!(generation.seed, 99);
        assert_eq!(generation.guidance_scale, 5.0);
        assert_eq!(pipeline.backend, Backend::Preview);

        std::fs::remove_file(&path).unwrap();
    }
}
