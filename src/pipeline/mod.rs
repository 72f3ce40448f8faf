pub mod preview;
pub mod protocol;
pub mod worker;

use image::RgbImage;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::PipelineError;
use crate::settings::{Backend, PipelineSettings};

pub use preview::PreviewPipeline;
pub use worker::WorkerPipeline;

/// Ordered frames of one animation
pub type FrameSequence = Vec<RgbImage>;

/// Seeded randomness source handed to a pipeline
///
/// In-process backends draw from [`Generator::rng`]; out-of-process backends
/// forward [`Generator::seed`] so the model can reseed its own generator.
#[derive(Debug, Clone)]
pub struct Generator {
    seed: u64,
    rng: StdRng,
}

impl Generator {
    pub fn manual_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Everything a pipeline consumes for one call
#[derive(Debug)]
pub struct PipelineInput<'a> {
    pub prompt: &'a str,
    pub negative_prompt: &'a str,
    pub image: &'a RgbImage,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub generator: &'a mut Generator,
}

/// Pipeline result: one frame sequence per generated video
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub frames: Vec<FrameSequence>,
}

/// Image-to-video model interface
///
/// Implementations are constructed once and reused for every request. Calls
/// are never issued concurrently by the shell.
pub trait ImageToVideoPipeline {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn generate(&self, input: PipelineInput<'_>) -> Result<PipelineOutput, PipelineError>;
}

impl<P: ImageToVideoPipeline + ?Sized> ImageToVideoPipeline for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&self, input: PipelineInput<'_>) -> Result<PipelineOutput, PipelineError> {
        (**self).generate(input)
    }
}

/// Construct the configured pipeline backend
///
/// For the worker backend this spawns the model process and blocks until the
/// weights are loaded.
pub fn build_pipeline(
    settings: &PipelineSettings,
) -> Result<Box<dyn ImageToVideoPipeline>, PipelineError> {
    log::info!("Initializing {} pipeline", settings.backend);

    match settings.backend {
        Backend::Worker => Ok(Box::new(WorkerPipeline::spawn(settings)?)),
        Backend::Preview => Ok(Box::new(PreviewPipeline::new(
            settings.preview_frames,
            settings.preview_size,
        ))),
    }
}
