// Library exports for reuse by the GUI and the headless CLI
pub mod cli;
pub mod config_file;
pub mod error;
pub mod generation;
pub mod gif;
pub mod pipeline;
pub mod settings;
pub mod shell;
pub mod utils;

// Re-export commonly used types
pub use error::{Error, PipelineError};
pub use generation::{create_video, load_local_image, GenerationRequest};
pub use pipeline::{build_pipeline, Generator, ImageToVideoPipeline, PipelineInput, PipelineOutput};
pub use settings::{Backend, GenerationSettings, PipelineSettings};
pub use shell::{Dialogs, GenerateOutcome, GenerationForm, PathPicker, Shell};
