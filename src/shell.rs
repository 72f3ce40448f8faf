//! Toolkit-independent form logic behind the GUI
//!
//! The window itself only renders [`GenerationForm`] fields and forwards
//! button clicks to [`Shell`]. Native dialogs and pickers are injected through
//! [`Dialogs`] and [`PathPicker`].

use std::path::PathBuf;

use crate::generation::{create_video, GenerationRequest};
use crate::pipeline::ImageToVideoPipeline;
use crate::settings::GenerationSettings;

/// Extensions offered by the image picker
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const INPUT_ERROR_TITLE: &str = "Input Error";
pub const INPUT_ERROR_MESSAGE: &str = "Please provide all inputs.";
pub const SUCCESS_TITLE: &str = "Success";
pub const ERROR_TITLE: &str = "Error";

/// Modal message boxes
pub trait Dialogs {
    fn show_warning(&mut self, title: &str, message: &str);
    fn show_info(&mut self, title: &str, message: &str);
    fn show_error(&mut self, title: &str, message: &str);
}

/// File and folder choosers; `None` when the user cancels
pub trait PathPicker {
    fn pick_image(&mut self) -> Option<PathBuf>;
    fn pick_folder(&mut self) -> Option<PathBuf>;
}

/// The four text fields of the window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationForm {
    pub image_path: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub output_folder: String,
}

/// Required fields left blank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInputs(pub Vec<&'static str>);

impl std::fmt::Display for MissingInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Missing required input: {}", self.0.join(", "))
    }
}

impl std::error::Error for MissingInputs {}

impl GenerationForm {
    /// Empty form with the negative prompt pre-filled
    pub fn new(negative_prompt: &str) -> Self {
        Self {
            image_path: String::new(),
            prompt: String::new(),
            negative_prompt: negative_prompt.to_string(),
            output_folder: String::new(),
        }
    }

    /// Presence check on the required fields
    ///
    /// Whitespace-only fields count as blank. Paths are passed through as typed.
    /// A blank negative prompt is replaced by `default_negative_prompt`.
    pub fn to_request(
        &self,
        default_negative_prompt: &str,
    ) -> Result<GenerationRequest, MissingInputs> {
        let mut missing = Vec::new();
        if self.image_path.trim().is_empty() {
            missing.push("image path");
        }
        if self.prompt.trim().is_empty() {
            missing.push("prompt");
        }
        if self.output_folder.trim().is_empty() {
            missing.push("output folder");
        }
        if !missing.is_empty() {
            return Err(MissingInputs(missing));
        }

        let negative_prompt = if self.negative_prompt.trim().is_empty() {
            default_negative_prompt.to_string()
        } else {
            self.negative_prompt.clone()
        };

        Ok(GenerationRequest {
            image_path: PathBuf::from(&self.image_path),
            prompt: self.prompt.clone(),
            negative_prompt,
            output_folder: PathBuf::from(&self.output_folder),
        })
    }
}

/// Result of pressing the Generate button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    MissingInputs,
    Created(PathBuf),
    Failed(String),
}

/// Owns the form state, the pipeline and the injected UI collaborators
pub struct Shell<P, D, F> {
    pub form: GenerationForm,
    settings: GenerationSettings,
    pipeline: P,
    dialogs: D,
    picker: F,
}

impl<P, D, F> Shell<P, D, F>
where
    P: ImageToVideoPipeline,
    D: Dialogs,
    F: PathPicker,
{
    pub fn new(pipeline: P, settings: GenerationSettings, dialogs: D, picker: F) -> Self {
        Self {
            form: GenerationForm::new(&settings.negative_prompt),
            settings,
            pipeline,
            dialogs,
            picker,
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn dialogs(&self) -> &D {
        &self.dialogs
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn browse_image(&mut self) {
        if let Some(path) = self.picker.pick_image() {
            self.form.image_path = path.display().to_string();
        }
    }

    pub fn browse_output_folder(&mut self) {
        if let Some(path) = self.picker.pick_folder() {
            self.form.output_folder = path.display().to_string();
        }
    }

    /// Validate the form, run the generation call and report through dialogs
    ///
    /// Blocks until the pipeline returns. Errors never escape.
    pub fn generate_video(&mut self) -> GenerateOutcome {
        let request = match self.form.to_request(&self.settings.negative_prompt) {
            Ok(request) => request,
            Err(missing) => {
                log::warn!("{}", missing);
                self.dialogs
                    .show_warning(INPUT_ERROR_TITLE, INPUT_ERROR_MESSAGE);
                return GenerateOutcome::MissingInputs;
            }
        };

        match create_video(&self.pipeline, &request, &self.settings) {
            Ok(video_path) => {
                self.dialogs.show_info(
                    SUCCESS_TITLE,
                    &format!("GIF created successfully at: {}", video_path.display()),
                );
                GenerateOutcome::Created(video_path)
            }
            Err(e) => {
                let message = e.to_string();
                log::error!("Generation failed: {}", message);
                self.dialogs.show_error(ERROR_TITLE, &message);
                GenerateOutcome::Failed(message)
            }
        }
    }
}
