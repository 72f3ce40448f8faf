use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::RgbImage;
use rand::Rng;
use std::f64::consts::TAU;

use super::{FrameSequence, ImageToVideoPipeline, PipelineInput, PipelineOutput};
use crate::error::PipelineError;

/// In-process pipeline that animates the input with a seeded camera drift
///
/// The pan direction and zoom depth are drawn from the generator, so the same
/// image and seed always give the same frames. Prompts and diffusion
/// hyperparameters are accepted and ignored.
pub struct PreviewPipeline {
    frames: u32,
    max_size: u32,
}

impl PreviewPipeline {
    pub fn new(frames: u32, max_size: u32) -> Self {
        Self { frames, max_size }
    }
}

/// Drift parameters drawn once per call
#[derive(Debug, Clone, Copy)]
struct Drift {
    zoom: f64,
    angle: f64,
    pan: f64,
}

impl ImageToVideoPipeline for PreviewPipeline {
    fn name(&self) -> &str {
        "preview"
    }

    fn generate(&self, input: PipelineInput<'_>) -> Result<PipelineOutput, PipelineError> {
        if self.frames == 0 {
            return Err(PipelineError::Geometry("frame count must be at least 1".to_string()));
        }

        let (src_width, src_height) = input.image.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(PipelineError::Geometry(format!(
                "empty input image {}x{}",
                src_width, src_height
            )));
        }

        log::debug!(
            "Preview pipeline ignores prompt and diffusion settings (steps {}, guidance {})",
            input.num_inference_steps,
            input.guidance_scale
        );

        let rng = input.generator.rng();
        let drift = Drift {
            zoom: rng.random_range(0.08..0.2),
            angle: rng.random_range(0.0..TAU),
            pan: rng.random_range(0.0..1.0),
        };

        let (out_width, out_height) = output_dimensions(src_width, src_height, self.max_size);
        let source = to_resize_image(input.image)?;
        let mut resizer = Resizer::new();

        let mut sequence: FrameSequence = Vec::with_capacity(self.frames as usize);
        for index in 0..self.frames {
            let t = if self.frames > 1 {
                index as f64 / (self.frames - 1) as f64
            } else {
                0.0
            };
            let (left, top, width, height) = crop_window(src_width, src_height, drift, ease(t));

            let mut frame = Image::new(out_width, out_height, PixelType::U8x3);
            let options = ResizeOptions::default().crop(left, top, width, height);
            resizer
                .resize(&source, &mut frame, Some(&options))
                .map_err(|e| PipelineError::Geometry(e.to_string()))?;

            let frame = RgbImage::from_raw(out_width, out_height, frame.buffer().to_vec())
                .ok_or_else(|| PipelineError::Geometry("resized buffer too small".to_string()))?;
            sequence.push(frame);
        }

        Ok(PipelineOutput {
            frames: vec![sequence],
        })
    }
}

/// Smoothstep so the camera starts and stops gently
fn ease(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Scale down so the long side fits `max_size`, never upscale
fn output_dimensions(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let long_side = width.max(height);
    if max_size == 0 || long_side <= max_size {
        return (width, height);
    }

    let scale = max_size as f64 / long_side as f64;
    let scaled_width = ((width as f64 * scale).round() as u32).max(1);
    let scaled_height = ((height as f64 * scale).round() as u32).max(1);
    (scaled_width, scaled_height)
}

/// Source-space crop window `(left, top, width, height)` at progress `e`
fn crop_window(width: u32, height: u32, drift: Drift, e: f64) -> (f64, f64, f64, f64) {
    let scale = 1.0 - drift.zoom * e;
    let crop_width = width as f64 * scale;
    let crop_height = height as f64 * scale;

    let margin_x = width as f64 - crop_width;
    let margin_y = height as f64 - crop_height;

    let left = margin_x / 2.0 * (1.0 + drift.pan * drift.angle.cos());
    let top = margin_y / 2.0 * (1.0 + drift.pan * drift.angle.sin());

    (left, top, crop_width, crop_height)
}

fn to_resize_image(img: &RgbImage) -> Result<Image<'static>, PipelineError> {
    let (width, height) = img.dimensions();
    Image::from_vec_u8(width, height, img.as_raw().clone(), PixelType::U8x3)
        .map_err(|e| PipelineError::Geometry(e.to_string()))
}
