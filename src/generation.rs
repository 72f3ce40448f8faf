//! The generation call: image in, GIF out

use image::RgbImage;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::gif::export_to_gif;
use crate::pipeline::{Generator, ImageToVideoPipeline, PipelineInput};
use crate::settings::GenerationSettings;
use crate::utils::{format_duration, open_image};

/// Inputs for one generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub image_path: PathBuf,
    pub prompt: String,
    pub negative_prompt: String,
    pub output_folder: PathBuf,
}

/// Load an image from disk as 8-bit RGB
pub fn load_local_image(path: &Path) -> Result<RgbImage> {
    let img = open_image(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

/// Join `file_name` onto `folder`, refusing anything but a single file name
fn output_path(folder: &Path, file_name: &str) -> Result<PathBuf> {
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(folder.join(name)),
        _ => Err(Error::InvalidOutputName {
            name: file_name.to_string(),
        }),
    }
}

/// Run the pipeline once and write the first frame sequence as a GIF
///
/// Returns the absolute path of the written file. The output folder must
/// already exist; it is never created.
pub fn create_video<P>(
    pipeline: &P,
    request: &GenerationRequest,
    settings: &GenerationSettings,
) -> Result<PathBuf>
where
    P: ImageToVideoPipeline + ?Sized,
{
    let start_time = Instant::now();
    log::info!(
        "Generating GIF from {} with {} pipeline",
        request.image_path.display(),
        pipeline.name()
    );
    log::debug!(
        "prompt={:?} negative_prompt={:?} steps={} guidance={} seed={}",
        request.prompt,
        request.negative_prompt,
        settings.num_inference_steps,
        settings.guidance_scale,
        settings.seed
    );

    let image = load_local_image(&request.image_path)?;

    if !request.output_folder.is_dir() {
        return Err(Error::OutputFolderMissing {
            path: request.output_folder.clone(),
        });
    }

    let video_path = output_path(&request.output_folder, &settings.output_file_name)?;

    let mut generator = Generator::manual_seed(settings.seed);
    let output = pipeline.generate(PipelineInput {
        prompt: &request.prompt,
        negative_prompt: &request.negative_prompt,
        image: &image,
        num_inference_steps: settings.num_inference_steps,
        guidance_scale: settings.guidance_scale,
        generator: &mut generator,
    })?;

    let frames = output
        .frames
        .into_iter()
        .next()
        .filter(|sequence| !sequence.is_empty())
        .ok_or(Error::EmptyOutput)?;

    export_to_gif(&frames, &video_path, settings.frame_delay())?;

    let video_path = std::path::absolute(&video_path)?;
    log::info!(
        "Wrote {} frames to {} in {}",
        frames.len(),
        video_path.display(),
        format_duration(start_time.elapsed())
    );

    Ok(video_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::pipeline::{PipelineOutput, PreviewPipeline};
    use image::Rgb;
    use rand::Rng;
    use std::cell::RefCell;

    /// Records what it was called with and tints frames from the generator
    struct FakePipeline {
        calls: RefCell<Vec<(String, String, u32, f32, u64)>>,
        frames: usize,
    }

    impl FakePipeline {
        fn new(frames: usize) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                frames,
            }
        }
    }

    impl ImageToVideoPipeline for FakePipeline {
        fn name(&self) -> &str {
            "fake"
        }

        fn generate(&self, input: PipelineInput<'_>) -> std::result::Result<PipelineOutput, PipelineError> {
            self.calls.borrow_mut().push((
                input.prompt.to_string(),
                input.negative_prompt.to_string(),
                input.num_inference_steps,
                input.guidance_scale,
                input.generator.seed(),
            ));

            let sequence = (0..self.frames)
                .map(|_| {
                    let shade: u8 = input.generator.rng().random();
                    let mut frame = input.image.clone();
                    frame.put_pixel(0, 0, Rgb([shade, shade, shade]));
                    frame
                })
                .collect();
            Ok(PipelineOutput {
                frames: vec![sequence],
            })
        }
    }

    struct FailingPipeline;

    impl ImageToVideoPipeline for FailingPipeline {
        fn name(&self) -> &str {
            "failing"
        }

        fn generate(&self, _input: PipelineInput<'_>) -> std::result::Result<PipelineOutput, PipelineError> {
            Err(PipelineError::Worker("CUDA out of memory".to_string()))
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "i2v-gif-generation-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_test_png(dir: &Path) -> PathBuf {
        let path = dir.join("cat.png");
        RgbImage::from_fn(32, 24, |x, y| Rgb([(x * 8) as u8, (y * 10) as u8, 128]))
            .save(&path)
            .unwrap();
        path
    }

    fn request(image_path: PathBuf, output_folder: PathBuf) -> GenerationRequest {
        GenerationRequest {
            image_path,
            prompt: "a cat running".to_string(),
            negative_prompt: "blurry".to_string(),
            output_folder,
        }
    }

    #[test]
    fn test_create_video_writes_gif_in_output_folder() {
        let dir = scratch_dir("writes");
        let out = dir.join("out");
        std::fs::create_dir(&out).unwrap();
        let pipeline = FakePipeline::new(3);

        let path = create_video(
            &pipeline,
            &request(write_test_png(&dir), out.clone()),
            &GenerationSettings::default(),
        )
        .unwrap();

        assert!(path.is_absolute());
        assert_eq!(path, std::path::absolute(out.join("output_i2v.gif")).unwrap());
        assert!(path.is_file());

        let calls = pipeline.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            ("a cat running".to_string(), "blurry".to_string(), 50, 9.0, 8888)
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_video_uses_configured_settings() {
        let dir = scratch_dir("settings");
        let pipeline = FakePipeline::new(2);
        let settings = GenerationSettings {
            num_inference_steps: 25,
            guidance_scale: 7.5,
            seed: 42,
            output_file_name: "custom.gif".to_string(),
            ..GenerationSettings::default()
        };

        let path = create_video(&pipeline, &request(write_test_png(&dir), dir.clone()), &settings)
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "custom.gif");
        let calls = pipeline.calls.borrow();
        assert_eq!((calls[0].2, calls[0].3, calls[0].4), (25, 7.5, 42));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_video_is_reproducible() {
        let dir = scratch_dir("reproducible");
        let image_path = write_test_png(&dir);
        let first_out = dir.join("first");
        let second_out = dir.join("second");
        std::fs::create_dir(&first_out).unwrap();
        std::fs::create_dir(&second_out).unwrap();

        let pipeline = PreviewPipeline::new(5, 32);
        let settings = GenerationSettings::default();

        let first = create_video(&pipeline, &request(image_path.clone(), first_out), &settings).unwrap();
        let second = create_video(&pipeline, &request(image_path, second_out), &settings).unwrap();

        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_video_missing_image() {
        let dir = scratch_dir("missing-image");
        let pipeline = FakePipeline::new(1);

        let err = create_video(
            &pipeline,
            &request(dir.join("does-not-exist.png"), dir.clone()),
            &GenerationSettings::default(),
        )
        .unwrap_err();

        match &err {
            Error::ImageLoad {
                source: image::ImageError::IoError(io),
                ..
            } => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(pipeline.calls.borrow().is_empty());
        assert!(!dir.join("output_i2v.gif").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_video_undecodable_image() {
        let dir = scratch_dir("undecodable");
        let image_path = dir.join("broken.png");
        std::fs::write(&image_path, b"not a png").unwrap();

        let err = create_video(
            &FakePipeline::new(1),
            &request(image_path, dir.clone()),
            &GenerationSettings::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::ImageLoad { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_video_missing_output_folder() {
        let dir = scratch_dir("missing-folder");
        let out = dir.join("not-created");
        let pipeline = FakePipeline::new(1);

        let err = create_video(
            &pipeline,
            &request(write_test_png(&dir), out.clone()),
            &GenerationSettings::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::OutputFolderMissing { .. }));
        assert!(!out.exists());
        assert!(pipeline.calls.borrow().is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_video_surfaces_pipeline_error_text() {
        let dir = scratch_dir("pipeline-error");

        let err = create_video(
            &FailingPipeline,
            &request(write_test_png(&dir), dir.clone()),
            &GenerationSettings::default(),
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "CUDA out of memory");
        assert!(!dir.join("output_i2v.gif").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_video_rejects_empty_output() {
        let dir = scratch_dir("empty-output");

        let err = create_video(
            &FakePipeline::new(0),
            &request(write_test_png(&dir), dir.clone()),
            &GenerationSettings::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::EmptyOutput));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_local_image_converts_to_rgb() {
        let dir = scratch_dir("rgba");
        let path = dir.join("alpha.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 40]))
            .save(&path)
            .unwrap();

        let img = load_local_image(&path).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgb([10, 20, 30]));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_video_loads_image_by_contents() {
        let dir = scratch_dir("sniffed");
        let png = write_test_png(&dir);
        let misnamed = dir.join("cat.jpg");
        let bare = dir.join("cat");
        std::fs::copy(&png, &misnamed).unwrap();
        std::fs::copy(&png, &bare).unwrap();

        for image_path in [misnamed, bare] {
            let pipeline = FakePipeline::new(2);
            let path = create_video(
                &pipeline,
                &request(image_path, dir.clone()),
                &GenerationSettings::default(),
            )
            .unwrap();
            assert!(path.is_file());
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_create_video_rejects_output_name_outside_folder() {
        let dir = scratch_dir("output-name");
        let out = dir.join("out");
        std::fs::create_dir(&out).unwrap();
        let image_path = write_test_png(&dir);

        for name in ["", "../escaped.gif", "/tmp/absolute.gif", "nested/out.gif", "."] {
            let pipeline = FakePipeline::new(1);
            let settings = GenerationSettings {
                output_file_name: name.to_string(),
                ..GenerationSettings::default()
            };

            let err = create_video(&pipeline, &request(image_path.clone(), out.clone()), &settings)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidOutputName { .. }), "{:?}", name);
            assert!(pipeline.calls.borrow().is_empty());
        }
        assert!(!dir.join("escaped.gif").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
