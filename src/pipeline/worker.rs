//! Image-to-video through a long-lived Python worker
//!
//! The worker script loads the diffusers I2VGen-XL pipeline once and then
//! serves `generate` requests from stdin until it receives `shutdown` or its
//! stdin closes. Frames are exchanged as PNG files in a scratch directory.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::protocol::{WorkerMessage, WorkerRequest};
use super::{FrameSequence, ImageToVideoPipeline, PipelineInput, PipelineOutput};
use crate::error::PipelineError;
use crate::settings::PipelineSettings;
use crate::utils::open_image;

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct WorkerProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
}

impl WorkerProcess {
    /// Read lines until a protocol message arrives
    ///
    /// Lines that do not parse as a protocol message (library banners, stray
    /// dict prints, truncated output) are logged and skipped.
    fn read_message(&mut self) -> Result<WorkerMessage, PipelineError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(PipelineError::WorkerExited);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('{') {
                match WorkerMessage::parse(trimmed) {
                    Ok(message) => return Ok(message),
                    Err(e) => log::debug!("worker: skipping line: {}", e),
                }
            } else {
                log::debug!("worker: {}", trimmed);
            }
        }
    }

    /// Read until the reply to request `id`, discarding replies to older requests
    fn read_reply(&mut self, id: u64) -> Result<WorkerMessage, PipelineError> {
        loop {
            let message = self.read_message()?;
            match message.reply_id() {
                Some(reply_id) if reply_id != id => {
                    log::warn!("Discarding stale worker reply for request {}", reply_id);
                }
                _ => return Ok(message),
            }
        }
    }

    fn terminate(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Pipeline backed by the Python worker process
pub struct WorkerPipeline {
    model_id: String,
    process: Mutex<WorkerProcess>,
}

impl WorkerPipeline {
    /// Spawn the worker and wait until the model weights are loaded
    pub fn spawn(settings: &PipelineSettings) -> Result<Self, PipelineError> {
        if !settings.script_path.is_file() {
            return Err(PipelineError::ScriptNotFound {
                path: settings.script_path.clone(),
            });
        }

        let mut command = Command::new(&settings.python_path);
        command
            .arg(&settings.script_path)
            .arg("--model")
            .arg(&settings.model_id);
        if !settings.variant.is_empty() {
            command.arg("--variant").arg(&settings.variant);
        }
        if settings.cpu_offload {
            command.arg("--cpu-offload");
        }

        log::info!(
            "Starting worker: {} {} (model {})",
            settings.python_path.display(),
            settings.script_path.display(),
            settings.model_id
        );

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                program: settings.python_path.clone(),
                source,
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PipelineError::Protocol(
                    "worker stdio was not captured".to_string(),
                ));
            }
        };

        let mut process = WorkerProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 0,
        };

        match process.read_message() {
            Ok(WorkerMessage::Ready { model }) => {
                log::info!("Worker ready: {}", model);
            }
            Ok(WorkerMessage::Error { message, .. }) => {
                process.terminate();
                return Err(PipelineError::Worker(message));
            }
            Ok(other) => {
                process.terminate();
                return Err(PipelineError::Protocol(format!(
                    "expected ready, got {:?}",
                    other
                )));
            }
            Err(e) => {
                process.terminate();
                return Err(e);
            }
        }

        Ok(Self {
            model_id: settings.model_id.clone(),
            process: Mutex::new(process),
        })
    }
}

impl ImageToVideoPipeline for WorkerPipeline {
    fn name(&self) -> &str {
        "worker"
    }

    fn generate(&self, input: PipelineInput<'_>) -> Result<PipelineOutput, PipelineError> {
        let scratch = ScratchDir::create()?;
        let image_path = scratch.path().join("input.png");
        input
            .image
            .save(&image_path)
            .map_err(|source| PipelineError::Frame {
                path: image_path.clone(),
                source,
            })?;

        let frames_dir = scratch.path().join("frames");
        fs::create_dir(&frames_dir)?;

        log::debug!("Sending generate request to {} worker", self.model_id);
        let message = {
            let mut process = self
                .process
                .lock()
                .map_err(|_| PipelineError::Protocol("worker lock poisoned".to_string()))?;

            let id = process.next_id;
            process.next_id += 1;

            let request = WorkerRequest::Generate {
                id,
                image: image_path,
                prompt: input.prompt.to_string(),
                negative_prompt: input.negative_prompt.to_string(),
                num_inference_steps: input.num_inference_steps,
                guidance_scale: input.guidance_scale,
                seed: input.generator.seed(),
                output_dir: frames_dir,
            };
            request.send(&mut process.stdin)?;
            process.read_reply(id)?
        };

        match message {
            WorkerMessage::Frames { paths, .. } => {
                log::debug!("Worker returned {} frames", paths.len());
                let frames = load_frames(&paths)?;
                Ok(PipelineOutput {
                    frames: vec![frames],
                })
            }
            WorkerMessage::Error { message, .. } => Err(PipelineError::Worker(message)),
            WorkerMessage::Ready { .. } => Err(PipelineError::Protocol(
                "unexpected ready message during generation".to_string(),
            )),
        }
    }
}

impl Drop for WorkerPipeline {
    fn drop(&mut self) {
        if let Ok(process) = self.process.get_mut() {
            if WorkerRequest::Shutdown.send(&mut process.stdin).is_err() {
                process.terminate();
                return;
            }
            let _ = process.child.wait();
        }
    }
}

fn load_frames(paths: &[PathBuf]) -> Result<FrameSequence, PipelineError> {
    paths
        .iter()
        .map(|path| {
            open_image(path)
                .map(|img| img.to_rgb8())
                .map_err(|source| PipelineError::Frame {
                    path: path.clone(),
                    source,
                })
        })
        .collect()
}

/// Temporary directory removed on drop
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn create() -> std::io::Result<Self> {
        let id = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("i2v-gif-{}-{}", std::process::id(), id));
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            log::warn!("Failed to remove {}: {}", self.path.display(), e);
        }
    }
}
