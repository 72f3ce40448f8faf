//! JSON-lines protocol spoken with the model worker
//!
//! Each message is a single JSON object on its own line, tagged by `type`.
//! Requests go to the worker's stdin, replies come back on its stdout. Replies
//! to a `generate` request echo its `id`.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerRequest {
    /// Run the model once and write frames into `output_dir`
    Generate {
        id: u64,
        image: PathBuf,
        prompt: String,
        negative_prompt: String,
        num_inference_steps: u32,
        guidance_scale: f32,
        seed: u64,
        output_dir: PathBuf,
    },
    /// Ask the worker to exit
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerMessage {
    /// Weights are loaded
    Ready { model: String },
    /// Frame files of the first generated video, in order
    Frames {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        paths: Vec<PathBuf>,
    },
    /// Exception text raised inside the worker
    ///
    /// `id` is missing when the worker could not read the request.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        message: String,
    },
}

impl WorkerRequest {
    /// Write the request as one line and flush
    pub fn send<W: Write>(&self, writer: &mut W) -> Result<(), PipelineError> {
        let json = serde_json::to_string(self)
            .map_err(|e| PipelineError::Protocol(e.to_string()))?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        Ok(())
    }
}

impl WorkerMessage {
    /// Request id a reply belongs to, if any
    pub fn reply_id(&self) -> Option<u64> {
        match self {
            WorkerMessage::Ready { .. } => None,
            WorkerMessage::Frames { id, .. } | WorkerMessage::Error { id, .. } => *id,
        }
    }

    pub fn parse(line: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(line.trim())
            .map_err(|e| PipelineError::Protocol(format!("{} | Raw line: {}", e, line.trim())))
    }
}
