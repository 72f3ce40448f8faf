use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Errors returned by the generation call
///
/// Display strings carry the underlying error text unchanged so the shell can
/// show them verbatim.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Output folder does not exist: {}", .path.display())]
    OutputFolderMissing { path: PathBuf },

    #[error("Output file name must be a plain file name: {name:?}")]
    InvalidOutputName { name: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Pipeline returned no frames")]
    EmptyOutput,

    #[error("{}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by a pipeline backend
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Worker script not found: {}", .path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("Failed to start worker {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker exited before replying")]
    WorkerExited,

    #[error("Invalid worker message: {0}")]
    Protocol(String),

    /// Message reported by the model process itself
    #[error("{0}")]
    Worker(String),

    #[error("Frame file {}: {source}", .path.display())]
    Frame {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid frame geometry: {0}")]
    Geometry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
