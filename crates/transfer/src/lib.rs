//! High-level (HL) file transfer: super-chunk sessions with resume support.
//!
//! A file is moved as a series of super-chunks. Each super-chunk travels
//! as a stream of link-level frames and is acknowledged through the
//! request/response handshake. Downloads persist every super-chunk and a
//! resume marker so they survive a process restart.

mod chunked;
mod config;
mod coordinator;
mod download;
mod progress;
mod store;
mod upload;
mod validation;

pub use chunked::{SuperChunkReader, file_digest, super_chunk_count};
pub use config::TransferConfig;
pub use coordinator::TransferCoordinator;
pub use download::{CompletionCallback, DownloadSession};
pub use progress::TransferClock;
pub use store::{ARTIFACT_BASE_NAME, ARTIFACT_EXTENSION, ArtifactStore, RESUME_MARKER_FILE};
pub use upload::UploadSession;
pub use validation::validate_filename;

/// Subdirectory of the transfer root holding downloads and resume state.
pub const DOWNLOAD_DIR: &str = "download";

/// Subdirectory of the transfer root holding files offered for upload.
pub const UPLOAD_DIR: &str = "upload";

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("link error: {0}")]
    Link(#[from] bleft_link::LinkError),

    #[error("malformed handshake: {0}")]
    MalformedHandshake(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("file too large: {0}")]
    FileTooLarge(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
