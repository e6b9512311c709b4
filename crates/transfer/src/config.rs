use std::path::PathBuf;

use bleft_protocol::{DEFAULT_MTU, DEFAULT_SUPER_CHUNK_SIZE, FRAME_HEADER_SIZE};
use serde::{Deserialize, Serialize};

use crate::{DOWNLOAD_DIR, TransferError, UPLOAD_DIR};

/// Sizing and storage settings for a transfer endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Root directory holding `download/` and `upload/`.
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Negotiated transport MTU in bytes.
    #[serde(default = "default_mtu")]
    pub mtu: usize,

    /// Per-frame wire overhead in bytes.
    #[serde(default = "default_header_size")]
    pub header_size: usize,

    /// Bytes per persisted super-chunk.
    #[serde(default = "default_super_chunk_size")]
    pub super_chunk_size: usize,
}

fn default_root_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".local").join("share").join("bleft")
}

fn default_mtu() -> usize {
    DEFAULT_MTU
}

fn default_header_size() -> usize {
    FRAME_HEADER_SIZE
}

fn default_super_chunk_size() -> usize {
    DEFAULT_SUPER_CHUNK_SIZE
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            mtu: default_mtu(),
            header_size: default_header_size(),
            super_chunk_size: default_super_chunk_size(),
        }
    }
}

impl TransferConfig {
    /// Default sizing rooted at `root_path`.
    pub fn with_root(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Rejects settings that leave no room for frame payload or super-chunks.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.mtu <= self.header_size {
            return Err(TransferError::Config(format!(
                "mtu ({}) must exceed header_size ({})",
                self.mtu, self.header_size
            )));
        }
        if self.super_chunk_size == 0 {
            return Err(TransferError::Config(
                "super_chunk_size must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn download_dir(&self) -> PathBuf {
        self.root_path.join(DOWNLOAD_DIR)
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.root_path.join(UPLOAD_DIR)
    }
}
