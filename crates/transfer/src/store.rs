//! On-disk state of a download: super-chunk artifacts and the resume marker.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bleft_protocol::TransferRequest;
use tracing::debug;

use crate::TransferError;

/// Resume marker file name. Its presence means a download can resume.
pub const RESUME_MARKER_FILE: &str = "request.json";

/// Base name of artifact files (`chunk{N}.bin`).
pub const ARTIFACT_BASE_NAME: &str = "chunk";

/// Extension of artifact files.
pub const ARTIFACT_EXTENSION: &str = "bin";

/// Suffix of files still being written.
pub(crate) const TMP_SUFFIX: &str = ".tmp";

/// Artifact and resume-marker storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Opens the store, creating `dir` if needed.
    pub fn open(dir: &Path) -> Result<Self, TransferError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // -----------------------------------------------------------------------
    // Artifacts
    // -----------------------------------------------------------------------

    pub fn artifact_path(&self, index: u32) -> PathBuf {
        self.dir
            .join(format!("{ARTIFACT_BASE_NAME}{index}.{ARTIFACT_EXTENSION}"))
    }

    /// Stores one super-chunk.
    ///
    /// Written under a temporary name and renamed, so an artifact that
    /// exists is always complete.
    pub fn write_artifact(&self, index: u32, data: &[u8]) -> Result<(), TransferError> {
        let path = self.artifact_path(index);
        let mut tmp = path.clone().into_os_string();
        tmp.push(TMP_SUFFIX);
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn read_artifact(&self, index: u32) -> Result<Vec<u8>, TransferError> {
        Ok(std::fs::read(self.artifact_path(index))?)
    }

    pub fn artifact_len(&self, index: u32) -> Result<u64, TransferError> {
        Ok(std::fs::metadata(self.artifact_path(index))?.len())
    }

    /// Number of artifacts present without a gap, starting at index 0.
    pub fn contiguous_artifacts(&self) -> u32 {
        let mut count = 0;
        while self.artifact_path(count).is_file() {
            count += 1;
        }
        count
    }

    /// Deletes every artifact file, including unfinished writes. Returns how
    /// many were removed.
    pub fn delete_artifacts(&self) -> Result<usize, TransferError> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let is_artifact = name.to_str().is_some_and(|n| {
                let n = n.strip_suffix(TMP_SUFFIX).unwrap_or(n);
                parse_artifact_index(n).is_some()
            });
            if is_artifact && entry.file_type()?.is_file() {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, dir = %self.dir.display(), "artifacts deleted");
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Resume marker
    // -----------------------------------------------------------------------

    pub fn marker_path(&self) -> PathBuf {
        self.dir.join(RESUME_MARKER_FILE)
    }

    pub fn has_marker(&self) -> bool {
        self.marker_path().is_file()
    }

    /// Persists `request` as the resume marker.
    ///
    /// Written to a temporary file and renamed so a crash never leaves a
    /// half-written marker behind.
    pub fn write_marker(&self, request: &TransferRequest) -> Result<(), TransferError> {
        let json = serde_json::to_vec_pretty(request)?;
        let tmp = self.dir.join(format!("{RESUME_MARKER_FILE}{TMP_SUFFIX}"));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, self.marker_path())?;
        Ok(())
    }

    /// Loads the resume marker. `Ok(None)` if there is none.
    pub fn read_marker(&self) -> Result<Option<TransferRequest>, TransferError> {
        let content = match std::fs::read(self.marker_path()) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&content)?))
    }

    /// Time the marker was written; the start of a resumed transfer.
    pub fn marker_written_at(&self) -> Result<SystemTime, TransferError> {
        Ok(std::fs::metadata(self.marker_path())?.modified()?)
    }

    /// Removes the resume marker. Missing markers are not an error.
    pub fn delete_marker(&self) -> Result<(), TransferError> {
        match std::fs::remove_file(self.marker_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Extracts `N` from `chunk{N}.bin`.
fn parse_artifact_index(name: &str) -> Option<u32> {
    name.strip_prefix(ARTIFACT_BASE_NAME)?
        .strip_suffix(ARTIFACT_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}
