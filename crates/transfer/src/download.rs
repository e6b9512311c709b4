//! Device-side receive state machine with crash-resumable state.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bleft_protocol::{
    StreamDigest, Target, TransferRequest, TransferResponse, TransferStatus, digest,
};
use tracing::{debug, error, info, warn};

use crate::TransferError;
use crate::progress::TransferClock;
use crate::store::ArtifactStore;
use crate::validation::validate_filename;

/// Invoked once per finished download: the final path on success, `None`
/// on a whole-file hash mismatch.
pub type CompletionCallback = Box<dyn FnMut(Option<&Path>, Target) + Send>;

/// Receives a file as a sequence of super-chunks.
///
/// Every super-chunk is persisted as an artifact and the accepted request
/// is kept on disk as the resume marker, so a restarted process picks the
/// transfer up at the first missing super-chunk.
pub struct DownloadSession {
    store: ArtifactStore,
    request: TransferRequest,
    response: TransferResponse,
    clock: TransferClock,
    on_complete: CompletionCallback,
}

impl DownloadSession {
    /// Opens the download directory and resumes any interrupted transfer.
    pub fn new(download_dir: &Path, on_complete: CompletionCallback) -> Result<Self, TransferError> {
        let mut session = Self {
            store: ArtifactStore::open(download_dir)?,
            request: TransferRequest::default(),
            response: TransferResponse::default(),
            clock: TransferClock::new(),
            on_complete,
        };
        session.resume()?;
        Ok(session)
    }

    fn resume(&mut self) -> Result<(), TransferError> {
        let request = match self.store.read_marker() {
            Ok(Some(request)) => request,
            Ok(None) => {
                let removed = self.store.delete_artifacts()?;
                if removed > 0 {
                    info!(removed, "no download to resume, orphaned artifacts removed");
                }
                return Ok(());
            }
            Err(TransferError::Json(e)) => {
                error!(%e, "invalid resume marker, can not resume download");
                self.discard_resume_state()?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = validate_filename(&request.filename) {
            error!(%e, "resume marker names an invalid file, can not resume download");
            self.discard_resume_state()?;
            return Ok(());
        }

        self.reset(request);

        let received = self.store.contiguous_artifacts();
        self.response.next_super_chunk_index = received;
        self.clock.start_at(self.store.marker_written_at()?);

        if received > 0 {
            // Every artifact but the final one has the same size.
            let chunk_size = self.store.artifact_len(0)?;
            self.response.bytes_transferred = chunk_size * u64::from(received);
            let last = self.store.read_artifact(received - 1)?;
            self.response.last_chunk_hash = digest(&last).to_vec();
        }
        self.response.elapsed_seconds = self.transfer_duration().as_secs_f64();

        info!(
            filename = %self.request.filename,
            next_chunk = received,
            total_chunks = self.request.total_super_chunks,
            bytes = self.response.bytes_transferred,
            elapsed = self.response.elapsed_seconds,
            "resuming interrupted download"
        );

        if received > 0 && received == self.request.total_super_chunks {
            // Interrupted between the last write and finalization.
            self.finalize()?;
        }
        Ok(())
    }

    fn discard_resume_state(&mut self) -> Result<(), TransferError> {
        self.store.delete_marker()?;
        self.store.delete_artifacts()?;
        Ok(())
    }

    fn reset(&mut self, request: TransferRequest) {
        self.response = TransferResponse {
            filename: request.filename.clone(),
            total_super_chunks: request.total_super_chunks,
            status: TransferStatus::InProgress,
            ..Default::default()
        };
        self.request = request;
        self.clock.start();
    }

    /// Accepts a download announcement.
    ///
    /// A different file hash, or no transfer in progress, starts a new
    /// transfer: stale artifacts are removed, then the marker is rewritten.
    /// Re-announcing the in-progress transfer changes nothing.
    pub fn accept(&mut self, request: TransferRequest) -> Result<(), TransferError> {
        let is_new =
            self.request.file_hash != request.file_hash || !self.response.status.is_active();

        if !is_new {
            debug!(filename = %request.filename, "download re-announced, continuing");
            return Ok(());
        }

        if let Err(e) = validate_filename(&request.filename) {
            warn!(%e, "download request rejected");
            self.response = TransferResponse {
                filename: request.filename,
                status: TransferStatus::Error,
                ..Default::default()
            };
            return Err(e);
        }

        info!(
            filename = %request.filename,
            total_chunks = request.total_super_chunks,
            file_hash = %hex::encode(&request.file_hash),
            target = ?request.target,
            "download request accepted"
        );
        self.reset(request);

        // Stale artifacts must be gone before the marker names the new transfer.
        if let Err(e) = self
            .store
            .delete_artifacts()
            .and_then(|_| self.store.write_marker(&self.request))
        {
            error!(%e, "failed to prepare download storage");
            self.response.status = TransferStatus::Error;
            return Err(e);
        }
        Ok(())
    }

    /// Persists one reassembled super-chunk and finalizes after the last.
    ///
    /// A storage failure leaves the index unchanged so the same
    /// super-chunk can be sent again.
    pub fn on_super_chunk_received(&mut self, chunk: &[u8]) -> Result<(), TransferError> {
        if !self.response.status.is_active() {
            return Err(TransferError::MalformedHandshake(format!(
                "super-chunk received while download is {:?}",
                self.response.status
            )));
        }
        let index = self.response.next_super_chunk_index;
        if index >= self.response.total_super_chunks {
            error!(index, total = self.response.total_super_chunks, "unexpected super-chunk");
            return Err(TransferError::MalformedHandshake(format!(
                "super-chunk {index} exceeds declared total {}",
                self.response.total_super_chunks
            )));
        }

        self.store.write_artifact(index, chunk)?;

        self.response.last_chunk_hash = digest(chunk).to_vec();
        self.response.next_super_chunk_index = index + 1;
        self.response.bytes_transferred += chunk.len() as u64;

        info!(
            received = index + 1,
            total = self.response.total_super_chunks,
            bytes = chunk.len(),
            "super-chunk stored"
        );

        if self.response.next_super_chunk_index == self.response.total_super_chunks {
            self.finalize()?;
        }

        self.response.elapsed_seconds = self.transfer_duration().as_secs_f64();
        Ok(())
    }

    /// Concatenates all artifacts, checks the whole-file hash and reports
    /// the outcome through the completion callback.
    fn finalize(&mut self) -> Result<(), TransferError> {
        let final_path = self.store.dir().join(&self.request.filename);
        let part_path = self
            .store
            .dir()
            .join(format!("{}.part", self.request.filename));

        let mut hasher = StreamDigest::new();
        {
            let mut out = BufWriter::new(std::fs::File::create(&part_path)?);
            for i in 0..self.request.total_super_chunks {
                let chunk = self.store.read_artifact(i)?;
                hasher.update(&chunk);
                out.write_all(&chunk)?;
            }
            out.flush()?;
        }
        let computed = hasher.finish();
        let duration = self.clock.stop();

        // The transfer is over either way; it will not resume.
        self.store.delete_marker()?;

        if computed.as_slice() == self.request.file_hash.as_slice() {
            std::fs::rename(&part_path, &final_path)?;
            self.response.status = TransferStatus::Finished;
            self.store.delete_artifacts()?;
            info!(
                filename = %self.request.filename,
                secs = duration.as_secs_f64(),
                "download finished"
            );
            (self.on_complete)(Some(&final_path), self.request.target);
        } else {
            if let Err(e) = std::fs::remove_file(&part_path) {
                warn!(%e, path = %part_path.display(), "failed to remove partial file");
            }
            self.response.status = TransferStatus::Error;
            error!(
                filename = %self.request.filename,
                expected = %hex::encode(&self.request.file_hash),
                computed = %hex::encode(computed),
                "download finished with invalid hash, artifacts kept"
            );
            (self.on_complete)(None, Target::Unknown);
        }
        Ok(())
    }

    /// Returns the current progress snapshot.
    ///
    /// A zero super-chunk count or an index past the declared total means
    /// the handshake was malformed and forces `Error`.
    pub fn response(&mut self) -> TransferResponse {
        if self.response.total_super_chunks == 0 {
            if self.response.status != TransferStatus::Error {
                error!("number of super-chunks is zero, was a download announced?");
            }
            self.response.status = TransferStatus::Error;
        } else if self.response.next_super_chunk_index > self.response.total_super_chunks {
            error!(
                next = self.response.next_super_chunk_index,
                total = self.response.total_super_chunks,
                "non-existent super-chunk requested"
            );
            self.response.status = TransferStatus::Error;
        }

        if self.response.status.is_active() {
            self.response.elapsed_seconds = self.transfer_duration().as_secs_f64();
        }
        debug!(response = ?self.response, "download response");
        self.response.clone()
    }

    /// Running time while in progress, total time once finished, else zero.
    pub fn transfer_duration(&self) -> Duration {
        match self.response.status {
            TransferStatus::InProgress | TransferStatus::Finished => self.clock.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn status(&self) -> TransferStatus {
        self.response.status
    }

    /// The accepted (or resumed) request.
    pub fn request(&self) -> &TransferRequest {
        &self.request
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.response.bytes_transferred
    }

    pub fn download_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Path a successful download is written to.
    pub fn final_path(&self) -> PathBuf {
        self.store.dir().join(&self.request.filename)
    }
}
