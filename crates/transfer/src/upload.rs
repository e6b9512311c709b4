//! Device-side send state machine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bleft_link::FrameSplitter;
use bleft_protocol::{Frame, TransferRequest, TransferResponse, TransferStatus, truncated_digest};
use tracing::{debug, error, info, warn};

use crate::TransferError;
use crate::chunked::{SuperChunkReader, super_chunk_count};
use crate::progress::TransferClock;
use crate::validation::validate_filename;

/// Sends a file from the upload directory one super-chunk at a time.
///
/// Each response read while in progress hands the next super-chunk to the
/// frame splitter. The peer acknowledges it by echoing the super-chunk
/// hash in its next request.
pub struct UploadSession {
    upload_dir: PathBuf,
    super_chunk_size: usize,
    splitter: FrameSplitter,
    reader: Option<SuperChunkReader>,
    /// Super-chunk handed to the splitter and not yet acknowledged.
    pending: Option<Vec<u8>>,
    response: TransferResponse,
    clock: TransferClock,
}

impl UploadSession {
    /// Creates an idle session, creating `upload_dir` if needed.
    pub fn new(
        upload_dir: &Path,
        super_chunk_size: usize,
        splitter: FrameSplitter,
    ) -> Result<Self, TransferError> {
        std::fs::create_dir_all(upload_dir)?;
        Ok(Self {
            upload_dir: upload_dir.to_path_buf(),
            super_chunk_size,
            splitter,
            reader: None,
            pending: None,
            response: TransferResponse::default(),
            clock: TransferClock::new(),
        })
    }

    /// Starts an upload (empty hash) or acknowledges the last super-chunk.
    pub fn accept(&mut self, request: TransferRequest) -> Result<(), TransferError> {
        if request.file_hash.is_empty() {
            self.start(request.filename)
        } else {
            self.acknowledge(&request.file_hash);
            Ok(())
        }
    }

    fn start(&mut self, filename: String) -> Result<(), TransferError> {
        self.reader = None;
        self.pending = None;
        self.clock.reset();
        self.response = TransferResponse {
            filename,
            ..Default::default()
        };

        if let Err(e) = validate_filename(&self.response.filename) {
            warn!(%e, "upload request rejected");
            self.response.status = TransferStatus::Error;
            return Err(e);
        }

        let path = self.upload_dir.join(&self.response.filename);
        if !path.is_file() {
            warn!(path = %path.display(), "requested upload file not found");
            self.response.status = TransferStatus::FileNotFound;
            return Ok(());
        }

        let reader = SuperChunkReader::open(&path, self.super_chunk_size)?;
        self.response.total_super_chunks =
            super_chunk_count(reader.file_size(), self.super_chunk_size)?;
        self.response.status = TransferStatus::InProgress;
        self.reader = Some(reader);
        self.clock.start();

        info!(
            filename = %self.response.filename,
            total_chunks = self.response.total_super_chunks,
            "upload started"
        );
        Ok(())
    }

    fn acknowledge(&mut self, echoed: &[u8]) {
        if !self.response.status.is_active() {
            debug!(status = ?self.response.status, "acknowledgement ignored, no upload in progress");
            return;
        }
        if self.pending.is_none() {
            warn!(
                next = self.response.next_super_chunk_index,
                "acknowledgement ignored, no super-chunk awaiting one"
            );
            return;
        }
        if echoed != self.response.last_chunk_hash.as_slice() {
            warn!(
                echoed = %hex::encode(echoed),
                expected = %hex::encode(&self.response.last_chunk_hash),
                "acknowledged hash does not match last super-chunk"
            );
        }

        self.pending = None;
        self.response.next_super_chunk_index += 1;
        debug!(next = self.response.next_super_chunk_index, "super-chunk acknowledged");
    }

    /// Returns the progress snapshot, queueing the next super-chunk for
    /// transmission if the previous one was acknowledged.
    ///
    /// Reading the response again before the acknowledgement re-queues the
    /// same super-chunk from its first frame.
    pub fn response(&mut self) -> Result<TransferResponse, TransferError> {
        if !self.response.status.is_active() {
            return Ok(self.response.clone());
        }

        if self.response.next_super_chunk_index > self.response.total_super_chunks {
            error!(
                next = self.response.next_super_chunk_index,
                total = self.response.total_super_chunks,
                "non-existent super-chunk requested"
            );
            self.response.status = TransferStatus::Error;
            self.reader = None;
            self.pending = None;
            self.clock.stop();
            return Ok(self.response.clone());
        }

        if let Some(chunk) = &self.pending {
            debug!(index = self.response.next_super_chunk_index, "super-chunk re-queued");
            self.splitter.send(chunk.clone())?;
        } else {
            let next = match self.reader.as_mut() {
                Some(reader) => reader.next_chunk()?,
                None => None,
            };
            match next {
                Some(chunk) => {
                    self.response.last_chunk_hash = truncated_digest(&chunk).to_vec();
                    self.response.bytes_transferred += chunk.len() as u64;
                    self.splitter.send(chunk.clone())?;
                    self.pending = Some(chunk);
                }
                None => {
                    self.response.status = TransferStatus::Finished;
                    self.response.last_chunk_hash.clear();
                    self.reader = None;
                    let duration = self.clock.stop();
                    info!(
                        filename = %self.response.filename,
                        bytes = self.response.bytes_transferred,
                        secs = duration.as_secs_f64(),
                        "upload finished"
                    );
                }
            }
        }

        self.response.elapsed_seconds = self.transfer_duration().as_secs_f64();
        Ok(self.response.clone())
    }

    /// Pulls the next outbound frame of the queued super-chunk.
    pub fn next_frame(&mut self) -> Frame {
        self.splitter.next_frame()
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

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}
