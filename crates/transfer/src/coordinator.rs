//! Single request/response surface over one download and one upload session.

use bleft_link::{FrameAssembler, FrameSplitter, Reception};
use bleft_protocol::{Direction, Frame, TransferRequest, TransferResponse};
use tracing::{debug, info, warn};

use crate::TransferError;
use crate::config::TransferConfig;
use crate::download::{CompletionCallback, DownloadSession};
use crate::upload::UploadSession;

/// Routes requests by direction and frames to the right link component.
///
/// Only one direction is active at a time. Switching direction keeps the
/// other session's in-memory state but stops routing to it.
pub struct TransferCoordinator {
    download: DownloadSession,
    upload: UploadSession,
    assembler: FrameAssembler,
    direction: Direction,
}

impl TransferCoordinator {
    /// Builds both sessions under `config.root_path`, resuming any
    /// interrupted download found there.
    pub fn new(
        config: &TransferConfig,
        on_complete: CompletionCallback,
    ) -> Result<Self, TransferError> {
        config.validate()?;
        let splitter = FrameSplitter::new(config.mtu, config.header_size)?;
        let download = DownloadSession::new(&config.download_dir(), on_complete)?;
        let upload = UploadSession::new(&config.upload_dir(), config.super_chunk_size, splitter)?;

        info!(
            root = %config.root_path.display(),
            mtu = config.mtu,
            super_chunk_size = config.super_chunk_size,
            "transfer coordinator ready"
        );

        Ok(Self {
            download,
            upload,
            assembler: FrameAssembler::new(),
            direction: Direction::default(),
        })
    }

    /// Dispatches a request to the session matching its direction.
    pub fn accept_request(&mut self, request: TransferRequest) -> Result<(), TransferError> {
        if request.direction != self.direction {
            let abandoned = match self.direction {
                Direction::ControllerToDevice => self.download.status(),
                Direction::DeviceToController => self.upload.status(),
            };
            if abandoned.is_active() {
                warn!(
                    from = ?self.direction,
                    to = ?request.direction,
                    "direction switched while a transfer is in progress"
                );
            } else {
                debug!(to = ?request.direction, "direction switched");
            }
            self.direction = request.direction;
        }

        match self.direction {
            Direction::ControllerToDevice => self.download.accept(request),
            Direction::DeviceToController => self.upload.accept(request),
        }
    }

    /// Current progress of the active session.
    pub fn current_response(&mut self) -> Result<TransferResponse, TransferError> {
        match self.direction {
            Direction::ControllerToDevice => Ok(self.download.response()),
            Direction::DeviceToController => self.upload.response(),
        }
    }

    /// Feeds one inbound frame; a completed super-chunk goes straight to
    /// the download session.
    pub fn on_frame(&mut self, frame: &Frame) -> Result<Reception, TransferError> {
        if self.direction != Direction::ControllerToDevice {
            return Err(TransferError::MalformedHandshake(
                "inbound frame while uploading".into(),
            ));
        }

        let reception = self.assembler.push(frame)?;
        if let Reception::Complete { .. } = reception {
            debug!(assembler = %self.assembler, "routing super-chunk to download");
            let chunk = self.assembler.take_data();
            self.download.on_super_chunk_received(&chunk)?;
        }
        Ok(reception)
    }

    /// Next outbound frame of the upload in progress, or end of stream.
    pub fn next_frame(&mut self) -> Frame {
        self.upload.next_frame()
    }

    pub fn active_direction(&self) -> Direction {
        self.direction
    }

    pub fn download(&self) -> &DownloadSession {
        &self.download
    }

    pub fn upload(&self) -> &UploadSession {
        &self.upload
    }

    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bleft_protocol::{Target, TransferStatus, digest};
    use tempfile::TempDir;

    fn config(root: &std::path::Path) -> TransferConfig {
        TransferConfig {
            mtu: 50,
            super_chunk_size: 64,
            ..TransferConfig::with_root(root)
        }
    }

    fn coordinator(root: &std::path::Path) -> TransferCoordinator {
        TransferCoordinator::new(&config(root), Box::new(|_, _| {})).unwrap()
    }

    #[test]
    fn creates_storage_directories() {
        let dir = TempDir::new().unwrap();
        let c = coordinator(dir.path());
        assert!(dir.path().join("download").is_dir());
        assert!(dir.path().join("upload").is_dir());
        assert_eq!(c.active_direction(), Direction::ControllerToDevice);
    }

    #[test]
    fn rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let bad = TransferConfig {
            mtu: 10,
            ..config(dir.path())
        };
        assert!(matches!(
            TransferCoordinator::new(&bad, Box::new(|_, _| {})),
            Err(TransferError::Config(_))
        ));
    }

    #[test]
    fn frames_complete_a_download() {
        let dir = TempDir::new().unwrap();
        let mut c = coordinator(dir.path());
        let data = b"firmware image".to_vec();

        c.accept_request(TransferRequest::download(
            "fw.bin",
            1,
            digest(&data).to_vec(),
            Target::Firmware,
        ))
        .unwrap();

        let mut splitter = FrameSplitter::new(20, 10).unwrap();
        splitter.send(data.clone()).unwrap();
        let mut last = None;
        for frame in &mut splitter {
            last = Some(c.on_frame(&frame).unwrap());
        }
        assert_eq!(last, Some(Reception::Complete { len: data.len() }));

        let r = c.current_response().unwrap();
        assert_eq!(r.status, TransferStatus::Finished);
        assert_eq!(std::fs::read(dir.path().join("download/fw.bin")).unwrap(), data);
    }

    #[test]
    fn routes_by_direction() {
        let dir = TempDir::new().unwrap();
        let mut c = coordinator(dir.path());
        std::fs::write(dir.path().join("upload/log.txt"), b"hello").unwrap();

        c.accept_request(TransferRequest::upload("log.txt")).unwrap();
        assert_eq!(c.active_direction(), Direction::DeviceToController);

        let r = c.current_response().unwrap();
        assert_eq!(r.status, TransferStatus::InProgress);
        assert_eq!(r.total_super_chunks, 1);
        assert_eq!(c.next_frame().data, b"hello".to_vec());
        assert!(c.next_frame().is_end_of_stream());
    }

    #[test]
    fn switching_to_upload_keeps_download_resumable() {
        let dir = TempDir::new().unwrap();
        let mut c = coordinator(dir.path());
        let data: Vec<u8> = (0..100u8).collect();
        let request =
            TransferRequest::download("fw.bin", 2, digest(&data).to_vec(), Target::Firmware);
        c.accept_request(request.clone()).unwrap();

        let mut splitter = FrameSplitter::new(50, 22).unwrap();
        splitter.send(data[..64].to_vec()).unwrap();
        for frame in &mut splitter {
            c.on_frame(&frame).unwrap();
        }
        assert_eq!(c.current_response().unwrap().next_super_chunk_index, 1);

        std::fs::write(dir.path().join("upload/log.txt"), b"hello").unwrap();
        c.accept_request(TransferRequest::upload("log.txt")).unwrap();
        assert_eq!(c.active_direction(), Direction::DeviceToController);
        assert_eq!(c.current_response().unwrap().filename, "log.txt");
        assert!(dir.path().join("download/request.json").is_file());
        assert_eq!(c.download().status(), TransferStatus::InProgress);

        c.accept_request(request).unwrap();
        assert_eq!(c.active_direction(), Direction::ControllerToDevice);
        let r = c.current_response().unwrap();
        assert_eq!(r.status, TransferStatus::InProgress);
        assert_eq!(r.next_super_chunk_index, 1);
        assert_eq!(r.bytes_transferred, 64);
    }

    #[test]
    fn inbound_frame_while_uploading_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut c = coordinator(dir.path());
        c.accept_request(TransferRequest::upload("missing")).unwrap();
        let frame = Frame::new(0, 1, b"x".to_vec());
        assert!(matches!(
            c.on_frame(&frame),
            Err(TransferError::MalformedHandshake(_))
        ));
    }

    #[test]
    fn corrupted_frame_surfaces_link_error() {
        let dir = TempDir::new().unwrap();
        let mut c = coordinator(dir.path());
        let mut frame = Frame::new(0, 1, b"payload".to_vec());
        frame.truncated_hash = [0, 0];
        assert!(matches!(c.on_frame(&frame), Err(TransferError::Link(_))));
    }
}
