//! Drives one upload on the device endpoint into a download on the
//! controller endpoint, playing the controller's side of the handshake.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use bleft_protocol::{Target, TransferRequest, TransferStatus};
use bleft_transfer::{TransferCoordinator, file_digest, validate_filename};
use tracing::{info, warn};

use crate::config::Config;

/// Copies `file` into the device's upload directory, transfers it and
/// returns where the controller stored it.
pub fn run(config: &Config, file: &Path) -> anyhow::Result<PathBuf> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("not a file name: {}", file.display()))?
        .to_string();
    validate_filename(&filename)?;

    let mut device = TransferCoordinator::new(&config.device, Box::new(|_, _| {}))?;
    let staged = config.device.upload_dir().join(&filename);
    if staged != file {
        std::fs::copy(file, &staged)
            .with_context(|| format!("failed to stage {}", file.display()))?;
    }

    let mut controller = TransferCoordinator::new(
        &config.controller,
        Box::new(|path: Option<&Path>, target: Target| match path {
            Some(p) => info!(path = %p.display(), ?target, "file received"),
            None => warn!("received file failed verification"),
        }),
    )?;

    device.accept_request(TransferRequest::upload(filename.clone()))?;
    let mut response = device.current_response()?;
    match response.status {
        TransferStatus::InProgress | TransferStatus::Finished => {}
        other => bail!("device refused upload of {filename}: {other:?}"),
    }

    controller.accept_request(TransferRequest::download(
        filename.clone(),
        response.total_super_chunks,
        file_digest(&staged)?.to_vec(),
        Target::UserData,
    ))?;

    while response.status == TransferStatus::InProgress {
        loop {
            let frame = device.next_frame();
            if frame.is_end_of_stream() {
                break;
            }
            controller.on_frame(&frame)?;
        }
        info!(
            percent = response.percentage(),
            link = %controller.assembler(),
            "super-chunk delivered"
        );
        device.accept_request(TransferRequest::upload_ack(
            filename.clone(),
            response.last_chunk_hash.clone(),
        ))?;
        response = device.current_response()?;
    }

    if response.status != TransferStatus::Finished {
        bail!("upload ended with status {:?}", response.status);
    }
    let received = controller.current_response()?;
    if received.status != TransferStatus::Finished {
        bail!("download ended with status {:?}", received.status);
    }

    info!(
        bytes = received.bytes_transferred,
        secs = received.elapsed_seconds,
        "transfer verified"
    );
    Ok(controller.download().final_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bleft_transfer::TransferConfig;

    fn config(root: &Path) -> Config {
        Config {
            device: TransferConfig {
                mtu: 64,
                super_chunk_size: 512,
                ..TransferConfig::with_root(root.join("device"))
            },
            controller: TransferConfig {
                mtu: 64,
                super_chunk_size: 512,
                ..TransferConfig::with_root(root.join("controller"))
            },
        }
    }

    #[test]
    fn loops_a_file_through_both_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        let data: Vec<u8> = (0..2000u32).map(|i| (i % 97) as u8).collect();
        std::fs::write(&source, &data).unwrap();

        let received = run(&config(dir.path()), &source).unwrap();
        assert_eq!(received, dir.path().join("controller/download/notes.txt"));
        assert_eq!(std::fs::read(received).unwrap(), data);
    }

    #[test]
    fn empty_file_is_refused_by_the_controller() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.txt");
        std::fs::write(&source, b"").unwrap();

        assert!(run(&config(dir.path()), &source).is_err());
    }
}
