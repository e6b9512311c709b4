use std::io::Read;
use std::path::Path;

use bleft_protocol::{Md5Digest, StreamDigest};

use crate::TransferError;

/// Computes the MD5 of an entire file.
pub fn file_digest(path: &Path) -> Result<Md5Digest, TransferError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = StreamDigest::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

/// Number of super-chunks needed for `file_size` bytes.
pub fn super_chunk_count(file_size: u64, super_chunk_size: usize) -> Result<u32, TransferError> {
    let count = file_size.div_ceil(super_chunk_size as u64);
    u32::try_from(count).map_err(|_| {
        TransferError::FileTooLarge(format!(
            "{file_size} bytes need {count} super-chunks of {super_chunk_size} bytes"
        ))
    })
}

/// Lazily reads a file one super-chunk at a time.
pub struct SuperChunkReader {
    file: std::fs::File,
    chunk_size: usize,
    offset: u64,
    file_size: u64,
    exhausted: bool,
}

impl SuperChunkReader {
    /// Opens `path` for chunked reading. `chunk_size` must be non-zero.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::Config(
                "super_chunk_size must be non-zero".into(),
            ));
        }
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        Ok(Self {
            file,
            chunk_size,
            offset: 0,
            file_size,
            exhausted: false,
        })
    }

    /// Reads the next super-chunk. Returns `None` once the file is consumed.
    ///
    /// A short read marks the end: the following call returns `None`.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransferError> {
        if self.exhausted {
            return Ok(None);
        }

        let mut buf = Vec::with_capacity(self.chunk_size);
        (&mut self.file)
            .take(self.chunk_size as u64)
            .read_to_end(&mut buf)?;

        if buf.len() < self.chunk_size || self.offset + buf.len() as u64 >= self.file_size {
            self.exhausted = true;
        }
        if buf.is_empty() {
            return Ok(None);
        }
        self.offset += buf.len() as u64;
        Ok(Some(buf))
    }

    /// Bytes read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// File size at open time.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn remaining(&self) -> u64 {
        self.file_size.saturating_sub(self.offset)
    }
}
