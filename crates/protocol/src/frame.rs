use crate::digest::{TruncatedDigest, truncated_digest};

/// Smallest unit carried by the transport.
///
/// Frames exist only while one super-chunk is in flight and are never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// 0-based position in the stream; negative means "no frame".
    pub sequence_index: i32,
    /// Number of frames declared for the current super-chunk.
    pub total_frames: u32,
    /// First two bytes of the MD5 digest of `data`.
    pub truncated_hash: TruncatedDigest,
    pub data: Vec<u8>,
}

impl Frame {
    /// Sentinel index of the end-of-stream marker.
    pub const NO_FRAME: i32 = -1;

    /// Builds a frame and stamps its truncated hash.
    pub fn new(sequence_index: i32, total_frames: u32, data: Vec<u8>) -> Self {
        Self {
            sequence_index,
            total_frames,
            truncated_hash: truncated_digest(&data),
            data,
        }
    }

    /// The reserved marker returned when no frame is available.
    pub fn end_of_stream() -> Self {
        Self {
            sequence_index: Self::NO_FRAME,
            total_frames: 0,
            truncated_hash: [0; 2],
            data: Vec::new(),
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.sequence_index < 0
    }

    /// Returns `true` if `truncated_hash` matches the carried data.
    pub fn verify(&self) -> bool {
        truncated_digest(&self.data) == self.truncated_hash
    }
}
