//! Byte layout of a frame for transports that carry raw buffers.
//!
//! # Wire format
//!
//! ```text
//! [4 bytes BE: sequence_index (i32, -1 = end of stream)]
//! [4 bytes BE: total_frames]
//! [2 bytes:    truncated_hash]
//! [2 bytes BE: data_len]
//! [data_len bytes: data]
//! ```

use bleft_protocol::Frame;

use crate::error::LinkError;

/// Bytes of fixed overhead preceding the frame data.
pub const WIRE_HEADER_LEN: usize = 12;

/// Serializes a frame.
pub fn encode_frame(frame: &Frame) -> Result<Vec<u8>, LinkError> {
    let data_len = u16::try_from(frame.data.len()).map_err(|_| {
        LinkError::Malformed(format!(
            "data too long: {} bytes (max {})",
            frame.data.len(),
            u16::MAX
        ))
    })?;

    let mut buf = Vec::with_capacity(WIRE_HEADER_LEN + frame.data.len());
    buf.extend_from_slice(&frame.sequence_index.to_be_bytes());
    buf.extend_from_slice(&frame.total_frames.to_be_bytes());
    buf.extend_from_slice(&frame.truncated_hash);
    buf.extend_from_slice(&data_len.to_be_bytes());
    buf.extend_from_slice(&frame.data);
    Ok(buf)
}

/// Parses a frame. The buffer must hold exactly one frame.
pub fn decode_frame(buf: &[u8]) -> Result<Frame, LinkError> {
    if buf.len() < WIRE_HEADER_LEN {
        return Err(LinkError::Malformed(format!(
            "short frame: {} bytes (header is {WIRE_HEADER_LEN})",
            buf.len()
        )));
    }

    let sequence_index = i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let total_frames = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let truncated_hash = [buf[8], buf[9]];
    let data_len = u16::from_be_bytes([buf[10], buf[11]]) as usize;

    let data = &buf[WIRE_HEADER_LEN..];
    if data.len() != data_len {
        return Err(LinkError::Malformed(format!(
            "declared {data_len} data bytes, found {}",
            data.len()
        )));
    }

    Ok(Frame {
        sequence_index,
        total_frames,
        truncated_hash,
        data: data.to_vec(),
    })
}
