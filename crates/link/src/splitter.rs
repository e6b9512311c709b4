//! Send side: cuts one payload into a pull sequence of frames.

use bleft_protocol::Frame;
use tracing::debug;

use crate::error::LinkError;

/// Produces MTU-sized frames for one payload at a time.
///
/// The sequence is a plain cursor over the payload. Calling
/// [`send`](Self::send) discards whatever was left of the previous one.
#[derive(Debug)]
pub struct FrameSplitter {
    payload_size: usize,
    payload: Vec<u8>,
    offset: usize,
    next_index: u32,
    total_frames: u32,
}

impl FrameSplitter {
    /// Creates a splitter for the given MTU and per-frame header size.
    pub fn new(mtu: usize, header_size: usize) -> Result<Self, LinkError> {
        if mtu <= header_size {
            return Err(LinkError::InvalidMtu { mtu, header_size });
        }
        Ok(Self {
            payload_size: mtu - header_size,
            payload: Vec::new(),
            offset: 0,
            next_index: 0,
            total_frames: 0,
        })
    }

    /// Starts a new frame sequence over `payload`.
    ///
    /// Returns the number of frames the sequence will yield.
    pub fn send(&mut self, payload: Vec<u8>) -> Result<u32, LinkError> {
        let total = payload.len().div_ceil(self.payload_size);
        let total_frames = match u32::try_from(total) {
            Ok(t) if t <= i32::MAX as u32 => t,
            _ => return Err(LinkError::PayloadTooLarge { len: payload.len() }),
        };

        debug!(
            bytes = payload.len(),
            frames = total_frames,
            payload_size = self.payload_size,
            "frame sequence started"
        );

        self.payload = payload;
        self.offset = 0;
        self.next_index = 0;
        self.total_frames = total_frames;
        Ok(total_frames)
    }

    /// Pulls the next frame, or the end-of-stream marker when exhausted.
    pub fn next_frame(&mut self) -> Frame {
        if self.offset >= self.payload.len() {
            return Frame::end_of_stream();
        }

        let end = usize::min(self.offset + self.payload_size, self.payload.len());
        let frame = Frame::new(
            self.next_index as i32,
            self.total_frames,
            self.payload[self.offset..end].to_vec(),
        );
        self.offset = end;
        self.next_index += 1;
        frame
    }

    /// Payload bytes per frame (`mtu - header_size`).
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    /// Frames declared for the current sequence.
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Frames not yet pulled from the current sequence.
    pub fn remaining(&self) -> u32 {
        self.total_frames - self.next_index
    }

    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.payload.len()
    }
}

impl Iterator for FrameSplitter {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let frame = self.next_frame();
        (!frame.is_end_of_stream()).then_some(frame)
    }
}
