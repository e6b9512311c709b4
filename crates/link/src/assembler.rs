//! Receive side: rebuilds one super-chunk from an ordered frame stream.

use std::fmt;
use std::time::{Duration, Instant};

use bleft_protocol::{Frame, truncated_digest};
use tracing::{debug, warn};

use crate::error::LinkError;

/// Why the current super-chunk was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFault {
    WrongHash,
    WrongSequence,
}

/// Reception state for the current super-chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Idle,
    Receiving,
    Complete,
    Failed(FrameFault),
}

/// Outcome of feeding one accepted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reception {
    /// More frames are owed.
    Pending { remaining: u32 },
    /// The super-chunk is complete; collect it with
    /// [`FrameAssembler::take_data`].
    Complete { len: usize },
}

/// Reassembles frames into a single buffer.
///
/// Only one super-chunk is ever buffered. A frame with index 0 always
/// restarts reception, which lets a peer resynchronise mid-chunk.
#[derive(Debug)]
pub struct FrameAssembler {
    state: AssemblerState,
    total_frames: u32,
    remaining: u32,
    data: Vec<u8>,
    started_at: Option<Instant>,
    duration: Duration,
    new_data: bool,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            state: AssemblerState::Idle,
            total_frames: 0,
            remaining: 0,
            data: Vec::new(),
            started_at: None,
            duration: Duration::ZERO,
            new_data: false,
        }
    }

    fn reset(&mut self, total_frames: u32) {
        self.state = AssemblerState::Receiving;
        self.total_frames = total_frames;
        self.remaining = total_frames;
        self.data.clear();
        self.started_at = Some(Instant::now());
        self.duration = Duration::ZERO;
        self.new_data = false;
    }

    fn fail(&mut self, fault: FrameFault) {
        self.state = AssemblerState::Failed(fault);
        self.remaining = 0;
        self.data.clear();
        self.new_data = false;
    }

    /// Consumes one inbound frame.
    ///
    /// On a sequence or hash fault the partial buffer is dropped and the
    /// assembler stays failed until the next frame with index 0.
    pub fn push(&mut self, frame: &Frame) -> Result<Reception, LinkError> {
        if frame.sequence_index == 0 {
            self.reset(frame.total_frames);
        }

        if frame.sequence_index < 0 || frame.total_frames == 0 || !self.in_sequence(frame) {
            let err = LinkError::Sequence {
                index: frame.sequence_index,
                remaining: self.remaining,
                total: frame.total_frames,
            };
            warn!(%err, "frame rejected");
            self.fail(FrameFault::WrongSequence);
            return Err(err);
        }

        let computed = truncated_digest(&frame.data);
        if computed != frame.truncated_hash {
            let err = LinkError::Integrity {
                index: frame.sequence_index,
                declared: hex::encode(frame.truncated_hash),
                computed: hex::encode(computed),
            };
            warn!(%err, "frame rejected");
            self.fail(FrameFault::WrongHash);
            return Err(err);
        }

        self.data.extend_from_slice(&frame.data);
        self.remaining -= 1;

        if self.remaining > 0 {
            return Ok(Reception::Pending {
                remaining: self.remaining,
            });
        }

        self.state = AssemblerState::Complete;
        self.duration = self
            .started_at
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO);
        self.new_data = true;
        debug!(
            bytes = self.data.len(),
            frames = self.total_frames,
            "super-chunk reassembled"
        );
        Ok(Reception::Complete {
            len: self.data.len(),
        })
    }

    /// Frames owed plus the index just received must equal the declared total.
    fn in_sequence(&self, frame: &Frame) -> bool {
        if self.state != AssemblerState::Receiving || frame.total_frames != self.total_frames {
            return false;
        }
        i64::from(self.remaining) + i64::from(frame.sequence_index)
            == i64::from(frame.total_frames)
    }

    /// Hands the assembled buffer to the caller and clears the new-data flag.
    pub fn take_data(&mut self) -> Vec<u8> {
        self.new_data = false;
        std::mem::take(&mut self.data)
    }

    /// Returns `true` if a completed buffer has not been taken yet.
    pub fn has_new_data(&self) -> bool {
        self.new_data
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Frames still owed for the current super-chunk.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Duration of the last completed reception; zero while receiving.
    pub fn transfer_duration(&self) -> Duration {
        if self.state == AssemblerState::Receiving {
            return Duration::ZERO;
        }
        self.duration
    }
}

impl fmt::Display for FrameAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            AssemblerState::Failed(fault) => write!(f, "last error: {fault:?}"),
            AssemblerState::Receiving => write!(f, "transfer in progress ({})", self.remaining),
            AssemblerState::Complete if self.new_data => {
                let secs = self.duration.as_secs_f64();
                let bytes = self.data.len();
                let speed = if secs > 0.0 { bytes as f64 / secs } else { 0.0 };
                write!(
                    f,
                    "finished: {bytes} bytes received in {secs:.2} s = {speed:.1} bytes/s"
                )
            }
            _ => write!(f, "idle"),
        }
    }
}
