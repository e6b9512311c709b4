//! Link-level (LL) framing for the BLE transfer.
//!
//! One super-chunk at a time is cut into frames no larger than the MTU by
//! [`FrameSplitter`] and glued back together by [`FrameAssembler`], which
//! checks ordering and the per-frame truncated hash.
//!
//! # Wire format
//!
//! See [`wire`] for the byte layout used when the transport carries raw
//! buffers instead of structured records.

pub mod assembler;
pub mod error;
pub mod splitter;
pub mod wire;

pub use assembler::{AssemblerState, FrameAssembler, FrameFault, Reception};
pub use error::LinkError;
pub use splitter::FrameSplitter;
