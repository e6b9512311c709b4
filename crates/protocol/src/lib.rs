//! Wire records shared by both ends of the BLE file transfer.
//!
//! The transport carries two kinds of message: the request/response
//! handshake ([`TransferRequest`] / [`TransferResponse`]) and the small
//! link-level [`Frame`]s that move one super-chunk at a time.

pub mod constants;
pub mod digest;
pub mod frame;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{
    DEFAULT_MTU, DEFAULT_SUPER_CHUNK_SIZE, DIGEST_LEN, FRAME_HEADER_SIZE, TRUNCATED_DIGEST_LEN,
};
pub use digest::{Md5Digest, StreamDigest, TruncatedDigest, digest, truncated_digest};
pub use frame::Frame;
pub use types::{Direction, Target, TransferRequest, TransferResponse, TransferStatus};
