//! Error types for the link layer.

/// Errors produced while framing or reassembling a super-chunk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("MTU {mtu} leaves no room for payload (header is {header_size} bytes)")]
    InvalidMtu { mtu: usize, header_size: usize },

    #[error("payload of {len} bytes needs more frames than a stream can index")]
    PayloadTooLarge { len: usize },

    #[error("frame {index} out of sequence ({remaining} of {total} frames outstanding)")]
    Sequence { index: i32, remaining: u32, total: u32 },

    #[error("frame {index} failed integrity check (declared {declared}, computed {computed})")]
    Integrity {
        index: i32,
        declared: String,
        computed: String,
    },

    #[error("malformed frame: {0}")]
    Malformed(String),
}
