/// MTU assumed until the transport negotiates a different one.
pub const DEFAULT_MTU: usize = 185;

/// Per-frame overhead the protocol reserves out of every MTU.
///
/// Fixed per protocol version and sized for the protobuf encoding of a
/// frame plus transport framing. The usable payload of a frame is
/// `mtu - FRAME_HEADER_SIZE`. The raw codec in `bleft-link` needs only 12
/// of these bytes; the rest is headroom.
pub const FRAME_HEADER_SIZE: usize = 22;

/// Default super-chunk size: 100 KiB.
///
/// Independent of the MTU. Smaller values finish transfers in more,
/// shorter super-chunks, which is handy in tests.
pub const DEFAULT_SUPER_CHUNK_SIZE: usize = 100 * 1024;

/// Length of a full digest in bytes (MD5).
pub const DIGEST_LEN: usize = 16;

/// Length of the per-frame digest prefix in bytes.
pub const TRUNCATED_DIGEST_LEN: usize = 2;
