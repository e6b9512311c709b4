//! MD5 helpers for whole-file, super-chunk and per-frame integrity.

use md5::{Digest, Md5};

use crate::constants::{DIGEST_LEN, TRUNCATED_DIGEST_LEN};

/// A full 16-byte digest.
pub type Md5Digest = [u8; DIGEST_LEN];

/// The 2-byte digest prefix carried by every frame.
pub type TruncatedDigest = [u8; TRUNCATED_DIGEST_LEN];

/// Computes the MD5 digest of `data`.
pub fn digest(data: &[u8]) -> Md5Digest {
    let mut hasher = StreamDigest::new();
    hasher.update(data);
    hasher.finish()
}

/// Computes the first two bytes of the MD5 digest of `data`.
pub fn truncated_digest(data: &[u8]) -> TruncatedDigest {
    let full = digest(data);
    [full[0], full[1]]
}

/// Incremental digest over data fed in pieces (e.g. artifacts read in order).
#[derive(Clone, Default)]
pub struct StreamDigest {
    hasher: Md5,
}

impl StreamDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn finish(self) -> Md5Digest {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&self.hasher.finalize());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_known_vector() {
        // RFC 1321 test suite: MD5("abc").
        let d = digest(b"abc");
        assert_eq!(
            d,
            [
                0x90, 0x01, 0x50, 0x98, 0x3c, 0xd2, 0x4f, 0xb0, 0xd6, 0x96, 0x3f, 0x7d, 0x28, 0xe1,
                0x7f, 0x72
            ]
        );
    }

    #[test]
    fn truncated_is_prefix_of_full() {
        let data = b"Lorem ipsum dolor sit amet";
        let full = digest(data);
        assert_eq!(truncated_digest(data), [full[0], full[1]]);
    }

    #[test]
    fn stream_matches_one_shot() {
        let mut s = StreamDigest::new();
        s.update(b"hello ");
        s.update(b"world");
        assert_eq!(s.finish(), digest(b"hello world"));
    }

    #[test]
    fn empty_input_has_digest() {
        // MD5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(truncated_digest(b""), [0xd4, 0x1d]);
    }
}
