use ferry_stream::Sink;

use crate::{Hasher, Result, VerificationError};

/// A sink that hashes everything written to it and keeps nothing else.
///
/// Used as the mirror of a tee so bytes are hashed in the same pass that
/// moves them.
pub struct HashSink<H> {
    hasher: H,
    bytes:  u64,
}

impl<H: Hasher> HashSink<H> {
    pub fn new(hasher: H) -> Self { Self { hasher, bytes: 0 } }

    /// Number of bytes hashed so far.
    pub fn bytes(&self) -> u64 { self.bytes }

    pub fn digest(self) -> Vec<u8> { self.hasher.finalize() }

    pub fn hex_digest(self) -> String { hex::encode(self.digest()) }

    /// Compare against `expected`, returning the digest when it matches.
    pub fn finish(self, expected: &[u8]) -> Result<Vec<u8>> {
        let actual = self.digest();
        if actual == expected {
            Ok(actual)
        } else {
            Err(VerificationError::Mismatch {
                expected: expected.to_vec(),
                actual,
            })
        }
    }

    /// Like [`HashSink::finish`], with the expected digest given as hex.
    pub fn finish_hex(self, expected: &str) -> Result<Vec<u8>> {
        let expected = hex::decode(expected.trim())
            .map_err(|_| VerificationError::InvalidDigest(expected.to_string()))?;
        self.finish(&expected)
    }
}

impl<H: Hasher> Sink for HashSink<H> {
    async fn write(&mut self, buf: &[u8]) -> ferry_stream::Result<usize> {
        self.hasher.update(buf);
        self.bytes += buf.len() as u64;
        Ok(buf.len())
    }
}
