#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("checksum mismatch: expected {}, got {}", hex::encode(.expected), hex::encode(.actual))]
    Mismatch {
        expected: Vec<u8>,
        actual:   Vec<u8>,
    },

    #[error("invalid hex digest {0:?}")]
    InvalidDigest(String),
}

impl VerificationError {
    pub fn actual(&self) -> Option<&[u8]> {
        match self {
            VerificationError::Mismatch { actual, .. } => Some(actual),
            VerificationError::InvalidDigest(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VerificationError>;
