use assay_codec::CodecError;
use assay_crypto::CryptoError;
use thiserror::Error;

use crate::gate::Denial;
use crate::session::Identity;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or missing input. Raised before any shared state is read.
    #[error("{0}")]
    Validation(String),
    #[error("unauthorized")]
    Auth,
    /// Identity is active or already consumed. Callers only see the generic form.
    #[error("identity {identity} refused: {reason}")]
    Conflict { identity: Identity, reason: Denial },
    /// Token does not resolve to a live assignment (unknown or already finalized).
    #[error("unknown session token")]
    NotFound,
    #[error("configuration error: {0}")]
    Config(String),
    /// A service-side failure with no better home: a lost worker, an exhausted token source.
    #[error("internal error: {0}")]
    Internal(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("token generation failed: {0}")]
    Crypto(#[from] CryptoError),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }
}
