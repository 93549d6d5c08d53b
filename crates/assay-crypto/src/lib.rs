//! # assay-crypto: Session Credentials
//!
//! - [`SessionToken`]: 128-bit bearer token drawn from the OS entropy source.
//! - [`SharedSecret`]: zeroize-on-drop password with constant-time comparison.

pub mod secret;
pub mod token;

pub use secret::SharedSecret;
pub use token::{SessionToken, TOKEN_BYTES};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("entropy source unavailable: {0}")]
    Entropy(#[from] rand::Error),
}
