use core::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::CryptoError;

/// Raw token length. 16 bytes = 128 bits of entropy, hex-encoded on the wire.
pub const TOKEN_BYTES: usize = 16;

/// An opaque, unguessable session credential.
///
/// Tokens are compared by value when resolving a submission, so the wire form
/// (lowercase hex) is the canonical representation.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Draws a fresh token from the operating system CSPRNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut raw = [0u8; TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut raw)?;
        let token = Self(hex::encode(raw));
        raw.zeroize();
        Ok(token)
    }

    /// Wraps a token presented by a client. No validation: unknown tokens
    /// simply fail to resolve.
    pub fn from_wire(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "SessionToken({prefix}…)")
    }
}
