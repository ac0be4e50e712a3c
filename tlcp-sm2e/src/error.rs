//! Error types.

use core::fmt;
use thiserror::Error;

/// Result type with the `tlcp-sm2e` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while negotiating or running the ephemeral SM2 key exchange.
///
/// Every error is terminal for the current handshake attempt; the handshake
/// engine is expected to send [`Error::alert`] and tear the connection down.
#[derive(Debug, Error)]
pub enum Error {
    /// The peer's encoded point is malformed, not on the curve, or the
    /// point at infinity.
    #[error("could not decode SM2 public key")]
    Decoding(#[source] elliptic_curve::Error),

    /// The peer's public key is not permitted by the algorithm constraints.
    #[error("public key does not comply with algorithm constraints")]
    ConstraintViolation,

    /// No SM2 possession and SM2 credentials share a named group.
    #[error("no sufficient SM2 key agreement parameters negotiated")]
    NoMatchingGroup,

    /// The peer's long-term encryption public key is not available.
    #[error("no peer encryption public key for SM2 key agreement")]
    MissingPeerEncryptionKey,

    /// The SM2 key agreement computation failed.
    #[error("could not generate secret")]
    Agreement(#[source] elliptic_curve::Error),

    /// The ephemeral SM2 key pair could not be generated.
    #[error("could not generate SM2 key pair")]
    KeyGeneration(#[source] rand_core::Error),

    /// An API contract was violated by the caller.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl Error {
    /// Alert to send to the peer for this error.
    pub fn alert(&self) -> Alert {
        match self {
            Self::Decoding(_)
            | Self::ConstraintViolation
            | Self::NoMatchingGroup
            | Self::MissingPeerEncryptionKey
            | Self::Agreement(_) => Alert::HandshakeFailure,
            Self::KeyGeneration(_) | Self::Internal(_) => Alert::InternalError,
        }
    }
}

/// Fatal alert descriptions raised by this crate.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Alert {
    /// `handshake_failure(40)`
    HandshakeFailure = 40,

    /// `internal_error(80)`
    InternalError = 80,
}

impl Alert {
    /// Alert description code as sent on the wire.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Alert description name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::HandshakeFailure => "handshake_failure",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}
