//! Long-term TLCP encryption key material.
//!
//! TLCP endpoints own two certificates: a signing certificate and an
//! encryption certificate. The SM2 key exchange mixes the encryption key
//! pairs of both sides into the agreement. Certificate parsing and
//! validation happen before the key exchange runs.

use crate::{Error, PublicKey, Result, SecretKey};
use core::fmt::{self, Debug};

/// Local encryption key pair, established by certificate authentication.
pub struct TlcpPossession {
    enc_secret_key: SecretKey,
    enc_public_key: PublicKey,
}

impl TlcpPossession {
    /// Create a possession from the encryption certificate's secret key.
    pub fn new(enc_secret_key: SecretKey) -> Self {
        let enc_public_key = enc_secret_key.public_key();
        Self {
            enc_secret_key,
            enc_public_key,
        }
    }

    /// Parse the encryption secret key from a big endian-encoded byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        SecretKey::from_slice(bytes)
            .map(Self::new)
            .map_err(|_| Error::Internal("invalid TLCP encryption secret key"))
    }

    /// Borrow the encryption secret key.
    ///
    /// # ⚠️ Warning
    ///
    /// This value is key material.
    ///
    /// Please treat it with the care it deserves!
    pub fn secret_key(&self) -> &SecretKey {
        &self.enc_secret_key
    }

    /// Borrow the encryption public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.enc_public_key
    }
}

impl Debug for TlcpPossession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlcpPossession")
            .field("enc_public_key", &self.enc_public_key)
            .finish_non_exhaustive()
    }
}

/// Peer's encryption public key, taken from its encryption certificate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TlcpCredentials {
    enc_public_key: PublicKey,
}

impl TlcpCredentials {
    /// Wrap the peer's encryption public key.
    pub fn new(enc_public_key: PublicKey) -> Self {
        Self { enc_public_key }
    }

    /// Parse the peer's encryption public key from SEC1 bytes.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        PublicKey::from_sec1_bytes(bytes)
            .map(Self::new)
            .map_err(Error::Decoding)
    }

    /// Borrow the encryption public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.enc_public_key
    }
}
