//! Peer ephemeral SM2 credentials.

use crate::{Error, NamedGroup, PublicKey, Result};
use tracing::trace;

/// Peer's ephemeral SM2 public key, as received in the key exchange message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sm2eCredentials {
    pub(crate) ephemeral_public_key: PublicKey,
    pub(crate) named_group: NamedGroup,
}

impl Sm2eCredentials {
    /// Decode the peer's encoded ephemeral point.
    ///
    /// Returns `Ok(None)` when `encoded_point` is empty: the peer offered no
    /// ephemeral SM2 credentials. Compressed and uncompressed SEC1 encodings
    /// are accepted; the point must be on the curve and not the identity.
    ///
    /// `named_group` must be [`NamedGroup::CurveSm2`].
    pub fn decode(named_group: NamedGroup, encoded_point: &[u8]) -> Result<Option<Self>> {
        if named_group != NamedGroup::CurveSm2 {
            return Err(Error::Internal("credentials decoding: not named group curveSM2"));
        }

        if encoded_point.is_empty() {
            return Ok(None);
        }

        let ephemeral_public_key =
            PublicKey::from_sec1_bytes(encoded_point).map_err(Error::Decoding)?;
        trace!(len = encoded_point.len(), "decoded peer ephemeral SM2 point");

        Ok(Some(Self {
            ephemeral_public_key,
            named_group,
        }))
    }

    /// Alias of [`Sm2eCredentials::decode`] for message parsers.
    pub fn value_of(named_group: NamedGroup, encoded_point: &[u8]) -> Result<Option<Self>> {
        Self::decode(named_group, encoded_point)
    }

    /// Peer's ephemeral public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.ephemeral_public_key
    }

    /// Named group of the ephemeral public key.
    pub fn named_group(&self) -> NamedGroup {
        self.named_group
    }
}
