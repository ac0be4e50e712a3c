//! Key derivation generator for the ephemeral SM2 key exchange.

use crate::{
    Credentials, Error, NamedGroup, PRE_MASTER_SECRET_LEN, Possession, PublicKey, Result,
    Sm2eCredentials, Sm2ePossession, agreement::Role,
};
use core::fmt::{self, Debug};
use elliptic_curve::subtle::{Choice, ConstantTimeEq};
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Pre-master secret produced by the SM2 key agreement.
///
/// The secret is zeroized on drop and compared in constant time.
pub struct PreMasterSecret {
    bytes: Zeroizing<[u8; PRE_MASTER_SECRET_LEN]>,
}

impl PreMasterSecret {
    /// Algorithm label the secret is handed to the key schedule under.
    pub const ALGORITHM: &'static str = "TlsPremasterSecret";

    pub(crate) fn zeroed() -> Self {
        Self {
            bytes: Zeroizing::new([0u8; PRE_MASTER_SECRET_LEN]),
        }
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes[..]
    }

    /// Raw secret bytes.
    ///
    /// # ⚠️ Warning
    ///
    /// This value is key material.
    ///
    /// Please treat it with the care it deserves!
    pub fn as_bytes(&self) -> &[u8; PRE_MASTER_SECRET_LEN] {
        &self.bytes
    }

    /// Algorithm label, see [`PreMasterSecret::ALGORITHM`].
    pub fn algorithm(&self) -> &'static str {
        Self::ALGORITHM
    }
}

impl ConstantTimeEq for PreMasterSecret {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.bytes[..].ct_eq(&other.bytes[..])
    }
}

impl PartialEq for PreMasterSecret {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for PreMasterSecret {}

impl Debug for PreMasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreMasterSecret").finish_non_exhaustive()
    }
}

/// Matched SM2 possession and credentials, ready to derive the
/// pre-master secret.
///
/// Nothing is computed until [`Sm2eKeyDerivation::derive`] is called.
/// Dropping the derivation without deriving discards the ephemeral key.
#[derive(Debug)]
pub struct Sm2eKeyDerivation<'a> {
    possession: Sm2ePossession<'a>,
    credentials: Sm2eCredentials,
    peer_long_term: PublicKey,
}

impl Sm2eKeyDerivation<'_> {
    /// Named group of the matched pair.
    pub fn named_group(&self) -> NamedGroup {
        self.possession.named_group()
    }

    /// Derive the pre-master secret for the local `role`.
    ///
    /// Consumes the derivation, so the ephemeral secret key is zeroized
    /// once the secret has been computed, whether or not it succeeded.
    pub fn derive(self, role: Role) -> Result<PreMasterSecret> {
        debug!(group = %self.named_group(), ?role, "deriving SM2 pre-master secret");
        self.possession
            .agreed_secret(self.credentials.public_key(), &self.peer_long_term, role)
    }
}

/// Pair an ephemeral SM2 possession with ephemeral SM2 credentials of the
/// same named group.
///
/// The first possession with matching credentials wins and is moved out of
/// `possessions`. The peer's encryption public key is taken from the
/// [`Credentials::Tlcp`] entry.
pub fn create_key_derivation<'a>(
    possessions: &mut Vec<Possession<'a>>,
    credentials: &[Credentials],
) -> Result<Sm2eKeyDerivation<'a>> {
    let matched = possessions
        .iter()
        .enumerate()
        .find_map(|(index, possession)| {
            let Possession::Sm2e(possession) = possession else {
                return None;
            };
            credentials.iter().find_map(|candidate| match candidate {
                Credentials::Sm2e(sm2e) if sm2e.named_group() == possession.named_group() => {
                    Some((index, sm2e.clone()))
                }
                _ => None,
            })
        });

    let Some((index, sm2e_credentials)) = matched else {
        warn!("no SM2 possession and credentials share a named group");
        return Err(Error::NoMatchingGroup);
    };

    let peer_long_term = credentials
        .iter()
        .find_map(|candidate| match candidate {
            Credentials::Tlcp(tlcp) => Some(*tlcp.public_key()),
            _ => None,
        })
        .ok_or(Error::MissingPeerEncryptionKey)?;

    let Possession::Sm2e(possession) = possessions.remove(index) else {
        return Err(Error::Internal("SM2 possession moved during key derivation"));
    };

    debug!(group = %possession.named_group(), "matched SM2 possession and credentials");
    Ok(Sm2eKeyDerivation {
        possession,
        credentials: sm2e_credentials,
        peer_long_term,
    })
}

#[cfg(test)]
mod tests {
    use super::{PreMasterSecret, create_key_derivation};
    use crate::{
        Credentials, Error, NamedGroup, Possession, Role, SecretKey, Sm2eCredentials,
        Sm2ePossession, TlcpCredentials, TlcpPossession,
    };
    use hex_literal::hex;
    use rand_core::OsRng;

    const ENC_KEY: [u8; 32] =
        hex!("3DDD2A3679BF6F1DFC3B49D3E99114718E48EC170EB4E4D3A82052DAB19E8B50");

    fn peer_credentials(group: NamedGroup) -> Sm2eCredentials {
        Sm2eCredentials {
            ephemeral_public_key: SecretKey::random(&mut OsRng).public_key(),
            named_group: group,
        }
    }

    #[test]
    fn mismatched_groups_never_derive() {
        let long_term = TlcpPossession::from_slice(&ENC_KEY).unwrap();
        let possession =
            Sm2ePossession::generate(&long_term, NamedGroup::CurveSm2, &mut OsRng).unwrap();

        let mut possessions = vec![Possession::Sm2e(possession)];
        let credentials = [
            Credentials::Sm2e(peer_credentials(NamedGroup::Secp256r1)),
            Credentials::Tlcp(TlcpCredentials::new(*long_term.public_key())),
        ];

        let err = create_key_derivation(&mut possessions, &credentials).unwrap_err();
        assert!(matches!(err, Error::NoMatchingGroup));
        assert_eq!(possessions.len(), 1);
    }

    #[test]
    fn matched_possession_is_taken() {
        let long_term = TlcpPossession::from_slice(&ENC_KEY).unwrap();
        let possession =
            Sm2ePossession::generate(&long_term, NamedGroup::CurveSm2, &mut OsRng).unwrap();

        let mut possessions = vec![Possession::Tlcp(&long_term), Possession::Sm2e(possession)];
        let credentials = [
            Credentials::Tlcp(TlcpCredentials::new(*long_term.public_key())),
            Credentials::Sm2e(peer_credentials(NamedGroup::CurveSm2)),
        ];

        let derivation = create_key_derivation(&mut possessions, &credentials).unwrap();
        assert_eq!(derivation.named_group(), NamedGroup::CurveSm2);
        assert!(matches!(possessions.as_slice(), [Possession::Tlcp(_)]));

        let secret = derivation.derive(Role::Responder).unwrap();
        assert_eq!(secret.algorithm(), PreMasterSecret::ALGORITHM);
    }

    #[test]
    fn secret_is_redacted() {
        let secret = PreMasterSecret::zeroed();
        assert_eq!(format!("{secret:?}"), "PreMasterSecret { .. }");
    }
}
