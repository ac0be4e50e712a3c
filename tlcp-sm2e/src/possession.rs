//! Local ephemeral SM2 possession.
//!
//! An [`Sm2ePossession`] owns a freshly generated ephemeral SM2 key pair and
//! borrows the long-term encryption key pair of the local endpoint. The
//! ephemeral secret key is zeroized when the possession is dropped, which
//! happens either right after the pre-master secret has been derived or when
//! the handshake is abandoned.

use crate::{
    DEFAULT_ID, Error, NamedGroup, PublicKey, Result, SecretKey, TlcpPossession,
    agreement::{self, AgreementParams, Role},
    constraints::{AlgorithmConstraints, CryptoPrimitive},
    derivation::PreMasterSecret,
};
use core::fmt::{self, Debug};
use elliptic_curve::{point::PointCompression, sec1::ToEncodedPoint};
use rand_core::CryptoRngCore;
use sm2::Sm2;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Upper bound on rejection sampling rounds for ephemeral secret keys.
///
/// A working RNG yields a valid scalar on the first attempt with
/// overwhelming probability.
const MAX_KEYGEN_ATTEMPTS: usize = 64;

/// Local ephemeral SM2 key pair bound to the local encryption key pair.
pub struct Sm2ePossession<'a> {
    ephemeral_secret: SecretKey,
    ephemeral_public_key: PublicKey,
    long_term: &'a TlcpPossession,
    named_group: NamedGroup,
}

impl<'a> Sm2ePossession<'a> {
    /// Generate a fresh ephemeral key pair on `named_group`.
    ///
    /// `named_group` must be [`NamedGroup::CurveSm2`]. RNG failures are
    /// reported as [`Error::KeyGeneration`].
    pub fn generate(
        long_term: &'a TlcpPossession,
        named_group: NamedGroup,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Self> {
        if named_group != NamedGroup::CurveSm2 {
            return Err(Error::Internal("SM2 possession: not named group curveSM2"));
        }

        let ephemeral_secret = random_secret_key(rng)?;
        let ephemeral_public_key = ephemeral_secret.public_key();
        debug!(group = %named_group, "generated ephemeral SM2 key pair");

        Ok(Self {
            ephemeral_secret,
            ephemeral_public_key,
            long_term,
            named_group,
        })
    }

    /// Encode the ephemeral public key for the key exchange message.
    ///
    /// SM2 points are sent uncompressed.
    pub fn encode(&self) -> Vec<u8> {
        self.ephemeral_public_key
            .to_encoded_point(Sm2::COMPRESS_POINTS)
            .as_bytes()
            .to_vec()
    }

    /// Ephemeral public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.ephemeral_public_key
    }

    /// Named group of the ephemeral key pair.
    pub fn named_group(&self) -> NamedGroup {
        self.named_group
    }

    /// Long-term encryption key pair this possession is bound to.
    pub fn long_term(&self) -> &'a TlcpPossession {
        self.long_term
    }

    /// Derive the pre-master secret from the peer's ephemeral public key.
    ///
    /// `peer_long_term` is the peer's encryption public key and `role` the
    /// local side's role in the agreement: [`Role::Initiator`] for a TLCP
    /// client, [`Role::Responder`] for a TLCP server.
    ///
    /// Consumes the possession: the ephemeral secret key is zeroized once
    /// the secret has been derived and cannot be used for another one.
    ///
    /// ```compile_fail
    /// # use rand_core::OsRng;
    /// # use tlcp_sm2e::{NamedGroup, Role, SecretKey, Sm2ePossession, TlcpPossession};
    /// let long_term = TlcpPossession::new(SecretKey::random(&mut OsRng));
    /// let peer = SecretKey::random(&mut OsRng).public_key();
    /// let possession = Sm2ePossession::generate(&long_term, NamedGroup::CurveSm2, &mut OsRng)?;
    ///
    /// let first = possession.agreed_secret(&peer, &peer, Role::Initiator)?;
    /// let second = possession.agreed_secret(&peer, &peer, Role::Initiator)?;
    /// # Ok::<(), tlcp_sm2e::Error>(())
    /// ```
    pub fn agreed_secret(
        self,
        peer_ephemeral: &PublicKey,
        peer_long_term: &PublicKey,
        role: Role,
    ) -> Result<PreMasterSecret> {
        let params = AgreementParams {
            id: DEFAULT_ID,
            secret_key: self.long_term.secret_key(),
            public_key: self.long_term.public_key(),
            peer_id: DEFAULT_ID,
            peer_public_key: peer_long_term,
            role,
        };

        let mut secret = PreMasterSecret::zeroed();
        agreement::agree(
            &self.ephemeral_secret,
            &params,
            peer_ephemeral,
            secret.as_mut_bytes(),
        )
        .map_err(Error::Agreement)?;

        debug!(group = %self.named_group, ?role, "derived SM2 pre-master secret");
        Ok(secret)
    }

    /// Derive the pre-master secret from the peer's encoded ephemeral point.
    ///
    /// Consumes the possession, like [`Sm2ePossession::agreed_secret`].
    pub fn agreed_secret_from_bytes(
        self,
        peer_encoded_point: &[u8],
        peer_long_term: &PublicKey,
        role: Role,
    ) -> Result<PreMasterSecret> {
        let peer_ephemeral = decode_point(peer_encoded_point)?;
        self.agreed_secret(&peer_ephemeral, peer_long_term, role)
    }

    /// Check the peer's encoded ephemeral point against `constraints`.
    ///
    /// Must be called before the point is used for key agreement.
    pub fn check_constraints(
        &self,
        constraints: &dyn AlgorithmConstraints,
        encoded_point: &[u8],
    ) -> Result<()> {
        let public_key = decode_point(encoded_point)?;

        if !constraints.permits_key(&[CryptoPrimitive::KeyAgreement], &public_key) {
            warn!(group = %self.named_group, "peer SM2 public key rejected by algorithm constraints");
            return Err(Error::ConstraintViolation);
        }

        Ok(())
    }
}

impl Debug for Sm2ePossession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sm2ePossession")
            .field("ephemeral_public_key", &self.ephemeral_public_key)
            .field("named_group", &self.named_group)
            .finish_non_exhaustive()
    }
}

/// Decode a point on the SM2 curve.
fn decode_point(encoded_point: &[u8]) -> Result<PublicKey> {
    PublicKey::from_sec1_bytes(encoded_point).map_err(Error::Decoding)
}

/// Sample a secret key uniformly from `[1, n)`.
fn random_secret_key(rng: &mut impl CryptoRngCore) -> Result<SecretKey> {
    let mut bytes = Zeroizing::new([0u8; 32]);

    for _ in 0..MAX_KEYGEN_ATTEMPTS {
        rng.try_fill_bytes(&mut bytes[..])
            .map_err(Error::KeyGeneration)?;

        if let Ok(secret_key) = SecretKey::from_slice(&bytes[..]) {
            return Ok(secret_key);
        }
    }

    Err(Error::KeyGeneration(rand_core::Error::new(
        "no valid SM2 scalar produced by the RNG",
    )))
}
