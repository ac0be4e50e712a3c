//! SM2 key agreement protocol as defined in [GB/T 32918.3-2016 § 6].
//!
//! ## Algorithm
//!
//! Both sides hold a long-term key pair `(d, P)` and generate an ephemeral
//! key pair `(r, R)`. With `w = ⌈⌈log2(n)⌉ / 2⌉ − 1 = 127`:
//!
//! ```text
//! A4/B3: x̄ = 2^w + (x & (2^w − 1)) for the own ephemeral point R = (x, y)
//! A5/B4: t = (d + x̄ · r) mod n
//! A6/B5: x̄' = 2^w + (x' & (2^w − 1)) for the peer's ephemeral point R' = (x', y')
//! A7/B5: U = [h · t](P' + [x̄']R') = (xU, yU), fail if U = O
//! A8/B6: K = KDF(xU || yU || ZA || ZB, klen)
//! ```
//!
//! `ZA` always belongs to the initiator and `ZB` to the responder, so the
//! [`Role`] decides the order of the two identity hashes fed into the KDF.
//!
//! The optional key confirmation steps (`SB`/`SA`) are not used by TLCP and
//! are not implemented.
//!
//! [GB/T 32918.3-2016 § 6]: https://www.oscca.gov.cn/sca/xxgk/2010-12/17/1002386/files/b965ce832cc34bc191cb1cde446b860d.pdf

use crate::{PublicKey, SecretKey};
use elliptic_curve::{
    Error, Result,
    ff::PrimeField,
    group::Group,
    sec1::{self, ToEncodedPoint},
};
use primeorder::PrimeCurveParams;
use sm2::{FieldBytes, Scalar, Sm2};
use sm3::{Digest, Sm3};
use zeroize::Zeroizing;

/// Type which represents distinguishing identifiers.
pub type DistId = str;

/// SM3 hash output.
pub type Hash = sm3::digest::Output<Sm3>;

/// Which side of the key agreement the local party plays.
///
/// In TLCP the client is the initiator and the server the responder.
/// Both sides must use their actual role: the roles decide the order of the
/// identity hashes in the KDF input, so mismatched roles yield different
/// secrets.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Role {
    /// Party A, which starts the exchange (TLCP client).
    Initiator,

    /// Party B, which answers the exchange (TLCP server).
    Responder,
}

impl Role {
    /// Role of a TLCP endpoint.
    pub const fn from_client_mode(is_client: bool) -> Self {
        if is_client {
            Self::Initiator
        } else {
            Self::Responder
        }
    }

    /// Is this the initiator role?
    pub const fn is_initiator(self) -> bool {
        matches!(self, Self::Initiator)
    }
}

/// Parameters of one SM2 key agreement, from the local party's point of view.
#[derive(Copy, Clone, Debug)]
pub struct AgreementParams<'a> {
    /// Local distinguishing identifier.
    pub id: &'a DistId,

    /// Local long-term secret key `d`.
    pub secret_key: &'a SecretKey,

    /// Local long-term public key `P`.
    pub public_key: &'a PublicKey,

    /// Peer's distinguishing identifier.
    pub peer_id: &'a DistId,

    /// Peer's long-term public key `P'`.
    pub peer_public_key: &'a PublicKey,

    /// Local role.
    pub role: Role,
}

/// Run the SM2 key agreement and fill `out` with the shared key.
///
/// `ephemeral_secret` is the local ephemeral secret key `r` and
/// `peer_ephemeral` the peer's ephemeral public key `R'`. The length of
/// `out` is the requested key length `klen` in bytes.
pub fn agree(
    ephemeral_secret: &SecretKey,
    params: &AgreementParams<'_>,
    peer_ephemeral: &PublicKey,
    out: &mut [u8],
) -> Result<()> {
    if out.is_empty() {
        return Err(Error);
    }

    let r = Zeroizing::new(ephemeral_secret.to_nonzero_scalar());
    let d = Zeroizing::new(params.secret_key.to_nonzero_scalar());

    // A4: x̄1 from the own ephemeral point R
    let x1 = x_bar(&ephemeral_secret.public_key())?;

    // A5: t = (d + x̄1 · r) mod n
    let t = Zeroizing::new(**d + x1 * **r);

    // A6: x̄2 from the peer's ephemeral point R'
    let x2 = x_bar(peer_ephemeral)?;

    // A7: U = [h · t](P' + [x̄2]R'), h = 1 for SM2
    let u = (params.peer_public_key.to_projective() + peer_ephemeral.to_projective() * x2) * *t;
    if u.is_identity().into() {
        return Err(Error);
    }

    let u = Zeroizing::new(u.to_affine().to_encoded_point(false));
    let (xu, yu) = match u.coordinates() {
        sec1::Coordinates::Uncompressed { x, y } => (x, y),
        _ => return Err(Error),
    };

    let z_own = hash_z(params.id, params.public_key)?;
    let z_peer = hash_z(params.peer_id, params.peer_public_key)?;
    let (za, zb) = match params.role {
        Role::Initiator => (&z_own, &z_peer),
        Role::Responder => (&z_peer, &z_own),
    };

    // A8: K = KDF(xU || yU || ZA || ZB, klen)
    kdf(&[&xu[..], &yu[..], &za[..], &zb[..]], out);
    Ok(())
}

/// Compute user information hash `Z` according to [draft-shen-sm2-ecdsa § 5.1.4.4].
///
/// ```text
/// ZA=H256(ENTLA || IDA || a || b || xG || yG || xA || yA)
/// ```
///
/// [draft-shen-sm2-ecdsa § 5.1.4.4]: https://datatracker.ietf.org/doc/html/draft-shen-sm2-ecdsa-02#section-5.1.4.4
pub fn hash_z(distid: &DistId, public_key: &PublicKey) -> Result<Hash> {
    let entla: u16 = distid
        .len()
        .checked_mul(8)
        .and_then(|l| l.try_into().ok())
        .ok_or(Error)?;

    let mut sm3 = Sm3::new();
    sm3.update(entla.to_be_bytes());
    sm3.update(distid);
    sm3.update(Sm2::EQUATION_A.to_repr());
    sm3.update(Sm2::EQUATION_B.to_repr());
    sm3.update(Sm2::GENERATOR.0.to_repr());
    sm3.update(Sm2::GENERATOR.1.to_repr());

    match public_key.to_encoded_point(false).coordinates() {
        sec1::Coordinates::Uncompressed { x, y } => {
            sm3.update(x);
            sm3.update(y);
            Ok(sm3.finalize())
        }
        _ => Err(Error),
    }
}

/// Truncate the x-coordinate of `point` to `x̄ = 2^127 + (x mod 2^127)`.
fn x_bar(point: &PublicKey) -> Result<Scalar> {
    let encoded = point.to_encoded_point(false);
    let x = encoded.x().ok_or(Error)?;

    // The low 127 bits of x live in the last 16 bytes; bit 127 is then set.
    let mut bytes = FieldBytes::default();
    bytes[16..].copy_from_slice(&x[16..]);
    bytes[16] |= 0x80;

    Option::from(Scalar::from_repr(bytes)).ok_or(Error)
}

/// SM3 based key derivation function from GB/T 32918.4-2016 § 5.4.3.
///
/// ```text
/// Ha_i = H(Z || ct), ct = 1, 2, ... as 32-bit big endian
/// K = Ha_1 || Ha_2 || ... truncated to klen
/// ```
fn kdf(z: &[&[u8]], out: &mut [u8]) {
    let mut ct: u32 = 1;

    for block in out.chunks_mut(<Sm3 as Digest>::output_size()) {
        let mut sm3 = Sm3::new();
        for part in z {
            sm3.update(part);
        }
        sm3.update(ct.to_be_bytes());

        let ha = sm3.finalize();
        block.copy_from_slice(&ha[..block.len()]);
        ct = ct.wrapping_add(1);
    }
}
