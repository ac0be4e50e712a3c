//! Algorithm constraints policy.
//!
//! Policies are written in the `jdk.tls.disabledAlgorithms` style: a comma
//! separated list of entries, each either an algorithm or group name
//! (`SM2`, `curveSM2`, `x25519`) or a key size limit
//! (`EC keySize < 256`). A key size limit disables keys whose size satisfies
//! the comparison.

use crate::{NamedGroup, PublicKey};
use core::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Key size of every SM2 public key, in bits.
const SM2_KEY_SIZE: u32 = 256;

/// Cryptographic primitives a key or group may be used for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CryptoPrimitive {
    /// Key agreement (ECDHE, SM2 key exchange).
    KeyAgreement,

    /// Digital signatures.
    Signature,

    /// Public key encryption (ECC static key exchange).
    PublicKeyEncryption,
}

/// Policy deciding which named groups and public keys may be used.
///
/// Implementations are shared read-only across concurrently running
/// handshakes.
pub trait AlgorithmConstraints: Send + Sync {
    /// May `group` be used for `primitives`?
    fn permits_group(&self, primitives: &[CryptoPrimitive], group: NamedGroup) -> bool;

    /// May the SM2 public key `key` be used for `primitives`?
    fn permits_key(&self, primitives: &[CryptoPrimitive], key: &PublicKey) -> bool;
}

/// Policy which permits everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct PermitAll;

impl AlgorithmConstraints for PermitAll {
    fn permits_group(&self, _primitives: &[CryptoPrimitive], _group: NamedGroup) -> bool {
        true
    }

    fn permits_key(&self, _primitives: &[CryptoPrimitive], _key: &PublicKey) -> bool {
        true
    }
}

/// Comparison operator of a [`KeySizeLimit`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Comparison {
    /// `<`
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    Less,

    /// `<=`
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    LessOrEqual,

    /// `>`
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    Greater,

    /// `>=`
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    GreaterOrEqual,

    /// `==`
    #[cfg_attr(feature = "serde", serde(rename = "=="))]
    Equal,

    /// `!=`
    #[cfg_attr(feature = "serde", serde(rename = "!="))]
    NotEqual,
}

impl Comparison {
    fn symbol(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }

    fn holds(self, lhs: u32, rhs: u32) -> bool {
        match self {
            Self::Less => lhs < rhs,
            Self::LessOrEqual => lhs <= rhs,
            Self::Greater => lhs > rhs,
            Self::GreaterOrEqual => lhs >= rhs,
            Self::Equal => lhs == rhs,
            Self::NotEqual => lhs != rhs,
        }
    }
}

impl FromStr for Comparison {
    type Err = ParseConstraintsError;

    fn from_str(s: &str) -> Result<Self, ParseConstraintsError> {
        [
            Self::LessOrEqual,
            Self::GreaterOrEqual,
            Self::Equal,
            Self::NotEqual,
            Self::Less,
            Self::Greater,
        ]
        .into_iter()
        .find(|op| op.symbol() == s)
        .ok_or_else(|| ParseConstraintsError::new(s))
    }
}

/// Disables keys of `algorithm` whose size satisfies `comparison` against `size`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeySizeLimit {
    /// Algorithm name, matched case-insensitively.
    pub algorithm: String,

    /// Comparison applied as `key_size <comparison> size`.
    pub comparison: Comparison,

    /// Key size in bits.
    pub size: u32,
}

impl KeySizeLimit {
    fn disables(&self, algorithm: &str, key_size: u32) -> bool {
        self.algorithm.eq_ignore_ascii_case(algorithm) && self.comparison.holds(key_size, self.size)
    }
}

impl fmt::Display for KeySizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} keySize {} {}",
            self.algorithm,
            self.comparison.symbol(),
            self.size
        )
    }
}

/// Deny-list policy of algorithm names and key size limits.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisabledAlgorithms {
    /// Disabled algorithm or named group names, matched case-insensitively.
    pub algorithms: Vec<String>,

    /// Disabled key sizes.
    pub key_size_limits: Vec<KeySizeLimit>,
}

impl DisabledAlgorithms {
    fn is_disabled(&self, name: &str) -> bool {
        self.algorithms
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(name))
    }

    fn is_key_size_disabled(&self, algorithm: &str, key_size: u32) -> bool {
        self.key_size_limits
            .iter()
            .any(|limit| limit.disables(algorithm, key_size))
    }

    /// SM2 keys are checked by curve name, and both as "SM2" and as generic
    /// "EC" keys.
    fn permits_sm2_keys(&self) -> bool {
        !self.is_disabled(NamedGroup::CurveSm2.name())
            && ["SM2", "EC"].into_iter().all(|algorithm| {
                !(self.is_disabled(algorithm)
                    || self.is_key_size_disabled(algorithm, SM2_KEY_SIZE))
            })
    }
}

impl AlgorithmConstraints for DisabledAlgorithms {
    fn permits_group(&self, _primitives: &[CryptoPrimitive], group: NamedGroup) -> bool {
        match group {
            // Same verdict as `permits_key` gives for the keys of this group.
            NamedGroup::CurveSm2 => self.permits_sm2_keys(),
            _ => !(self.is_disabled(group.name())
                || self.is_disabled(group.algorithm())
                || self.is_key_size_disabled(group.algorithm(), group.key_size())),
        }
    }

    fn permits_key(&self, _primitives: &[CryptoPrimitive], _key: &PublicKey) -> bool {
        self.permits_sm2_keys()
    }
}

impl FromStr for DisabledAlgorithms {
    type Err = ParseConstraintsError;

    fn from_str(s: &str) -> Result<Self, ParseConstraintsError> {
        let mut policy = Self::default();

        for entry in s.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let tokens: Vec<&str> = entry.split_whitespace().collect();
            match tokens.as_slice() {
                [name] => policy.algorithms.push((*name).to_owned()),
                [algorithm, keyword, comparison, size] if keyword.eq_ignore_ascii_case("keySize") => {
                    policy.key_size_limits.push(KeySizeLimit {
                        algorithm: (*algorithm).to_owned(),
                        comparison: comparison.parse()?,
                        size: size.parse().map_err(|_| ParseConstraintsError::new(entry))?,
                    });
                }
                _ => return Err(ParseConstraintsError::new(entry)),
            }
        }

        Ok(policy)
    }
}

impl fmt::Display for DisabledAlgorithms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut separator = "";
        for algorithm in &self.algorithms {
            write!(f, "{separator}{algorithm}")?;
            separator = ", ";
        }
        for limit in &self.key_size_limits {
            write!(f, "{separator}{limit}")?;
            separator = ", ";
        }
        Ok(())
    }
}

/// Malformed algorithm constraints entry.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid algorithm constraints entry: {entry:?}")]
pub struct ParseConstraintsError {
    entry: String,
}

impl ParseConstraintsError {
    fn new(entry: &str) -> Self {
        Self {
            entry: entry.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AlgorithmConstraints, Comparison, CryptoPrimitive, DisabledAlgorithms};
    use crate::{NamedGroup, SecretKey};
    use rand_core::OsRng;

    const KA: &[CryptoPrimitive] = &[CryptoPrimitive::KeyAgreement];

    #[test]
    fn parse_names_and_limits() {
        let policy: DisabledAlgorithms = "SM2, x25519 ,EC keySize < 224,, DH keySize <= 2048"
            .parse()
            .unwrap();
        assert_eq!(policy.algorithms, ["SM2", "x25519"]);
        assert_eq!(policy.key_size_limits.len(), 2);
        assert_eq!(policy.key_size_limits[0].comparison, Comparison::Less);
        assert_eq!(policy.key_size_limits[1].comparison, Comparison::LessOrEqual);
        assert_eq!(policy.key_size_limits[1].size, 2048);
        assert_eq!(
            policy.to_string(),
            "SM2, x25519, EC keySize < 224, DH keySize <= 2048"
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("EC keySize".parse::<DisabledAlgorithms>().is_err());
        assert!("EC keySize ~ 256".parse::<DisabledAlgorithms>().is_err());
        assert!("EC keySize < big".parse::<DisabledAlgorithms>().is_err());
        assert!("EC size < 256".parse::<DisabledAlgorithms>().is_err());
    }

    #[test]
    fn groups_disabled_by_name_algorithm_or_size() {
        let by_name: DisabledAlgorithms = "CURVESM2".parse().unwrap();
        assert!(!by_name.permits_group(KA, NamedGroup::CurveSm2));
        assert!(by_name.permits_group(KA, NamedGroup::Secp256r1));

        let by_algorithm: DisabledAlgorithms = "DH".parse().unwrap();
        assert!(!by_algorithm.permits_group(KA, NamedGroup::Ffdhe2048));
        assert!(by_algorithm.permits_group(KA, NamedGroup::CurveSm2));

        let by_size: DisabledAlgorithms = "EC keySize < 384".parse().unwrap();
        assert!(!by_size.permits_group(KA, NamedGroup::Secp256r1));
        assert!(by_size.permits_group(KA, NamedGroup::Secp384r1));
        assert!(!by_size.permits_group(KA, NamedGroup::CurveSm2));
    }

    #[test]
    fn curve_sm2_and_its_keys_share_one_verdict() {
        let key = SecretKey::random(&mut OsRng).public_key();

        for policy in [
            "",
            "SM2",
            "EC",
            "curveSM2",
            "EC keySize < 384",
            "EC keySize <= 256",
            "SM2 keySize == 256",
            "EC keySize < 224",
            "EC keySize > 256",
            "RSA keySize < 2048",
        ] {
            let policy: DisabledAlgorithms = policy.parse().unwrap();
            assert_eq!(
                policy.permits_group(KA, NamedGroup::CurveSm2),
                policy.permits_key(KA, &key),
                "{policy}"
            );
        }
    }
}
