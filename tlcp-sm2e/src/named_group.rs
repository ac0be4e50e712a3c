//! Named groups and supported-groups preference selection.

use crate::constraints::{AlgorithmConstraints, CryptoPrimitive};
use core::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Protocol versions a key exchange can be negotiated for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProtocolVersion {
    /// TLCP 1.1 (GB/T 38636-2020).
    #[cfg_attr(feature = "serde", serde(rename = "TLCPv1.1"))]
    Tlcp11,

    /// TLS 1.2.
    #[cfg_attr(feature = "serde", serde(rename = "TLSv1.2"))]
    Tls12,

    /// TLS 1.3.
    #[cfg_attr(feature = "serde", serde(rename = "TLSv1.3"))]
    Tls13,
}

impl ProtocolVersion {
    /// Wire identifier.
    pub const fn id(self) -> u16 {
        match self {
            Self::Tlcp11 => 0x0101,
            Self::Tls12 => 0x0303,
            Self::Tls13 => 0x0304,
        }
    }

    /// Standard name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tlcp11 => "TLCPv1.1",
            Self::Tls12 => "TLSv1.2",
            Self::Tls13 => "TLSv1.3",
        }
    }

    /// Is this the TLCP protocol?
    pub const fn is_tlcp(self) -> bool {
        matches!(self, Self::Tlcp11)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Family of key exchange a named group belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NamedGroupSpec {
    /// Elliptic curve groups over prime fields (ECDHE, SM2).
    Ecdhe,

    /// Montgomery curve groups (X25519, X448).
    Xdh,

    /// Finite field Diffie-Hellman groups.
    Ffdhe,
}

/// TLS/TLCP named groups, identified by their IANA code points.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NamedGroup {
    /// NIST P-256.
    #[cfg_attr(feature = "serde", serde(rename = "secp256r1"))]
    Secp256r1,

    /// NIST P-384.
    #[cfg_attr(feature = "serde", serde(rename = "secp384r1"))]
    Secp384r1,

    /// NIST P-521.
    #[cfg_attr(feature = "serde", serde(rename = "secp521r1"))]
    Secp521r1,

    /// Curve25519.
    #[cfg_attr(feature = "serde", serde(rename = "x25519"))]
    X25519,

    /// Curve448.
    #[cfg_attr(feature = "serde", serde(rename = "x448"))]
    X448,

    /// SM2 recommended curve (RFC 8998).
    #[cfg_attr(feature = "serde", serde(rename = "curveSM2"))]
    CurveSm2,

    /// 2048-bit FFDHE group (RFC 7919).
    #[cfg_attr(feature = "serde", serde(rename = "ffdhe2048"))]
    Ffdhe2048,

    /// 3072-bit FFDHE group (RFC 7919).
    #[cfg_attr(feature = "serde", serde(rename = "ffdhe3072"))]
    Ffdhe3072,
}

impl NamedGroup {
    /// All named groups known to this crate.
    pub const ALL: [Self; 8] = [
        Self::Secp256r1,
        Self::Secp384r1,
        Self::Secp521r1,
        Self::X25519,
        Self::X448,
        Self::CurveSm2,
        Self::Ffdhe2048,
        Self::Ffdhe3072,
    ];

    /// IANA code point.
    pub const fn id(self) -> u16 {
        match self {
            Self::Secp256r1 => 0x0017,
            Self::Secp384r1 => 0x0018,
            Self::Secp521r1 => 0x0019,
            Self::X25519 => 0x001D,
            Self::X448 => 0x001E,
            Self::CurveSm2 => 0x0029,
            Self::Ffdhe2048 => 0x0100,
            Self::Ffdhe3072 => 0x0101,
        }
    }

    /// Look up a named group by its code point.
    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.id() == id)
    }

    /// Standard name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Secp256r1 => "secp256r1",
            Self::Secp384r1 => "secp384r1",
            Self::Secp521r1 => "secp521r1",
            Self::X25519 => "x25519",
            Self::X448 => "x448",
            Self::CurveSm2 => "curveSM2",
            Self::Ffdhe2048 => "ffdhe2048",
            Self::Ffdhe3072 => "ffdhe3072",
        }
    }

    /// Key exchange family.
    pub const fn spec(self) -> NamedGroupSpec {
        match self {
            Self::Secp256r1 | Self::Secp384r1 | Self::Secp521r1 | Self::CurveSm2 => {
                NamedGroupSpec::Ecdhe
            }
            Self::X25519 | Self::X448 => NamedGroupSpec::Xdh,
            Self::Ffdhe2048 | Self::Ffdhe3072 => NamedGroupSpec::Ffdhe,
        }
    }

    /// Key exchange algorithm name used when checking algorithm constraints.
    pub const fn algorithm(self) -> &'static str {
        match self {
            Self::Secp256r1 | Self::Secp384r1 | Self::Secp521r1 => "EC",
            Self::CurveSm2 => "SM2",
            Self::X25519 | Self::X448 => "XDH",
            Self::Ffdhe2048 | Self::Ffdhe3072 => "DH",
        }
    }

    /// Size of the group in bits.
    pub const fn key_size(self) -> u32 {
        match self {
            Self::Secp256r1 | Self::CurveSm2 => 256,
            Self::Secp384r1 => 384,
            Self::Secp521r1 => 521,
            Self::X25519 => 255,
            Self::X448 => 448,
            Self::Ffdhe2048 => 2048,
            Self::Ffdhe3072 => 3072,
        }
    }

    /// Can this group be negotiated for the given protocol version?
    ///
    /// TLCP only defines `curveSM2`; `curveSM2` is also usable with TLS 1.3
    /// (RFC 8998) but not with TLS 1.2.
    pub const fn is_available(self, version: ProtocolVersion) -> bool {
        match version {
            ProtocolVersion::Tlcp11 => matches!(self, Self::CurveSm2),
            ProtocolVersion::Tls12 => !matches!(self, Self::CurveSm2),
            ProtocolVersion::Tls13 => true,
        }
    }

    /// Is this group permitted by `constraints` for key agreement?
    pub fn is_permitted(self, constraints: &dyn AlgorithmConstraints) -> bool {
        constraints.permits_group(&[CryptoPrimitive::KeyAgreement], self)
    }
}

impl fmt::Display for NamedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NamedGroup {
    type Err = UnknownNamedGroup;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.name().eq_ignore_ascii_case(name))
            .ok_or(UnknownNamedGroup)
    }
}

/// Named group name is not recognized.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown named group")]
pub struct UnknownNamedGroup;

/// Locally supported named groups, most preferred first.
///
/// Serialized as the bare list of group names; duplicates in a deserialized
/// list are dropped as with [`SupportedGroups::new`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "Vec<NamedGroup>", into = "Vec<NamedGroup>")
)]
pub struct SupportedGroups {
    groups: Vec<NamedGroup>,
}

impl SupportedGroups {
    /// Create a supported-groups list in preference order.
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn new(groups: impl IntoIterator<Item = NamedGroup>) -> Self {
        let mut deduped = Vec::new();
        for group in groups {
            if !deduped.contains(&group) {
                deduped.push(group);
            }
        }
        Self { groups: deduped }
    }

    /// Supported groups, most preferred first.
    pub fn groups(&self) -> &[NamedGroup] {
        &self.groups
    }

    /// Is `group` locally supported?
    pub fn contains(&self, group: NamedGroup) -> bool {
        self.groups.contains(&group)
    }

    /// Pick the preferred named group for a key exchange.
    ///
    /// With a non-empty `requested` list the peer's order wins: the first
    /// requested group which is locally supported is chosen. Without one, the
    /// local preference order is used. In both cases the group must belong to
    /// one of `specs`, be available for `version` and be permitted by
    /// `constraints` for key agreement.
    pub fn preferred_group(
        &self,
        version: ProtocolVersion,
        constraints: &dyn AlgorithmConstraints,
        specs: &[NamedGroupSpec],
        requested: &[NamedGroup],
    ) -> Option<NamedGroup> {
        let acceptable = |group: &NamedGroup| {
            specs.contains(&group.spec())
                && group.is_available(version)
                && group.is_permitted(constraints)
        };

        if requested.is_empty() {
            self.groups.iter().copied().find(acceptable)
        } else {
            requested
                .iter()
                .copied()
                .filter(|group| self.contains(*group))
                .find(acceptable)
        }
    }
}

impl Default for SupportedGroups {
    fn default() -> Self {
        Self::new([
            NamedGroup::CurveSm2,
            NamedGroup::X25519,
            NamedGroup::Secp256r1,
            NamedGroup::Secp384r1,
            NamedGroup::Secp521r1,
            NamedGroup::X448,
            NamedGroup::Ffdhe2048,
            NamedGroup::Ffdhe3072,
        ])
    }
}

impl From<Vec<NamedGroup>> for SupportedGroups {
    fn from(groups: Vec<NamedGroup>) -> Self {
        Self::new(groups)
    }
}

impl From<SupportedGroups> for Vec<NamedGroup> {
    fn from(supported: SupportedGroups) -> Self {
        supported.groups
    }
}
