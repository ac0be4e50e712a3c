//! Handshake-facing types: the key material lists a handshake accumulates
//! and the negotiation inputs the possession generator consumes.

use crate::{
    AlgorithmConstraints, NamedGroup, ProtocolVersion, Sm2eCredentials, Sm2ePossession,
    SupportedGroups, TlcpCredentials, TlcpPossession,
};

/// Key material owned by the local side of a handshake.
#[derive(Debug)]
pub enum Possession<'a> {
    /// Long-term TLCP encryption key pair.
    Tlcp(&'a TlcpPossession),

    /// Ephemeral SM2 key pair.
    Sm2e(Sm2ePossession<'a>),
}

impl Possession<'_> {
    /// Named group of ephemeral key material, if any.
    pub fn named_group(&self) -> Option<NamedGroup> {
        match self {
            Self::Tlcp(_) => None,
            Self::Sm2e(possession) => Some(possession.named_group()),
        }
    }
}

impl<'a> From<Sm2ePossession<'a>> for Possession<'a> {
    fn from(possession: Sm2ePossession<'a>) -> Self {
        Self::Sm2e(possession)
    }
}

impl<'a> From<&'a TlcpPossession> for Possession<'a> {
    fn from(possession: &'a TlcpPossession) -> Self {
        Self::Tlcp(possession)
    }
}

/// Key material learned about the peer during a handshake.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Credentials {
    /// Peer's long-term encryption public key.
    Tlcp(TlcpCredentials),

    /// Peer's ephemeral SM2 public key.
    Sm2e(Sm2eCredentials),
}

impl Credentials {
    /// Named group of ephemeral key material, if any.
    pub fn named_group(&self) -> Option<NamedGroup> {
        match self {
            Self::Tlcp(_) => None,
            Self::Sm2e(credentials) => Some(credentials.named_group()),
        }
    }
}

impl From<Sm2eCredentials> for Credentials {
    fn from(credentials: Sm2eCredentials) -> Self {
        Self::Sm2e(credentials)
    }
}

impl From<TlcpCredentials> for Credentials {
    fn from(credentials: TlcpCredentials) -> Self {
        Self::Tlcp(credentials)
    }
}

/// Negotiation state the possession generator selects a group from.
#[derive(Copy, Clone)]
pub struct NegotiationParams<'a> {
    /// Named groups requested by the client, in its preference order.
    /// Empty when the client sent none.
    pub requested_groups: &'a [NamedGroup],

    /// Negotiated protocol version.
    pub protocol_version: ProtocolVersion,

    /// Algorithm constraints in force for this connection.
    pub constraints: &'a dyn AlgorithmConstraints,

    /// Locally supported groups.
    pub supported_groups: &'a SupportedGroups,

    /// Local encryption key pair from certificate authentication.
    pub long_term: Option<&'a TlcpPossession>,
}
