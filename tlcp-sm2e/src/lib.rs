#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::checked_conversions,
    clippy::implicit_saturating_sub,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

pub mod agreement;

mod authentication;
mod constraints;
mod credentials;
mod derivation;
mod error;
mod generator;
mod handshake;
mod named_group;
mod possession;

pub use sm2::{self, EncodedPoint, PublicKey, SecretKey, elliptic_curve};

pub use crate::{
    agreement::Role,
    authentication::{TlcpCredentials, TlcpPossession},
    constraints::{
        AlgorithmConstraints, Comparison, CryptoPrimitive, DisabledAlgorithms, KeySizeLimit,
        ParseConstraintsError, PermitAll,
    },
    credentials::Sm2eCredentials,
    derivation::{PreMasterSecret, Sm2eKeyDerivation, create_key_derivation},
    error::{Alert, Error, Result},
    generator::create_possession,
    handshake::{Credentials, NegotiationParams, Possession},
    named_group::{NamedGroup, NamedGroupSpec, ProtocolVersion, SupportedGroups, UnknownNamedGroup},
    possession::Sm2ePossession,
};

/// Distinguishing identifier used by both sides of a TLCP SM2 key agreement.
///
/// TLCP does not negotiate user identities, so the default identity from
/// GM/T 0009-2012 is used for the local and the peer side alike.
pub const DEFAULT_ID: &str = "1234567812345678";

/// Length of the pre-master secret produced by the SM2 key agreement.
pub const PRE_MASTER_SECRET_LEN: usize = 32;
