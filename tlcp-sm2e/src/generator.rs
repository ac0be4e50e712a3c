//! Possession generator for the ephemeral SM2 key exchange.

use crate::{Error, NamedGroup, NamedGroupSpec, NegotiationParams, Result, Sm2ePossession};
use rand_core::CryptoRngCore;
use tracing::debug;

/// Select a named group and create an ephemeral SM2 possession for it.
///
/// Returns `Ok(None)` when the preferred elliptic curve group is not
/// `curveSM2` (or no group is acceptable): this key exchange does not apply
/// and another one should be tried.
pub fn create_possession<'a>(
    params: &NegotiationParams<'a>,
    rng: &mut impl CryptoRngCore,
) -> Result<Option<Sm2ePossession<'a>>> {
    let preferred = params.supported_groups.preferred_group(
        params.protocol_version,
        params.constraints,
        &[NamedGroupSpec::Ecdhe],
        params.requested_groups,
    );

    match preferred {
        Some(NamedGroup::CurveSm2) => {
            let long_term = params.long_term.ok_or(Error::Internal(
                "no TLCP encryption key pair for SM2 key exchange",
            ))?;
            debug!(version = %params.protocol_version, "selected curveSM2 for ephemeral key exchange");
            Sm2ePossession::generate(long_term, NamedGroup::CurveSm2, rng).map(Some)
        }
        other => {
            debug!(
                version = %params.protocol_version,
                group = ?other,
                "preferred group is not curveSM2"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::create_possession;
    use crate::{
        DisabledAlgorithms, Error, NamedGroup, NegotiationParams, PermitAll, ProtocolVersion,
        SecretKey, SupportedGroups, TlcpPossession,
    };
    use rand_core::OsRng;

    #[test]
    fn missing_long_term_key_is_a_contract_violation() {
        let supported = SupportedGroups::default();
        let params = NegotiationParams {
            requested_groups: &[],
            protocol_version: ProtocolVersion::Tlcp11,
            constraints: &PermitAll,
            supported_groups: &supported,
            long_term: None,
        };
        let err = create_possession(&params, &mut OsRng).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn other_preferred_group_yields_nothing() {
        let supported = SupportedGroups::default();
        let long_term = TlcpPossession::new(SecretKey::random(&mut OsRng));
        let params = NegotiationParams {
            requested_groups: &[NamedGroup::Secp256r1, NamedGroup::CurveSm2],
            protocol_version: ProtocolVersion::Tls13,
            constraints: &PermitAll,
            supported_groups: &supported,
            long_term: Some(&long_term),
        };
        assert!(create_possession(&params, &mut OsRng).unwrap().is_none());
    }

    #[test]
    fn disabled_sm2_yields_nothing() {
        let supported = SupportedGroups::default();
        let policy: DisabledAlgorithms = "SM2".parse().unwrap();
        let long_term = TlcpPossession::new(SecretKey::random(&mut OsRng));
        let params = NegotiationParams {
            requested_groups: &[NamedGroup::CurveSm2],
            protocol_version: ProtocolVersion::Tlcp11,
            constraints: &policy,
            supported_groups: &supported,
            long_term: Some(&long_term),
        };
        assert!(create_possession(&params, &mut OsRng).unwrap().is_none());
    }
}
