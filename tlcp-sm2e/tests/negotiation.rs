//! Full client/server flows through the possession and key derivation
//! generators.

use hex_literal::hex;
use rand_core::OsRng;
use tlcp_sm2e::{
    Alert, Credentials, DisabledAlgorithms, Error, NamedGroup, NegotiationParams, PermitAll,
    Possession, ProtocolVersion, Role, SecretKey, Sm2eCredentials, SupportedGroups,
    TlcpCredentials, TlcpPossession, create_key_derivation, create_possession,
};

const CLIENT_ENC_KEY: [u8; 32] =
    hex!("3DDD2A3679BF6F1DFC3B49D3E99114718E48EC170EB4E4D3A82052DAB19E8B50");
const SERVER_ENC_KEY: [u8; 32] =
    hex!("1cf6bc6c7f642a84994119e206c9f0753ff100709f4fd12f2338c1be60bf4175");

fn params<'a>(
    supported_groups: &'a SupportedGroups,
    requested_groups: &'a [NamedGroup],
    long_term: &'a TlcpPossession,
) -> NegotiationParams<'a> {
    NegotiationParams {
        requested_groups,
        protocol_version: ProtocolVersion::Tlcp11,
        constraints: &PermitAll,
        supported_groups,
        long_term: Some(long_term),
    }
}

#[test]
fn tlcp_handshake_derives_shared_secret() {
    let supported = SupportedGroups::default();
    let client_enc = TlcpPossession::from_slice(&CLIENT_ENC_KEY).unwrap();
    let server_enc = TlcpPossession::from_slice(&SERVER_ENC_KEY).unwrap();
    let requested = [NamedGroup::CurveSm2];

    // ServerKeyExchange
    let server_sm2e = create_possession(&params(&supported, &requested, &server_enc), &mut OsRng)
        .unwrap()
        .unwrap();
    let server_point = server_sm2e.encode();

    // ClientKeyExchange
    let client_sm2e = create_possession(&params(&supported, &requested, &client_enc), &mut OsRng)
        .unwrap()
        .unwrap();
    let client_point = client_sm2e.encode();

    client_sm2e.check_constraints(&PermitAll, &server_point).unwrap();
    server_sm2e.check_constraints(&PermitAll, &client_point).unwrap();

    let mut client_possessions = vec![Possession::Tlcp(&client_enc), client_sm2e.into()];
    let client_credentials = [
        Credentials::Tlcp(TlcpCredentials::new(*server_enc.public_key())),
        Sm2eCredentials::decode(NamedGroup::CurveSm2, &server_point)
            .unwrap()
            .unwrap()
            .into(),
    ];

    let mut server_possessions = vec![Possession::Tlcp(&server_enc), server_sm2e.into()];
    let server_credentials = [
        TlcpCredentials::from_sec1_bytes(&client_enc.public_key().to_sec1_bytes())
            .unwrap()
            .into(),
        Sm2eCredentials::decode(NamedGroup::CurveSm2, &client_point)
            .unwrap()
            .unwrap()
            .into(),
    ];

    let client_secret = create_key_derivation(&mut client_possessions, &client_credentials)
        .unwrap()
        .derive(Role::from_client_mode(true))
        .unwrap();
    let server_secret = create_key_derivation(&mut server_possessions, &server_credentials)
        .unwrap()
        .derive(Role::from_client_mode(false))
        .unwrap();

    assert_eq!(client_secret, server_secret);

    // The ephemeral possessions were consumed by the derivations.
    assert!(client_possessions.iter().all(|p| p.named_group().is_none()));
    assert!(server_possessions.iter().all(|p| p.named_group().is_none()));
}

#[test]
fn no_request_falls_back_to_local_order() {
    let supported = SupportedGroups::default();
    let enc = TlcpPossession::from_slice(&SERVER_ENC_KEY).unwrap();
    let possession = create_possession(&params(&supported, &[], &enc), &mut OsRng)
        .unwrap()
        .unwrap();
    assert_eq!(possession.named_group(), NamedGroup::CurveSm2);
}

#[test]
fn requested_groups_without_sm2_yield_nothing() {
    let supported = SupportedGroups::default();
    let enc = TlcpPossession::from_slice(&SERVER_ENC_KEY).unwrap();
    let requested = [NamedGroup::Secp256r1, NamedGroup::X25519];
    assert!(
        create_possession(&params(&supported, &requested, &enc), &mut OsRng)
            .unwrap()
            .is_none()
    );
}

#[test]
fn sm2_missing_from_local_groups_yields_nothing() {
    let supported = SupportedGroups::new([NamedGroup::Secp256r1, NamedGroup::X25519]);
    let enc = TlcpPossession::from_slice(&SERVER_ENC_KEY).unwrap();
    let requested = [NamedGroup::CurveSm2];
    assert!(
        create_possession(&params(&supported, &requested, &enc), &mut OsRng)
            .unwrap()
            .is_none()
    );
}

#[test]
fn tls13_prefers_what_the_client_asks_for_first() {
    let supported = SupportedGroups::default();
    let enc = TlcpPossession::from_slice(&SERVER_ENC_KEY).unwrap();
    let requested = [NamedGroup::CurveSm2, NamedGroup::Secp256r1];
    let mut negotiation = params(&supported, &requested, &enc);
    negotiation.protocol_version = ProtocolVersion::Tls13;
    assert!(create_possession(&negotiation, &mut OsRng).unwrap().is_some());

    negotiation.protocol_version = ProtocolVersion::Tls12;
    assert!(create_possession(&negotiation, &mut OsRng).unwrap().is_none());
}

#[test]
fn constraints_reject_peer_point_before_derivation() {
    let supported = SupportedGroups::default();
    let enc = TlcpPossession::from_slice(&CLIENT_ENC_KEY).unwrap();
    let possession = create_possession(&params(&supported, &[], &enc), &mut OsRng)
        .unwrap()
        .unwrap();
    let peer_point = SecretKey::random(&mut OsRng)
        .public_key()
        .to_sec1_bytes();

    for policy in ["SM2", "EC keySize < 384", "RSA, EC keySize <= 256"] {
        let constraints: DisabledAlgorithms = policy.parse().unwrap();
        let err = possession
            .check_constraints(&constraints, &peer_point)
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation), "{policy}");
        assert_eq!(err.alert(), Alert::HandshakeFailure);
    }

    let lenient: DisabledAlgorithms = "RSA keySize < 2048, EC keySize < 224".parse().unwrap();
    possession.check_constraints(&lenient, &peer_point).unwrap();
}

#[test]
fn policies_rejecting_sm2_keys_never_select_curve_sm2() {
    let supported = SupportedGroups::default();
    let enc = TlcpPossession::from_slice(&SERVER_ENC_KEY).unwrap();
    let requested = [NamedGroup::CurveSm2];

    for policy in ["EC keySize < 384", "EC keySize <= 256", "SM2", "EC", "curveSM2"] {
        let constraints: DisabledAlgorithms = policy.parse().unwrap();
        let negotiation = NegotiationParams {
            constraints: &constraints,
            ..params(&supported, &requested, &enc)
        };
        assert!(
            create_possession(&negotiation, &mut OsRng).unwrap().is_none(),
            "{policy}"
        );
    }

    let lenient: DisabledAlgorithms = "EC keySize < 224".parse().unwrap();
    let negotiation = NegotiationParams {
        constraints: &lenient,
        ..params(&supported, &requested, &enc)
    };
    let possession = create_possession(&negotiation, &mut OsRng)
        .unwrap()
        .unwrap();
    let peer_point = SecretKey::random(&mut OsRng).public_key().to_sec1_bytes();
    possession.check_constraints(&lenient, &peer_point).unwrap();
}

#[test]
fn malformed_peer_point_fails_constraint_check() {
    let supported = SupportedGroups::default();
    let enc = TlcpPossession::from_slice(&CLIENT_ENC_KEY).unwrap();
    let possession = create_possession(&params(&supported, &[], &enc), &mut OsRng)
        .unwrap()
        .unwrap();
    let err = possession
        .check_constraints(&PermitAll, &[0x04; 17])
        .unwrap_err();
    assert!(matches!(err, Error::Decoding(_)));
}

#[test]
fn derivation_without_peer_ephemeral_key_fails() {
    let supported = SupportedGroups::default();
    let client_enc = TlcpPossession::from_slice(&CLIENT_ENC_KEY).unwrap();
    let server_enc = TlcpPossession::from_slice(&SERVER_ENC_KEY).unwrap();
    let possession = create_possession(&params(&supported, &[], &client_enc), &mut OsRng)
        .unwrap()
        .unwrap();

    let mut possessions = vec![Possession::from(possession)];
    let credentials = [Credentials::from(TlcpCredentials::new(
        *server_enc.public_key(),
    ))];

    let err = create_key_derivation(&mut possessions, &credentials).unwrap_err();
    assert!(matches!(err, Error::NoMatchingGroup));
    assert_eq!(err.alert(), Alert::HandshakeFailure);
    assert_eq!(
        err.to_string(),
        "no sufficient SM2 key agreement parameters negotiated"
    );

    let err = create_key_derivation(&mut Vec::new(), &credentials).unwrap_err();
    assert!(matches!(err, Error::NoMatchingGroup));
}

#[test]
fn derivation_without_peer_encryption_key_fails() {
    let supported = SupportedGroups::default();
    let client_enc = TlcpPossession::from_slice(&CLIENT_ENC_KEY).unwrap();
    let server_enc = TlcpPossession::from_slice(&SERVER_ENC_KEY).unwrap();
    let client = create_possession(&params(&supported, &[], &client_enc), &mut OsRng)
        .unwrap()
        .unwrap();
    let server = create_possession(&params(&supported, &[], &server_enc), &mut OsRng)
        .unwrap()
        .unwrap();

    let mut possessions = vec![Possession::from(client)];
    let credentials = [Sm2eCredentials::decode(NamedGroup::CurveSm2, &server.encode())
        .unwrap()
        .unwrap()
        .into()];

    let err = create_key_derivation(&mut possessions, &credentials).unwrap_err();
    assert!(matches!(err, Error::MissingPeerEncryptionKey));
    assert_eq!(err.alert(), Alert::HandshakeFailure);
}

#[test]
fn invalid_encryption_key_is_rejected() {
    let err = TlcpCredentials::from_sec1_bytes(&[0x02; 33][..1]).unwrap_err();
    assert!(matches!(err, Error::Decoding(_)));

    let err = TlcpPossession::from_slice(&[0u8; 32]).unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

#[cfg(feature = "serde")]
#[test]
fn negotiation_config_round_trips_through_serde() {
    let supported = SupportedGroups::new([NamedGroup::CurveSm2, NamedGroup::Secp256r1]);
    let json = serde_json::to_string(&supported).unwrap();
    assert_eq!(serde_json::from_str::<SupportedGroups>(&json).unwrap(), supported);

    let version: ProtocolVersion = serde_json::from_str("\"TLCPv1.1\"").unwrap();
    assert_eq!(version, ProtocolVersion::Tlcp11);

    let policy: DisabledAlgorithms = "SM2, EC keySize < 256".parse().unwrap();
    let json = serde_json::to_string(&policy).unwrap();
    assert_eq!(serde_json::from_str::<DisabledAlgorithms>(&json).unwrap(), policy);

    let partial: DisabledAlgorithms = serde_json::from_str(r#"{"algorithms": ["SM2"]}"#).unwrap();
    assert_eq!(partial.to_string(), "SM2");
}

#[cfg(feature = "serde")]
#[test]
fn deserialized_supported_groups_drop_duplicates() {
    let supported: SupportedGroups =
        serde_json::from_str(r#"["curveSM2", "secp256r1", "curveSM2", "secp256r1", "x25519"]"#)
            .unwrap();
    assert_eq!(
        supported.groups(),
        [NamedGroup::CurveSm2, NamedGroup::Secp256r1, NamedGroup::X25519]
    );
    assert_eq!(
        serde_json::to_string(&supported).unwrap(),
        r#"["curveSM2","secp256r1","x25519"]"#
    );
}
