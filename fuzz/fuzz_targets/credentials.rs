#![no_main]
use libfuzzer_sys::fuzz_target;
use rand_chacha::{rand_core::SeedableRng, ChaChaRng};
use tlcp_sm2e::{
    Error, NamedGroup, PermitAll, Role, SecretKey, Sm2eCredentials, Sm2ePossession, TlcpPossession,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 32 {
        return;
    }

    let (seed, point) = data.split_at(32);
    let mut rng = ChaChaRng::from_seed(seed.try_into().unwrap());

    let credentials = match Sm2eCredentials::decode(NamedGroup::CurveSm2, point) {
        Ok(Some(credentials)) => credentials,
        Ok(None) => {
            assert!(point.is_empty());
            return;
        }
        Err(err) => {
            assert!(matches!(err, Error::Decoding(_)));
            return;
        }
    };

    // Anything that decodes must survive the constraint check and the agreement.
    let local = TlcpPossession::new(SecretKey::random(&mut rng));
    let peer = TlcpPossession::new(SecretKey::random(&mut rng));
    let mut twin_rng = rng.clone();
    let possession = Sm2ePossession::generate(&local, NamedGroup::CurveSm2, &mut rng).unwrap();
    let twin = Sm2ePossession::generate(&local, NamedGroup::CurveSm2, &mut twin_rng).unwrap();
    assert_eq!(possession.public_key(), twin.public_key());
    possession.check_constraints(&PermitAll, point).unwrap();

    let secret = possession
        .agreed_secret(credentials.public_key(), peer.public_key(), Role::Initiator);
    let from_bytes = twin.agreed_secret_from_bytes(point, peer.public_key(), Role::Initiator);
    match (secret, from_bytes) {
        (Ok(a), Ok(b)) => assert_eq!(a, b),
        (Err(a), Err(b)) => {
            assert!(matches!(a, Error::Agreement(_)));
            assert!(matches!(b, Error::Agreement(_)));
        }
        _ => panic!("decoded and encoded points disagree"),
    }
});
