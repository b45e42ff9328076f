#![cfg(feature = "serde")]

use lms_hss::{LmsOtsType, LmsType, MemoryStore, Settings, hss, lms};

#[test]
fn json_round_trip() {
    let mut rng = rand::rng();
    let (sk, pk) = lms::generate(
        LmsType::Sha256M32H5,
        LmsOtsType::Sha256N32W8,
        None,
        &Settings::default(),
        &mut rng,
    )
    .unwrap();
    sk.reserve(1, &MemoryStore::new()).unwrap();
    let sig = sk.sign(&mut rng, b"serde").unwrap();

    let json = serde_json::to_string(&pk).unwrap();
    assert_eq!(json, format!("\"{}\"", hex::encode(pk.to_bytes())));
    assert_eq!(serde_json::from_str::<lms::VerifyingKey>(&json).unwrap(), pk);

    let json = serde_json::to_string(&sig).unwrap();
    assert_eq!(serde_json::from_str::<lms::Signature>(&json).unwrap(), sig);
}

#[test]
fn chain_json_round_trip() {
    let mut rng = rand::rng();
    let (mut sk, pk) = hss::generate(
        &[LmsType::Sha256M32H5, LmsType::Sha256M32H5],
        LmsOtsType::Sha256N32W8,
        None,
        &Settings::default().with_reserve_count(2),
        None,
        &mut rng,
    )
    .unwrap();
    let sig = sk.sign(&mut rng, b"serde").unwrap();

    let pk2: hss::VerifyingKey = serde_json::from_str(&serde_json::to_string(&pk).unwrap()).unwrap();
    let sig2: hss::Signature = serde_json::from_str(&serde_json::to_string(&sig).unwrap()).unwrap();
    assert_eq!(pk2, pk);
    assert!(pk2.verify(b"serde", &sig2).unwrap());
}
