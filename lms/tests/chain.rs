//! Hierarchical chains across levels, reloads and failing stores.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lms_hss::{
    DecodeError, Error, FileStore, KeyStore, LmsOtsType, LmsType, MemoryStore, Settings, hss,
};

fn settings() -> Settings {
    Settings::default()
        .with_reserve_count(4)
        .with_threads(4)
}

fn chain(levels: usize) -> (hss::SigningKey, hss::VerifyingKey) {
    hss::generate(
        &vec![LmsType::Sha256M32H5; levels],
        LmsOtsType::Sha256N32W8,
        None,
        &settings(),
        None,
        &mut rand::rng(),
    )
    .unwrap()
}

#[test]
fn sign_and_verify_at_every_depth() {
    let mut rng = rand::rng();
    for levels in [1, 2, 3, 8] {
        let (mut sk, pk) = chain(levels);
        assert_eq!(pk.levels() as usize, levels);
        for msg in [&b"first"[..], &b"second"[..], &b""[..]] {
            let sig = sk.sign(&mut rng, msg).unwrap();
            assert_eq!(sig.signed_keys(), levels - 1);
            assert_eq!(sig.to_bytes().len(), sig.encoded_len());

            let decoded = hss::Signature::try_from(&sig.to_bytes()[..]).unwrap();
            assert_eq!(decoded, sig);
            assert!(pk.verify(msg, &decoded).unwrap());
            assert!(!pk.verify(b"forged", &decoded).unwrap());
        }
    }
}

#[test]
fn swapped_public_key_fails() {
    let mut rng = rand::rng();
    let (mut sk, pk) = chain(3);
    let (_, other) = chain(3);
    let sig = sk.sign(&mut rng, b"msg").unwrap();

    let mut keys = sig.public_keys().to_vec();
    keys[0] = other.root().clone();
    let forged = hss::Signature::new(sig.signatures().to_vec(), keys).unwrap();
    assert!(!pk.verify(b"msg", &forged).unwrap());
}

#[test]
fn public_key_round_trip() {
    let (_, pk) = chain(2);
    let bytes = pk.to_bytes();
    assert_eq!(bytes.len(), 4 + 56);
    assert_eq!(hss::VerifyingKey::try_from(&bytes[..]).unwrap(), pk);
    assert_eq!(
        hss::VerifyingKey::try_from(&bytes[..bytes.len() - 1]),
        Err(DecodeError::TooShort)
    );
}

#[test]
fn private_key_bad_level_count() {
    let (sk, _) = chain(1);
    let mut bytes = sk.to_bytes().to_vec();
    bytes[..4].copy_from_slice(&9u32.to_be_bytes());
    assert!(matches!(
        hss::SigningKey::from_bytes(&bytes, &settings()),
        Err(Error::Decode(DecodeError::InvalidLevels(9)))
    ));
}

#[test]
fn reload_from_file_never_reuses_leaves() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("chain.key");
    let mut rng = rand::rng();
    let (mut sk, pk) = hss::generate(
        &[LmsType::Sha256M32H5, LmsType::Sha256M32H5],
        LmsOtsType::Sha256N32W4,
        None,
        &settings(),
        Some(Box::new(FileStore::new(&path))),
        &mut rng,
    )
    .unwrap();
    let first = sk.sign(&mut rng, b"one").unwrap();
    let first_q = first.signatures()[1].q();
    drop(sk);

    let mut sk = hss::SigningKey::load(Box::new(FileStore::new(&path)), &settings()).unwrap();
    assert_eq!(sk.public(), pk);
    let second = sk.sign(&mut rng, b"two").unwrap();
    assert!(second.signatures()[1].q() > first_q);
    assert!(pk.verify(b"two", &second).unwrap());
}

#[test]
fn regeneration_survives_reload() {
    let mut rng = rand::rng();
    let store = Arc::new(MemoryStore::new());
    let (mut sk, pk) = hss::generate(
        &[LmsType::Sha256M32H5, LmsType::Sha256M32H5],
        LmsOtsType::Sha256N32W1,
        None,
        &settings(),
        Some(Box::new(store.clone())),
        &mut rng,
    )
    .unwrap();
    for _ in 0..33 {
        sk.sign(&mut rng, b"fill").unwrap();
    }
    let child = sk.private_keys()[1].public();

    let mut sk = hss::SigningKey::load(Box::new(store), &settings()).unwrap();
    assert_eq!(sk.private_keys()[1].public(), child);
    let sig = sk.sign(&mut rng, b"after").unwrap();
    assert_eq!(sig.public_keys()[0], child);
    assert!(pk.verify(b"after", &sig).unwrap());
}

#[derive(Debug, Default)]
struct FlakyStore {
    inner: MemoryStore,
    broken: AtomicBool,
}

impl KeyStore for FlakyStore {
    fn store(&self, bytes: &[u8]) -> io::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(io::Error::other("disk full"));
        }
        self.inner.store(bytes)
    }

    fn fetch(&self) -> io::Result<Vec<u8>> {
        self.inner.fetch()
    }
}

#[test]
fn failed_persist_blocks_signing() {
    let mut rng = rand::rng();
    let store = Arc::new(FlakyStore::default());
    let (mut sk, pk) = hss::generate(
        &[LmsType::Sha256M32H5],
        LmsOtsType::Sha256N32W8,
        None,
        &Settings::default().with_reserve_count(1),
        Some(Box::new(store.clone())),
        &mut rng,
    )
    .unwrap();

    sk.sign(&mut rng, b"ok").unwrap();
    assert_eq!(sk.reserved_keys(), 0);

    store.broken.store(true, Ordering::SeqCst);
    assert!(matches!(sk.sign(&mut rng, b"blocked"), Err(Error::Io(_))));
    assert_eq!(sk.private_keys()[0].q(), 1);
    assert_eq!(sk.private_keys()[0].reserved(), 1);

    store.broken.store(false, Ordering::SeqCst);
    let sig = sk.sign(&mut rng, b"resumed").unwrap();
    assert_eq!(sig.signatures()[0].q(), 1);
    assert!(pk.verify(b"resumed", &sig).unwrap());
}

#[test]
fn top_level_exhaustion_ends_the_chain() {
    let mut rng = rand::rng();
    let (mut sk, _) = hss::generate(
        &[LmsType::Sha256M32H5],
        LmsOtsType::Sha256N32W1,
        None,
        &settings(),
        None,
        &mut rng,
    )
    .unwrap();
    for _ in 0..32 {
        sk.sign(&mut rng, b"m").unwrap();
    }
    assert!(matches!(sk.sign(&mut rng, b"m"), Err(Error::ChainExhausted)));
    assert!(matches!(sk.reserve(1, &mut rng), Err(Error::ChainExhausted)));
}
