//! Property-based tests for the `lms-hss` crate.

use lms_hss::{Error, LmsOtsType, LmsType, MemoryStore, Settings, hss, lms};
use proptest::{collection, prelude::*};

#[derive(Clone, Debug)]
enum Op {
    Reserve(u32),
    Sign,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![(0u32..12).prop_map(Op::Reserve), Just(Op::Sign)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn reservation_bounds(seed in any::<[u8; 24]>(), ops in collection::vec(op(), 1..64)) {
        let mut rng = rand::rng();
        let (sk, pk) = lms::generate(
            LmsType::Sha256M24H5,
            LmsOtsType::Sha256N24W1,
            Some(&seed[..]),
            &Settings::default().with_threads(2),
            &mut rng,
        )
        .unwrap();
        let store = MemoryStore::new();

        for op in ops {
            let before = (sk.q(), sk.reserved());
            match op {
                Op::Reserve(n) => {
                    sk.reserve(n, &store).unwrap();
                    prop_assert_eq!(sk.q(), before.0);
                    prop_assert!(sk.reserved() >= before.1);
                }
                Op::Sign => match sk.sign(&mut rng, b"prop") {
                    Ok(sig) => {
                        prop_assert_eq!(sig.q(), before.0);
                        prop_assert!(pk.verify(b"prop", &sig).unwrap());
                    }
                    Err(Error::NoReservedKeys) => prop_assert_eq!(before.0, before.1),
                    Err(Error::Exhausted) => prop_assert_eq!(before.0, 32),
                    Err(err) => prop_assert!(false, "unexpected error {err}"),
                },
            }
            prop_assert!(sk.q() <= sk.reserved());
            prop_assert!(sk.reserved() <= 32);
            prop_assert_eq!(sk.reserved_keys(), sk.reserved() - sk.q());
        }

        // a reload resumes at the persisted counter
        if let Some(bytes) = store.contents() {
            let loaded = lms::SigningKey::from_bytes(&bytes, &Settings::default()).unwrap();
            prop_assert_eq!(loaded.q(), sk.reserved());
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in collection::vec(any::<u8>(), 0..2048)) {
        let _ = lms::Signature::try_from(&bytes[..]);
        let _ = lms::VerifyingKey::try_from(&bytes[..]);
        let _ = hss::Signature::try_from(&bytes[..]);
        let _ = hss::VerifyingKey::try_from(&bytes[..]);
    }
}
