//! Everything related to LMS

pub(crate) mod modes;
mod private;
mod public;
mod signature;
pub(crate) mod tree;

pub use modes::LmsType;
pub use private::SigningKey;
pub use public::VerifyingKey;
pub use signature::Signature;

use crate::config::Settings;
use crate::error::Result;
use crate::ots::LmsOtsType;

/// Generates a key pair. Without a `seed` one is drawn from `rng`.
///
/// ```
/// use lms_hss::{LmsOtsType, LmsType, MemoryStore, Settings, lms};
///
/// let mut rng = rand::rng();
/// let (sk, pk) = lms::generate(
///     LmsType::Sha256M32H5,
///     LmsOtsType::Sha256N32W8,
///     None,
///     &Settings::default(),
///     &mut rng,
/// )
/// .unwrap();
/// let store = MemoryStore::new();
/// sk.reserve(1, &store).unwrap();
/// let sig = sk.sign(&mut rng, b"hello").unwrap();
/// assert!(pk.verify(b"hello", &sig).unwrap());
/// ```
pub fn generate<R: rand::CryptoRng + ?Sized>(
    lms_type: LmsType,
    ots_type: LmsOtsType,
    seed: Option<&[u8]>,
    settings: &Settings,
    rng: &mut R,
) -> Result<(SigningKey, VerifyingKey)> {
    let sk = SigningKey::new(lms_type, ots_type, seed, settings, rng)?;
    let pk = sk.public();
    Ok((sk, pk))
}
