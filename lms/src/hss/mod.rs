//! Hierarchical chains of LMS trees

mod private;
mod public;
mod signature;

pub use private::SigningKey;
pub use public::VerifyingKey;
pub use signature::Signature;

use crate::config::Settings;
use crate::error::Result;
use crate::lms::LmsType;
use crate::ots::LmsOtsType;
use crate::store::KeyStore;

/// Generates a chain with one level per entry of `lms_types`, all levels
/// sharing `ots_type`.
///
/// ```
/// use lms_hss::{LmsOtsType, LmsType, Settings, hss};
///
/// let mut rng = rand::rng();
/// let settings = Settings::default().with_reserve_count(4);
/// let (mut sk, pk) = hss::generate(
///     &[LmsType::Sha256M32H5, LmsType::Sha256M32H5],
///     LmsOtsType::Sha256N32W8,
///     None,
///     &settings,
///     None,
///     &mut rng,
/// )
/// .unwrap();
/// let sig = sk.sign(&mut rng, b"hello").unwrap();
/// assert!(pk.verify(b"hello", &sig).unwrap());
/// ```
pub fn generate<R: rand::CryptoRng + ?Sized>(
    lms_types: &[LmsType],
    ots_type: LmsOtsType,
    seed: Option<&[u8]>,
    settings: &Settings,
    store: Option<Box<dyn KeyStore>>,
    rng: &mut R,
) -> Result<(SigningKey, VerifyingKey)> {
    let sk = SigningKey::new(lms_types, ots_type, seed, settings, store, rng)?;
    let pk = sk.public();
    Ok((sk, pk))
}
