//! Contains the [Signature] type

use crate::codec::Reader;
use crate::error::DecodeError;
use crate::lms::modes::LmsType;
use crate::ots::Signature as OtsSignature;
use crate::types::Typecode;

/// A LMS signature: the leaf index, the leaf's one-time signature and the
/// authentication path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    pub(crate) q: u32,
    pub(crate) ots_sig: OtsSignature,
    pub(crate) lms_type: LmsType,
    pub(crate) path: Vec<Vec<u8>>,
}

impl Signature {
    /// Assembles a signature from its parts. Sizes are checked at verification time.
    pub fn new(q: u32, ots_sig: OtsSignature, lms_type: LmsType, path: Vec<Vec<u8>>) -> Self {
        Self {
            q,
            ots_sig,
            lms_type,
            path,
        }
    }

    /// The leaf index used.
    pub fn q(&self) -> u32 {
        self.q
    }

    /// The embedded one-time signature.
    pub fn ots_signature(&self) -> &OtsSignature {
        &self.ots_sig
    }

    /// The tree parameter set.
    pub fn lms_type(&self) -> LmsType {
        self.lms_type
    }

    /// Sibling hashes from the leaf upwards.
    pub fn path(&self) -> &[Vec<u8>] {
        &self.path
    }

    /// Number of bytes produced by [`Signature::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        8 + self.ots_sig.encoded_len() + self.path.iter().map(Vec::len).sum::<usize>()
    }

    /// Encodes as `u32str(q) || ots_signature || u32str(type) || path[0] || ... || path[H-1]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.q.to_be_bytes());
        out.extend_from_slice(&self.ots_sig.to_bytes());
        out.extend_from_slice(&self.lms_type.typecode().to_be_bytes());
        for node in &self.path {
            out.extend_from_slice(node);
        }
        out
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let q = r.u32()?;
        let ots_sig = OtsSignature::decode(r)?;
        let lms_type = LmsType::try_from(r.u32()?)?;
        if q >= lms_type.leaves() {
            return Err(DecodeError::InvalidQ);
        }
        let mut path = Vec::with_capacity(lms_type.h());
        for _ in 0..lms_type.h() {
            path.push(r.bytes(lms_type.m())?.to_vec());
        }
        Ok(Self {
            q,
            ots_sig,
            lms_type,
            path,
        })
    }
}

impl From<Signature> for Vec<u8> {
    fn from(sig: Signature) -> Self {
        sig.to_bytes()
    }
}

/// Tries to parse a [Signature] from an exact slice
impl TryFrom<&[u8]> for Signature {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let mut r = Reader::new(bytes);
        let sig = Self::decode(&mut r)?;
        r.finish()?;
        Ok(sig)
    }
}

impl signature::SignatureEncoding for Signature {
    type Repr = Vec<u8>;
}

#[cfg(feature = "serde")]
impl serdect::serde::Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serdect::serde::Serializer,
    {
        serdect::slice::serialize_hex_lower_or_bin(&self.to_bytes(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serdect::serde::Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serdect::serde::Deserializer<'de>,
    {
        let bytes = serdect::slice::deserialize_hex_or_bin_vec(deserializer)?;
        Self::try_from(&bytes[..]).map_err(serdect::serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::lms::SigningKey;
    use crate::ots::LmsOtsType;
    use crate::store::MemoryStore;

    fn signed() -> Signature {
        let sk = SigningKey::new(
            LmsType::Sha256M24H5,
            LmsOtsType::Sha256N24W4,
            Some(&[4u8; 24][..]),
            &Settings::default(),
            &mut rand::rng(),
        )
        .unwrap();
        sk.reserve(1, &MemoryStore::new()).unwrap();
        sk.sign(&mut rand::rng(), b"Hello, world!").unwrap()
    }

    #[test]
    fn round_trip() {
        let sig = signed();
        let bytes = sig.to_bytes();
        assert_eq!(
            bytes.len(),
            LmsType::Sha256M24H5.signature_len(LmsOtsType::Sha256N24W4)
        );
        assert_eq!(Signature::try_from(&bytes[..]), Ok(sig));
    }

    #[test]
    fn q_out_of_range() {
        let mut bytes = signed().to_bytes();
        bytes[..4].copy_from_slice(&32u32.to_be_bytes());
        assert_eq!(Signature::try_from(&bytes[..]), Err(DecodeError::InvalidQ));
    }

    #[test]
    fn truncated_path() {
        let bytes = signed().to_bytes();
        assert_eq!(
            Signature::try_from(&bytes[..bytes.len() - 24]),
            Err(DecodeError::TooShort)
        );
    }
}
