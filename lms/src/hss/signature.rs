//! Contains the chained [Signature] type

use crate::codec::Reader;
use crate::constants::MAX_LEVELS;
use crate::error::{DecodeError, Error, Result};
use crate::lms;

/// A chained signature: `L - 1` signed public keys followed by the message
/// signature of the terminal level.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    /// `signatures[i]` is made by level `i`; the last one covers the message
    pub(crate) signatures: Vec<lms::Signature>,
    /// `public_keys[i]` is the key of level `i + 1`
    pub(crate) public_keys: Vec<lms::VerifyingKey>,
}

impl Signature {
    /// Assembles a chained signature; there must be exactly one more
    /// signature than public keys.
    pub fn new(signatures: Vec<lms::Signature>, public_keys: Vec<lms::VerifyingKey>) -> Result<Self> {
        if signatures.len() != public_keys.len() + 1 || signatures.len() > MAX_LEVELS {
            return Err(Error::invalid(format!(
                "{} signatures do not match {} signed keys",
                signatures.len(),
                public_keys.len()
            )));
        }
        Ok(Self {
            signatures,
            public_keys,
        })
    }

    /// Number of signed sub-keys, `L - 1`.
    pub fn signed_keys(&self) -> usize {
        self.public_keys.len()
    }

    /// Per-level signatures, top level first.
    pub fn signatures(&self) -> &[lms::Signature] {
        &self.signatures
    }

    /// Public keys of levels `1..L`.
    pub fn public_keys(&self) -> &[lms::VerifyingKey] {
        &self.public_keys
    }

    /// Number of bytes produced by [`Signature::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        4 + self.signatures.iter().map(lms::Signature::encoded_len).sum::<usize>()
            + self.public_keys.iter().map(lms::VerifyingKey::encoded_len).sum::<usize>()
    }

    /// Encodes as `u32str(Nspk) || sig[0] || pub[1] || sig[1] || ... || pub[Nspk] || sig[Nspk]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&(self.public_keys.len() as u32).to_be_bytes());
        let mut sigs = self.signatures.iter();
        if let Some(first) = sigs.next() {
            out.extend_from_slice(&first.to_bytes());
        }
        for (pk, sig) in self.public_keys.iter().zip(sigs) {
            out.extend_from_slice(&pk.to_bytes());
            out.extend_from_slice(&sig.to_bytes());
        }
        out
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> std::result::Result<Self, DecodeError> {
        let nspk = r.u32()?;
        if nspk as usize >= MAX_LEVELS {
            return Err(DecodeError::InvalidLevels(nspk.saturating_add(1)));
        }
        let mut signatures = vec![lms::Signature::decode(r)?];
        let mut public_keys = Vec::with_capacity(nspk as usize);
        for _ in 0..nspk {
            public_keys.push(lms::VerifyingKey::decode(r)?);
            signatures.push(lms::Signature::decode(r)?);
        }
        Ok(Self {
            signatures,
            public_keys,
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

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
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
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serdect::serde::Serializer,
    {
        serdect::slice::serialize_hex_lower_or_bin(&self.to_bytes(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serdect::serde::Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
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

    #[test]
    fn too_many_levels() {
        let bytes = 8u32.to_be_bytes();
        assert_eq!(
            Signature::try_from(&bytes[..]),
            Err(DecodeError::InvalidLevels(9))
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(Signature::try_from(&[][..]), Err(DecodeError::TooShort));
    }

    #[test]
    fn mismatched_parts() {
        assert!(matches!(
            Signature::new(vec![], vec![]),
            Err(Error::InvalidArgument(_))
        ));
    }
}
