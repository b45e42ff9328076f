//! Contains the chained [VerifyingKey] type

use log::trace;

use crate::codec::Reader;
use crate::constants::MAX_LEVELS;
use crate::error::{DecodeError, Error, Result};
use crate::hss::Signature;
use crate::lms;

/// Root of trust of a chain: the level count and the top tree's public key.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct VerifyingKey {
    pub(crate) levels: u32,
    pub(crate) root: lms::VerifyingKey,
}

impl VerifyingKey {
    /// Builds a chain public key over `root`.
    pub fn new(levels: u32, root: lms::VerifyingKey) -> Result<Self> {
        if levels == 0 || levels as usize > MAX_LEVELS {
            return Err(Error::invalid(format!("level count {levels} outside 1..=8")));
        }
        Ok(Self { levels, root })
    }

    /// Number of levels `L`.
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Public key of the top tree.
    pub fn root(&self) -> &lms::VerifyingKey {
        &self.root
    }

    /// Verifies a chained signature.
    ///
    /// The root of each signed public key is checked against the key above it before
    /// the message is checked against the terminal key. The first failing
    /// link yields `Ok(false)`.
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> Result<bool> {
        if self.levels == 0 || signature.signed_keys() + 1 != self.levels as usize {
            return Err(Error::invalid(format!(
                "signature has {} signed keys for {} levels",
                signature.signed_keys(),
                self.levels
            )));
        }
        let mut key = &self.root;
        for (level, (sig, next)) in signature
            .signatures
            .iter()
            .zip(&signature.public_keys)
            .enumerate()
        {
            if !key.verify(next.k(), sig)? {
                trace!("chain link {level} does not verify");
                return Ok(false);
            }
            key = next;
        }
        match signature.signatures.last() {
            Some(sig) => key.verify(msg, sig),
            None => Ok(false),
        }
    }

    /// Number of bytes produced by [`VerifyingKey::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        4 + self.root.encoded_len()
    }

    /// Encodes as `u32str(L) || pub[0]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.levels.to_be_bytes());
        out.extend_from_slice(&self.root.to_bytes());
        out
    }
}

impl From<VerifyingKey> for Vec<u8> {
    fn from(pk: VerifyingKey) -> Self {
        pk.to_bytes()
    }
}

/// Tries to parse a [VerifyingKey] from an exact slice
impl TryFrom<&[u8]> for VerifyingKey {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        let mut r = Reader::new(bytes);
        let levels = r.u32()?;
        if levels == 0 || levels as usize > MAX_LEVELS {
            return Err(DecodeError::InvalidLevels(levels));
        }
        let root = lms::VerifyingKey::decode(&mut r)?;
        r.finish()?;
        Ok(Self { levels, root })
    }
}

impl signature::Verifier<Signature> for VerifyingKey {
    fn verify(&self, msg: &[u8], signature: &Signature) -> std::result::Result<(), signature::Error> {
        match VerifyingKey::verify(self, msg, signature) {
            Ok(true) => Ok(()),
            _ => Err(signature::Error::new()),
        }
    }
}

#[cfg(feature = "serde")]
impl serdect::serde::Serialize for VerifyingKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serdect::serde::Serializer,
    {
        serdect::slice::serialize_hex_lower_or_bin(&self.to_bytes(), serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serdect::serde::Deserialize<'de> for VerifyingKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serdect::serde::Deserializer<'de>,
    {
        let bytes = serdect::slice::deserialize_hex_or_bin_vec(deserializer)?;
        Self::try_from(&bytes[..]).map_err(serdect::serde::de::Error::custom)
    }
}
