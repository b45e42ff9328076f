//! Contains the [VerifyingKey] type

use subtle::ConstantTimeEq;

use crate::codec::Reader;
use crate::constants::D_LEAF;
use crate::error::{DecodeError, Error, Result};
use crate::lms::Signature;
use crate::lms::modes::LmsType;
use crate::lms::tree::interior_hash;
use crate::ots::LmsOtsType;
use crate::types::{Identifier, Typecode};

/// A LMS public key: parameters, identifier and Merkle root.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct VerifyingKey {
    pub(crate) lms_type: LmsType,
    pub(crate) ots_type: LmsOtsType,
    pub(crate) id: Identifier,
    pub(crate) k: Vec<u8>,
}

impl VerifyingKey {
    /// Assembles a public key. The root must be `m` bytes long.
    pub fn new(lms_type: LmsType, ots_type: LmsOtsType, id: Identifier, k: Vec<u8>) -> Result<Self> {
        if k.len() != lms_type.m() {
            return Err(Error::invalid(format!(
                "root must be {} bytes, got {}",
                lms_type.m(),
                k.len()
            )));
        }
        Ok(Self {
            lms_type,
            ots_type,
            id,
            k,
        })
    }

    /// The tree parameter set.
    pub fn lms_type(&self) -> LmsType {
        self.lms_type
    }

    /// The one-time signature parameter set.
    pub fn ots_type(&self) -> LmsOtsType {
        self.ots_type
    }

    /// Returns the 16-byte identifier of the public key
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Returns the m-byte root as a byte slice
    pub fn k(&self) -> &[u8] {
        &self.k
    }

    /// Verifies `signature` over `msg` (algorithm 6a of RFC 8554).
    ///
    /// A mismatch returns `Ok(false)`; parameter disagreement returns
    /// [`Error::IncompatibleParameters`] and malformed sizes
    /// [`Error::InvalidSignatureLength`].
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> Result<bool> {
        if signature.lms_type != self.lms_type || signature.ots_sig.ots_type != self.ots_type {
            return Err(Error::IncompatibleParameters);
        }
        let h = self.lms_type.h();
        let m = self.lms_type.m();
        if signature.path.len() != h {
            return Err(Error::InvalidSignatureLength {
                expected: h,
                got: signature.path.len(),
            });
        }
        if let Some(node) = signature.path.iter().find(|node| node.len() != m) {
            return Err(Error::InvalidSignatureLength {
                expected: m,
                got: node.len(),
            });
        }
        if signature.q >= self.lms_type.leaves() {
            return Ok(false);
        }

        // Compute the LMS Public Key Candidate Tc from the signature,
        // message, identifier, pubtype, and ots_typecode, using Algorithm 6a.
        let key_candidate = signature.ots_sig.recover_pubkey(&self.id, signature.q, msg)?;

        let mut node_num = signature.q + self.lms_type.leaves();
        let mut tmp = self
            .lms_type
            .hash()
            .hasher()
            .chain_update(self.id)
            .chain_update(node_num.to_be_bytes())
            .chain_update(D_LEAF)
            .chain_update(&key_candidate)
            .finalize();

        for sibling in &signature.path {
            tmp = if node_num % 2 == 1 {
                // Tc = H(I || u32str(node_num/2) || u16str(D_INTR) || path[i] || tmp)
                interior_hash(self.lms_type, &self.id, node_num / 2, sibling, &tmp)
            } else {
                // Tc = H(I || u32str(node_num/2) || u16str(D_INTR) || tmp || path[i])
                interior_hash(self.lms_type, &self.id, node_num / 2, &tmp, sibling)
            };
            node_num /= 2;
        }
        Ok(bool::from(tmp.ct_eq(&self.k)))
    }

    /// Number of bytes produced by [`VerifyingKey::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        24 + self.k.len()
    }

    /// Encodes as `u32str(type) || u32str(otstype) || I || T[1]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.lms_type.typecode().to_be_bytes());
        out.extend_from_slice(&self.ots_type.typecode().to_be_bytes());
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.k);
        out
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> std::result::Result<Self, DecodeError> {
        let lms_type = LmsType::try_from(r.typecode()?)?;
        let ots_type = LmsOtsType::try_from(r.u32()?)?;
        Ok(Self {
            lms_type,
            ots_type,
            id: r.array()?,
            k: r.bytes(lms_type.m())?.to_vec(),
        })
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
        let pk = Self::decode(&mut r)?;
        r.finish()?;
        Ok(pk)
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
