//! Contains the [PublicKey] type

use subtle::ConstantTimeEq;

use crate::codec::Reader;
use crate::error::{DecodeError, Error, Result};
use crate::ots::modes::LmsOtsType;
use crate::ots::signature::Signature;
use crate::types::{Identifier, Typecode};

/// A LM-OTS public key, bound to one `(I, q)` pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKey {
    pub(crate) ots_type: LmsOtsType,
    pub(crate) id: Identifier,
    pub(crate) q: u32,
    pub(crate) k: Vec<u8>,
}

impl PublicKey {
    /// The parameter set of this key.
    pub fn ots_type(&self) -> LmsOtsType {
        self.ots_type
    }

    /// The identifier `I`.
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// The leaf index `q`.
    pub fn q(&self) -> u32 {
        self.q
    }

    /// The `n`-byte key value `K`.
    pub fn k(&self) -> &[u8] {
        &self.k
    }

    /// Verifies `signature` over `msg`.
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not match,
    /// and an error when the signature is structurally incompatible with
    /// this key.
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> Result<bool> {
        if signature.ots_type != self.ots_type {
            return Err(Error::IncompatibleParameters);
        }
        let kc = signature.recover_pubkey(&self.id, self.q, msg)?;
        Ok(bool::from(kc.ct_eq(&self.k)))
    }

    /// Encodes as `u32str(type) || I || u32str(q) || K`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.ots_type.key_len());
        out.extend_from_slice(&self.ots_type.typecode().to_be_bytes());
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.q.to_be_bytes());
        out.extend_from_slice(&self.k);
        out
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> std::result::Result<Self, DecodeError> {
        let ots_type = LmsOtsType::try_from(r.typecode()?)?;
        Ok(Self {
            ots_type,
            id: r.array()?,
            q: r.u32()?,
            k: r.bytes(ots_type.n())?.to_vec(),
        })
    }
}

impl From<PublicKey> for Vec<u8> {
    fn from(pk: PublicKey) -> Self {
        pk.to_bytes()
    }
}

/// Tries to parse a [PublicKey] from an exact slice
impl TryFrom<&[u8]> for PublicKey {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        let mut r = Reader::new(bytes);
        let pk = Self::decode(&mut r)?;
        r.finish()?;
        Ok(pk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ID_LEN;
    use crate::ots::PrivateKey;

    #[test]
    fn test_serde() {
        let pk = PrivateKey::new(LmsOtsType::Sha256N32W8, 0, [0xbb; ID_LEN], &mut rand::rng())
            .public();
        let bytes = pk.to_bytes();
        assert_eq!(bytes.len(), 56);
        assert_eq!(PublicKey::try_from(&bytes[..]), Ok(pk));

        let short = PublicKey::try_from(&bytes[..bytes.len() - 1]);
        let mut long_bytes = bytes.clone();
        long_bytes.push(0);
        let long = PublicKey::try_from(&long_bytes[..]);
        assert_eq!(short, Err(DecodeError::TooShort));
        assert_eq!(long, Err(DecodeError::TooLong));
    }

    #[test]
    fn mismatched_type_is_incompatible() {
        let mut rng = rand::rng();
        let mut sk = PrivateKey::new(LmsOtsType::Sha256N32W8, 0, [1; ID_LEN], &mut rng);
        let sig = sk.sign(&mut rng, b"msg").unwrap();
        let other = PrivateKey::new(LmsOtsType::Sha256N32W4, 0, [1; ID_LEN], &mut rng).public();
        assert!(matches!(
            other.verify(b"msg", &sig),
            Err(Error::IncompatibleParameters)
        ));
    }
}
