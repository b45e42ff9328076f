//! Contains the [PrivateKey] type

use std::fmt;

use zeroize::Zeroizing;

use crate::codec::Reader;
use crate::constants::{D_MESG, D_PBLC, D_PRIV};
use crate::error::{DecodeError, Error, Result};
use crate::ots::chain;
use crate::ots::modes::LmsOtsType;
use crate::ots::public::PublicKey;
use crate::ots::signature::Signature;
use crate::types::{Identifier, Typecode};

/// A LM-OTS private key. Only the seed is stored; the `p` private elements
/// are re-derived whenever they are needed.
#[derive(Clone)]
pub struct PrivateKey {
    pub(crate) ots_type: LmsOtsType,
    pub(crate) id: Identifier,
    pub(crate) q: u32,
    pub(crate) seed: Zeroizing<Vec<u8>>,
    valid: bool,
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("ots_type", &self.ots_type)
            .field("q", &self.q)
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.ots_type == other.ots_type
            && self.id == other.id
            && self.q == other.q
            && self.seed == other.seed
    }
}

impl PrivateKey {
    /// Generates a key with a random seed.
    pub fn new<R: rand::CryptoRng + ?Sized>(
        ots_type: LmsOtsType,
        q: u32,
        id: Identifier,
        rng: &mut R,
    ) -> Self {
        let mut seed = Zeroizing::new(vec![0u8; ots_type.n()]);
        rng.fill_bytes(&mut seed);
        Self::from_parts(ots_type, q, id, seed)
    }

    /// Creates a key from a known seed. The seed must be `n` bytes long.
    pub fn from_seed(ots_type: LmsOtsType, q: u32, id: Identifier, seed: &[u8]) -> Result<Self> {
        if seed.len() != ots_type.n() {
            return Err(Error::invalid(format!(
                "seed must be {} bytes, got {}",
                ots_type.n(),
                seed.len()
            )));
        }
        Ok(Self::from_parts(ots_type, q, id, Zeroizing::new(seed.to_vec())))
    }

    pub(crate) fn from_parts(
        ots_type: LmsOtsType,
        q: u32,
        id: Identifier,
        seed: Zeroizing<Vec<u8>>,
    ) -> Self {
        Self {
            ots_type,
            id,
            q,
            seed,
            valid: true,
        }
    }

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

    /// Returns `false` once the key has produced its one signature.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Expands the seed into the `p` private elements, concatenated.
    ///
    /// `x[i] = H(I || u32str(q) || u16str(i) || u8str(0xff) || SEED)`, the
    /// pseudorandom key generation of RFC 8554 Appendix A. The result only
    /// depends on the seed, `I` and `q`.
    pub fn private_elements(&self) -> Zeroizing<Vec<u8>> {
        let params = self.ots_type.params();
        let mut x = Zeroizing::new(vec![0u8; params.p * params.n]);
        for (i, xi) in x.chunks_exact_mut(params.n).enumerate() {
            params
                .hash
                .hasher()
                .chain_update(self.id)
                .chain_update(self.q.to_be_bytes())
                .chain_update((i as u16).to_be_bytes())
                .chain_update([D_PRIV])
                .chain_update(&*self.seed)
                .finalize_into(xi);
        }
        x
    }

    /// Derives the public key by iterating every chain to its end (algorithm 1).
    pub fn public(&self) -> PublicKey {
        let params = self.ots_type.params();
        let x = self.private_elements();
        let max = params.max_digit();
        let mut k = params
            .hash
            .hasher()
            .chain_update(self.id)
            .chain_update(self.q.to_be_bytes())
            .chain_update(D_PBLC);
        for (i, xi) in x.chunks_exact(params.n).enumerate() {
            k.update(chain(&params, &self.id, self.q, i, 0, max, xi));
        }
        PublicKey {
            ots_type: self.ots_type,
            id: self.id,
            q: self.q,
            k: k.finalize(),
        }
    }

    /// Signs `msg` with a fresh randomizer. A key signs at most once; a second
    /// call fails with [`Error::Exhausted`].
    pub fn sign<R: rand::CryptoRng + ?Sized>(&mut self, rng: &mut R, msg: &[u8]) -> Result<Signature> {
        if !self.valid {
            return Err(Error::Exhausted);
        }
        let mut c = vec![0u8; self.ots_type.n()];
        rng.fill_bytes(&mut c);
        let sig = self.sign_with_randomizer(c, msg);
        self.valid = false;
        Ok(sig)
    }

    /// Algorithm 3 of RFC 8554 for a caller-chosen `C`. The one-time use
    /// guarantee is the caller's responsibility.
    pub(crate) fn sign_with_randomizer(&self, c: Vec<u8>, msg: &[u8]) -> Signature {
        let params = self.ots_type.params();
        let q_hash = params
            .hash
            .hasher()
            .chain_update(self.id)
            .chain_update(self.q.to_be_bytes())
            .chain_update(D_MESG)
            .chain_update(&c)
            .chain_update(msg)
            .finalize();
        let x = self.private_elements();
        let y = params
            .expand(&q_hash)
            .into_iter()
            .zip(x.chunks_exact(params.n))
            .enumerate()
            .map(|(i, (a, xi))| chain(&params, &self.id, self.q, i, 0, a, xi))
            .collect();
        Signature {
            ots_type: self.ots_type,
            c,
            y,
        }
    }

    /// Encodes as `u32str(type) || I || u32str(q) || SEED`.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(self.ots_type.key_len()));
        out.extend_from_slice(&self.ots_type.typecode().to_be_bytes());
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.q.to_be_bytes());
        out.extend_from_slice(&self.seed);
        out
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> std::result::Result<Self, DecodeError> {
        let ots_type = LmsOtsType::try_from(r.typecode()?)?;
        let id = r.array()?;
        let q = r.u32()?;
        let seed = Zeroizing::new(r.bytes(ots_type.n())?.to_vec());
        Ok(Self::from_parts(ots_type, q, id, seed))
    }
}

/// Tries to parse a [PrivateKey] from an exact slice
impl TryFrom<&[u8]> for PrivateKey {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        let mut r = Reader::new(bytes);
        let sk = Self::decode(&mut r)?;
        r.finish()?;
        Ok(sk)
    }
}
