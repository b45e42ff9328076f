//! Contains the [Signature] type

use crate::codec::Reader;
use crate::constants::{D_MESG, D_PBLC};
use crate::error::{DecodeError, Error, Result};
use crate::ots::chain;
use crate::ots::modes::LmsOtsType;
use crate::types::{Identifier, Typecode};

/// A LM-OTS signature: the randomizer `C` and `p` partially iterated chain values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    pub(crate) ots_type: LmsOtsType,
    pub(crate) c: Vec<u8>,
    pub(crate) y: Vec<Vec<u8>>,
}

impl Signature {
    /// Assembles a signature from its parts. Lengths are checked at verification time.
    pub fn new(ots_type: LmsOtsType, c: Vec<u8>, y: Vec<Vec<u8>>) -> Self {
        Self { ots_type, c, y }
    }

    /// The parameter set this signature claims.
    pub fn ots_type(&self) -> LmsOtsType {
        self.ots_type
    }

    /// The randomizer `C`.
    pub fn c(&self) -> &[u8] {
        &self.c
    }

    /// The chain values `y[0..p]`.
    pub fn y(&self) -> &[Vec<u8>] {
        &self.y
    }

    /// Number of bytes produced by [`Signature::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        4 + self.c.len() + self.y.iter().map(Vec::len).sum::<usize>()
    }

    fn check_lengths(&self) -> Result<()> {
        let params = self.ots_type.params();
        if self.y.len() != params.p {
            return Err(Error::InvalidSignatureLength {
                expected: params.p,
                got: self.y.len(),
            });
        }
        for part in std::iter::once(&self.c).chain(&self.y) {
            if part.len() != params.n {
                return Err(Error::InvalidSignatureLength {
                    expected: params.n,
                    got: part.len(),
                });
            }
        }
        Ok(())
    }

    /// Computes the public key candidate `Kc` for `msg`, following algorithm 4b
    /// of RFC 8554.
    pub(crate) fn recover_pubkey(&self, id: &Identifier, q: u32, msg: &[u8]) -> Result<Vec<u8>> {
        self.check_lengths()?;
        let params = self.ots_type.params();

        // Q = H(I || u32str(q) || u16str(D_MESG) || C || message)
        let q_hash = params
            .hash
            .hasher()
            .chain_update(id)
            .chain_update(q.to_be_bytes())
            .chain_update(D_MESG)
            .chain_update(&self.c)
            .chain_update(msg)
            .finalize();

        let max = params.max_digit();
        let mut kc = params
            .hash
            .hasher()
            .chain_update(id)
            .chain_update(q.to_be_bytes())
            .chain_update(D_PBLC);
        for (i, (a, y)) in params.expand(&q_hash).into_iter().zip(&self.y).enumerate() {
            kc.update(chain(&params, id, q, i, a, max, y));
        }
        Ok(kc.finalize())
    }

    /// Encodes as `u32str(type) || C || y[0] || ... || y[p-1]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.ots_type.typecode().to_be_bytes());
        out.extend_from_slice(&self.c);
        for y in &self.y {
            out.extend_from_slice(y);
        }
        out
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> std::result::Result<Self, DecodeError> {
        let ots_type = LmsOtsType::try_from(r.typecode()?)?;
        let params = ots_type.params();
        let c = r.bytes(params.n)?.to_vec();
        let mut y = Vec::with_capacity(params.p);
        for _ in 0..params.p {
            y.push(r.bytes(params.n)?.to_vec());
        }
        Ok(Self { ots_type, c, y })
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
