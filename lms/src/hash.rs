//! Hash function facade.
//!
//! Every parameter set names one of four hash functions. A [`HashAlgorithm`]
//! is a plain value; hashers are built on demand, so there is no shared cache
//! and no global state.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use sha3::{
    Shake256,
    digest::{ExtendableOutput, Update, XofReader},
};

use crate::error::{Error, Result};

/// Hash functions usable by LM-OTS and LMS parameter sets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256, 32 byte output
    Sha256,
    /// SHA-256 truncated to 24 bytes
    Sha256_192,
    /// SHAKE256 with 32 bytes of output
    Shake256,
    /// SHAKE256 with 24 bytes of output
    Shake256_192,
}

impl HashAlgorithm {
    /// Canonical algorithm name.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha256_192 => "SHA-256/192",
            HashAlgorithm::Shake256 => "SHAKE256",
            HashAlgorithm::Shake256_192 => "SHAKE256/192",
        }
    }

    /// Output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Shake256 => 32,
            HashAlgorithm::Sha256_192 | HashAlgorithm::Shake256_192 => 24,
        }
    }

    /// Starts a fresh incremental hash computation.
    pub fn hasher(&self) -> Hasher {
        let state = match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Sha256_192 => State::Sha256(Sha256::new()),
            HashAlgorithm::Shake256 | HashAlgorithm::Shake256_192 => {
                State::Shake256(Shake256::default())
            }
        };
        Hasher {
            state,
            out_len: self.output_len(),
        }
    }

    /// One-shot digest of `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        self.hasher().chain_update(data).finalize()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SHA-256" => Ok(HashAlgorithm::Sha256),
            "SHA-256/192" => Ok(HashAlgorithm::Sha256_192),
            "SHAKE256" => Ok(HashAlgorithm::Shake256),
            "SHAKE256/192" => Ok(HashAlgorithm::Shake256_192),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Looks up a hash function by its algorithm name.
pub fn hash_function(name: &str) -> Result<HashAlgorithm> {
    name.parse()
}

#[derive(Clone)]
enum State {
    Sha256(Sha256),
    Shake256(Shake256),
}

/// Incremental hasher producing output of the algorithm's length.
#[derive(Clone)]
pub struct Hasher {
    state: State,
    out_len: usize,
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("out_len", &self.out_len)
            .finish_non_exhaustive()
    }
}

impl Hasher {
    /// Absorbs `data`.
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        match &mut self.state {
            State::Sha256(h) => Digest::update(h, data.as_ref()),
            State::Shake256(h) => Update::update(h, data.as_ref()),
        }
    }

    /// Absorbs `data`, builder style.
    pub fn chain_update(mut self, data: impl AsRef<[u8]>) -> Self {
        self.update(data);
        self
    }

    /// Finishes the computation, returning exactly `output_len` bytes.
    pub fn finalize(self) -> Vec<u8> {
        let mut out = vec![0u8; self.out_len];
        self.finalize_into(&mut out);
        out
    }

    /// Finishes the computation into `out`, which must be `output_len` long.
    pub fn finalize_into(self, out: &mut [u8]) {
        match self.state {
            State::Sha256(h) => {
                let full = h.finalize();
                out.copy_from_slice(&full[..self.out_len]);
            }
            State::Shake256(h) => {
                let mut reader = h.finalize_xof();
                reader.read(&mut out[..self.out_len]);
            }
        }
    }
}
