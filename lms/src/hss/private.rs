//! Contains the chained [SigningKey] type

use std::fmt;

use log::debug;
use zeroize::Zeroizing;

use crate::codec::Reader;
use crate::config::Settings;
use crate::constants::MAX_LEVELS;
use crate::error::{DecodeError, Error, Result};
use crate::hss::{Signature, VerifyingKey};
use crate::lms::{self, LmsType};
use crate::ots::LmsOtsType;
use crate::store::KeyStore;

/// A chain of `1..=8` LMS private keys.
///
/// Level `i` certifies the root of level `i + 1`; the terminal level
/// signs messages. Exhausted lower levels are regenerated on demand and
/// re-certified by their parent. With an attached [`KeyStore`] the whole
/// chain is persisted after every reservation increase and every
/// regeneration, before the affected leaves are used.
pub struct SigningKey {
    private_keys: Vec<lms::SigningKey>,
    public_keys: Vec<lms::VerifyingKey>,
    /// Slot `i < L - 1` certifies `public_keys[i + 1]`; slot `L - 1` holds
    /// the latest message signature. Unsigned slots are `None`.
    signatures: Vec<Option<lms::Signature>>,
    settings: Settings,
    store: Option<Box<dyn KeyStore>>,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("levels", &self.levels())
            .field("private_keys", &self.private_keys)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl PartialEq for SigningKey {
    fn eq(&self, other: &Self) -> bool {
        self.private_keys == other.private_keys
            && self.public_keys == other.public_keys
            && self.signatures == other.signatures
    }
}

impl SigningKey {
    /// Generates a chain with one tree per entry of `lms_types`.
    ///
    /// Level 0 is derived from `seed` when given; every lower level gets an
    /// independent random seed. Non-terminal levels reserve one key, the
    /// terminal level reserves `settings.reserve_count`. The chain is
    /// persisted to `store` before this returns.
    pub fn new<R: rand::CryptoRng + ?Sized>(
        lms_types: &[LmsType],
        ots_type: LmsOtsType,
        seed: Option<&[u8]>,
        settings: &Settings,
        store: Option<Box<dyn KeyStore>>,
        rng: &mut R,
    ) -> Result<Self> {
        let levels = lms_types.len();
        if levels == 0 || levels > MAX_LEVELS {
            return Err(Error::invalid(format!("level count {levels} outside 1..=8")));
        }
        settings.validate()?;

        let mut key = Self {
            private_keys: Vec::with_capacity(levels),
            public_keys: Vec::with_capacity(levels),
            signatures: vec![None; levels],
            settings: *settings,
            store,
        };
        for (level, &lms_type) in lms_types.iter().enumerate() {
            let level_seed = if level == 0 { seed } else { None };
            let sk = lms::SigningKey::new(lms_type, ots_type, level_seed, settings, rng)?;
            sk.reserve_keys(key.initial_reservation(level));
            key.public_keys.push(sk.public());
            key.private_keys.push(sk);
            if level > 0 {
                let cert = key.private_keys[level - 1].sign(rng, key.public_keys[level].k())?;
                key.signatures[level - 1] = Some(cert);
            }
        }
        key.persist()?;
        debug!("generated {levels}-level chain");
        Ok(key)
    }

    fn initial_reservation(&self, level: usize) -> u32 {
        if level + 1 == self.levels() {
            self.settings.reserve_count
        } else {
            1
        }
    }

    /// Number of levels `L`.
    pub fn levels(&self) -> usize {
        self.signatures.len()
    }

    /// The chain public key.
    pub fn public(&self) -> VerifyingKey {
        VerifyingKey {
            levels: self.levels() as u32,
            root: self.public_keys[0].clone(),
        }
    }

    /// The per-level tree keys, top first.
    pub fn private_keys(&self) -> &[lms::SigningKey] {
        &self.private_keys
    }

    /// The settings this chain regenerates levels with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Unused reserved keys on the terminal level.
    pub fn reserved_keys(&self) -> u32 {
        self.terminal().reserved_keys()
    }

    fn terminal(&self) -> &lms::SigningKey {
        &self.private_keys[self.levels() - 1]
    }

    /// Attaches or replaces the store. Nothing is written until the next
    /// state change.
    pub fn set_store(&mut self, store: Box<dyn KeyStore>) {
        self.store = Some(store);
    }

    /// Writes the chain to the attached store, if any.
    pub fn persist(&self) -> Result<()> {
        if let Some(store) = &self.store {
            store.store(&self.to_bytes())?;
            debug!("persisted {}-level chain", self.levels());
        }
        Ok(())
    }

    /// Raises `level`'s reservation by `n` and persists, restoring the old
    /// counter if the write fails.
    fn reserve_level(&self, level: usize, n: u32) -> Result<()> {
        let key = &self.private_keys[level];
        let previous = key.reserved();
        key.reserve_keys(n);
        if let Err(err) = self.persist() {
            key.rollback_reservation(previous);
            return Err(err);
        }
        debug!("level {level}: reserved {n} more key(s), R = {}", key.reserved());
        Ok(())
    }

    /// Regenerates every exhausted level below the lowest usable one and
    /// re-certifies it from its parent.
    fn refresh<R: rand::CryptoRng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let last = self.levels() - 1;
        let mut d = last;
        while self.private_keys[d].is_exhausted() {
            if d == 0 {
                return Err(Error::ChainExhausted);
            }
            d -= 1;
        }

        for level in d + 1..=last {
            let parent = level - 1;
            let old = &self.private_keys[level];
            let sk = lms::SigningKey::new(old.lms_type(), old.ots_type(), None, &self.settings, rng)?;
            sk.reserve_keys(self.initial_reservation(level));
            let pk = sk.public();

            if !self.private_keys[parent].has_reserved_key() {
                self.reserve_level(parent, 1)?;
            }
            let cert = self.private_keys[parent].sign(rng, pk.k())?;

            self.private_keys[level] = sk;
            self.public_keys[level] = pk;
            self.signatures[level - 1] = Some(cert);
            if level == last {
                self.signatures[last] = None;
            }
            debug!("regenerated chain level {level}");
            self.persist()?;
        }
        Ok(())
    }

    /// Signs `msg`, regenerating exhausted levels first.
    ///
    /// Fails with [`Error::ChainExhausted`] once the top level has no keys
    /// left.
    pub fn sign<R: rand::CryptoRng + ?Sized>(&mut self, rng: &mut R, msg: &[u8]) -> Result<Signature> {
        self.refresh(rng)?;
        let last = self.levels() - 1;
        if !self.terminal().has_reserved_key() {
            self.reserve_level(last, self.settings.reserve_count)?;
        }
        let sig = self.private_keys[last].sign(rng, msg)?;
        self.signatures[last] = Some(sig.clone());
        self.persist()?;

        let mut signatures = Vec::with_capacity(self.levels());
        for cert in &self.signatures[..last] {
            let cert = cert
                .clone()
                .ok_or(Error::InconsistentTreeState("missing level certificate"))?;
            signatures.push(cert);
        }
        signatures.push(sig);
        Ok(Signature {
            signatures,
            public_keys: self.public_keys[1..].to_vec(),
        })
    }

    /// Reserves `n` more keys on the terminal level and persists. An
    /// exhausted terminal level is regenerated first.
    pub fn reserve<R: rand::CryptoRng + ?Sized>(&mut self, n: u32, rng: &mut R) -> Result<()> {
        self.refresh(rng)?;
        self.reserve_level(self.levels() - 1, n)
    }

    /// Number of bytes produced by [`SigningKey::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        4 + self.private_keys.iter().map(lms::SigningKey::encoded_len).sum::<usize>()
            + self.public_keys.iter().map(lms::VerifyingKey::encoded_len).sum::<usize>()
            + self.signatures.iter().flatten().map(lms::Signature::encoded_len).sum::<usize>()
    }

    /// Encodes as `u32str(L)`, the `L` tree private keys, the `L` tree
    /// public keys, then the signatures present so far.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(self.encoded_len()));
        out.extend_from_slice(&(self.levels() as u32).to_be_bytes());
        for sk in &self.private_keys {
            out.extend_from_slice(&sk.to_bytes());
        }
        for pk in &self.public_keys {
            out.extend_from_slice(&pk.to_bytes());
        }
        for sig in self.signatures.iter().map_while(Option::as_ref) {
            out.extend_from_slice(&sig.to_bytes());
        }
        out
    }

    /// Decodes a chain and rebuilds every tree. Each rebuilt root must match
    /// the stored public key.
    pub fn from_bytes(bytes: &[u8], settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let mut r = Reader::new(bytes);
        let levels = r.u32()?;
        if levels == 0 || levels as usize > MAX_LEVELS {
            return Err(DecodeError::InvalidLevels(levels).into());
        }
        let levels = levels as usize;

        let mut private_keys = Vec::with_capacity(levels);
        for _ in 0..levels {
            private_keys.push(lms::SigningKey::decode(&mut r, settings)?);
        }
        let mut public_keys = Vec::with_capacity(levels);
        for _ in 0..levels {
            public_keys.push(lms::VerifyingKey::decode(&mut r)?);
        }
        let mut signatures = vec![None; levels];
        for slot in signatures.iter_mut() {
            if r.is_empty() {
                break;
            }
            *slot = Some(lms::Signature::decode(&mut r)?);
        }
        r.finish()?;

        if private_keys.iter().zip(&public_keys).any(|(sk, pk)| sk.public() != *pk) {
            return Err(Error::InconsistentTreeState("stored public key does not match tree"));
        }
        Ok(Self {
            private_keys,
            public_keys,
            signatures,
            settings: *settings,
            store: None,
        })
    }

    /// Loads a chain from `store` and keeps the store attached for
    /// subsequent persistence.
    pub fn load(store: Box<dyn KeyStore>, settings: &Settings) -> Result<Self> {
        let bytes = Zeroizing::new(store.fetch()?);
        let mut key = Self::from_bytes(&bytes, settings)?;
        key.store = Some(store);
        debug!("loaded {}-level chain", key.levels());
        Ok(key)
    }
}

impl signature::Keypair for SigningKey {
    type VerifyingKey = VerifyingKey;

    fn verifying_key(&self) -> Self::VerifyingKey {
        self.public()
    }
}

impl signature::SignerMut<Signature> for SigningKey {
    fn try_sign(&mut self, msg: &[u8]) -> std::result::Result<Signature, signature::Error> {
        self.sign(&mut rand::rng(), msg)
            .map_err(|_| signature::Error::new())
    }
}
