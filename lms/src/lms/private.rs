//! Contains the [SigningKey] type and its reservation state machine

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use zeroize::Zeroizing;

use crate::codec::Reader;
use crate::config::Settings;
use crate::constants::{D_IDENT, D_SEED, ID_LEN};
use crate::error::{DecodeError, Error, Result};
use crate::lms::modes::LmsType;
use crate::lms::public::VerifyingKey;
use crate::lms::signature::Signature;
use crate::lms::tree::MerkleTree;
use crate::ots::{LmsOtsType, PrivateKey as OtsPrivateKey};
use crate::store::KeyStore;
use crate::types::{Identifier, Typecode};

/// Consumption cursor `q` and reservation counter `R`, `q <= R <= 2^H`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Reservation {
    q: u32,
    reserved: u32,
}

/// A LMS private key over `2^H` one-time keys.
///
/// A leaf is only handed out when its index is below the reservation
/// counter. With a [`KeyStore`] the counter is persisted before
/// [`SigningKey::reserve`] returns, and a reloaded key resumes at the
/// persisted counter, so no leaf is ever used twice across restarts.
pub struct SigningKey {
    lms_type: LmsType,
    ots_type: LmsOtsType,
    id: Identifier,
    /// `2^H` leaf seeds of `n` bytes each
    seeds: Zeroizing<Vec<u8>>,
    tree: MerkleTree,
    state: Mutex<Reservation>,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("lms_type", &self.lms_type)
            .field("ots_type", &self.ots_type)
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl PartialEq for SigningKey {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.lms_type == other.lms_type
            && self.ots_type == other.ots_type
            && self.id == other.id
            && self.seeds == other.seeds
            && self.tree.root() == other.tree.root()
            && *self.lock() == *other.lock()
    }
}

impl SigningKey {
    /// Generates a new key. Without a `seed` one is drawn from `rng`.
    ///
    /// The identifier and a working seed are derived from the master seed,
    /// and leaf `q` gets the sub-seed `H(working_seed || u32str(q))`, so
    /// every leaf can be generated independently. A fresh key has nothing
    /// reserved.
    pub fn new<R: rand::CryptoRng + ?Sized>(
        lms_type: LmsType,
        ots_type: LmsOtsType,
        seed: Option<&[u8]>,
        settings: &Settings,
        rng: &mut R,
    ) -> Result<Self> {
        settings.validate()?;
        let hash = ots_type.hash();
        let master = match seed {
            Some([]) => return Err(Error::invalid("seed must not be empty")),
            Some(seed) => Zeroizing::new(seed.to_vec()),
            None => {
                let mut seed = Zeroizing::new(vec![0u8; ots_type.n()]);
                rng.fill_bytes(&mut seed);
                seed
            }
        };

        let mut id = [0u8; ID_LEN];
        id.copy_from_slice(&hash.hasher().chain_update(&*master).chain_update(D_IDENT).finalize()[..ID_LEN]);
        let working = Zeroizing::new(hash.hasher().chain_update(&*master).chain_update(D_SEED).finalize());

        let n = ots_type.n();
        let mut seeds = Zeroizing::new(vec![0u8; lms_type.leaves() as usize * n]);
        for (q, slot) in seeds.chunks_exact_mut(n).enumerate() {
            hash.hasher()
                .chain_update(&*working)
                .chain_update((q as u32).to_be_bytes())
                .finalize_into(slot);
        }

        Self::from_parts(lms_type, ots_type, id, seeds, Reservation::default(), settings)
    }

    fn from_parts(
        lms_type: LmsType,
        ots_type: LmsOtsType,
        id: Identifier,
        seeds: Zeroizing<Vec<u8>>,
        state: Reservation,
        settings: &Settings,
    ) -> Result<Self> {
        let tree = MerkleTree::build(lms_type, ots_type, &id, &seeds, settings)?;
        Ok(Self {
            lms_type,
            ots_type,
            id,
            seeds,
            tree,
            state: Mutex::new(state),
        })
    }

    // The reservation is two integers that are always written together, so a
    // poisoned lock still guards a consistent value.
    fn lock(&self) -> MutexGuard<'_, Reservation> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The tree parameter set.
    pub fn lms_type(&self) -> LmsType {
        self.lms_type
    }

    /// The one-time signature parameter set.
    pub fn ots_type(&self) -> LmsOtsType {
        self.ots_type
    }

    /// The identifier `I`.
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// The public key of this tree.
    pub fn public(&self) -> VerifyingKey {
        VerifyingKey {
            lms_type: self.lms_type,
            ots_type: self.ots_type,
            id: self.id,
            k: self.tree.root().to_vec(),
        }
    }

    /// Index of the next leaf to be used.
    pub fn q(&self) -> u32 {
        self.lock().q
    }

    /// Reservation counter `R`.
    pub fn reserved(&self) -> u32 {
        self.lock().reserved
    }

    /// Number of leaves that can be used without reserving more, `R - q`.
    pub fn reserved_keys(&self) -> u32 {
        let state = self.lock();
        state.reserved - state.q
    }

    /// `true` once every leaf has been used.
    pub fn is_exhausted(&self) -> bool {
        self.lock().q == self.lms_type.leaves()
    }

    /// `true` if at least one reserved leaf is still unused.
    pub fn has_reserved_key(&self) -> bool {
        self.reserved_keys() > 0
    }

    /// Raises `R` by `n` (capped at `2^H`) in memory only and returns the
    /// new value. The caller must persist before any new leaf is used.
    pub(crate) fn reserve_keys(&self, n: u32) -> u32 {
        let mut state = self.lock();
        state.reserved = self.capped(state.reserved, n);
        state.reserved
    }

    /// Raises `R` by `n` (capped at `2^H`) and persists the key to `store`
    /// before returning. The lock is held across the write, so no leaf of
    /// the new range is handed out before it is durable. If the write fails
    /// `R` is restored and the error returned.
    pub fn reserve(&self, n: u32, store: &dyn KeyStore) -> Result<()> {
        let mut state = self.lock();
        let previous = state.reserved;
        state.reserved = self.capped(previous, n);
        let bytes = self.encode(state.reserved);
        if let Err(err) = store.store(&bytes) {
            warn!(
                "persisting reservation {} -> {} failed, rolling back: {err}",
                previous, state.reserved
            );
            state.reserved = previous;
            return Err(err.into());
        }
        debug!(
            "reserved leaves {}..{} of {} tree",
            previous, state.reserved, self.lms_type
        );
        Ok(())
    }

    /// Undoes an in-memory reservation whose persistence failed.
    pub(crate) fn rollback_reservation(&self, previous: u32) {
        let mut state = self.lock();
        debug_assert!(state.q <= previous, "leaf handed out from an uncommitted reservation");
        state.reserved = previous;
    }

    fn capped(&self, reserved: u32, n: u32) -> u32 {
        reserved.saturating_add(n).min(self.lms_type.leaves())
    }

    /// Hands out the next reserved one-time key and advances `q`.
    pub fn next_key(&self) -> Result<OtsPrivateKey> {
        let mut state = self.lock();
        if state.q == self.lms_type.leaves() {
            return Err(Error::Exhausted);
        }
        if state.q == state.reserved {
            return Err(Error::NoReservedKeys);
        }
        let q = state.q;
        state.q += 1;
        drop(state);
        Ok(self.ots_key(q))
    }

    fn ots_key(&self, q: u32) -> OtsPrivateKey {
        let n = self.ots_type.n();
        let start = q as usize * n;
        let seed = Zeroizing::new(self.seeds[start..start + n].to_vec());
        OtsPrivateKey::from_parts(self.ots_type, q, self.id, seed)
    }

    /// The private elements of leaf `q`, for any `q < 2^H`.
    pub fn leaf_private_elements(&self, q: u32) -> Result<Zeroizing<Vec<u8>>> {
        if q >= self.lms_type.leaves() {
            return Err(Error::invalid(format!("leaf index {q} outside tree")));
        }
        Ok(self.ots_key(q).private_elements())
    }

    /// Signs `msg` with the next reserved leaf.
    ///
    /// Fails with [`Error::Exhausted`] or [`Error::NoReservedKeys`] without
    /// consuming anything.
    pub fn sign<R: rand::CryptoRng + ?Sized>(&self, rng: &mut R, msg: &[u8]) -> Result<Signature> {
        let ots_key = self.next_key()?;
        let mut c = vec![0u8; self.ots_type.n()];
        rng.fill_bytes(&mut c);
        let ots_sig = ots_key.sign_with_randomizer(c, msg);
        let path = self.tree.auth_path(&self.id, ots_key.q())?;
        Ok(Signature {
            q: ots_key.q(),
            ots_sig,
            lms_type: self.lms_type,
            path,
        })
    }

    /// Number of bytes produced by [`SigningKey::to_bytes`].
    pub fn encoded_len(&self) -> usize {
        self.lms_type.private_key_len(self.ots_type)
    }

    /// Encodes as `u32str(type) || u32str(otstype) || u32str(R) || I`
    /// followed by the `2^H` one-time private keys. The cursor `q` is not
    /// stored; a decoded key resumes at `R`.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let reserved = self.lock().reserved;
        self.encode(reserved)
    }

    fn encode(&self, reserved: u32) -> Zeroizing<Vec<u8>> {
        let n = self.ots_type.n();
        let mut out = Zeroizing::new(Vec::with_capacity(self.encoded_len()));
        out.extend_from_slice(&self.lms_type.typecode().to_be_bytes());
        out.extend_from_slice(&self.ots_type.typecode().to_be_bytes());
        out.extend_from_slice(&reserved.to_be_bytes());
        out.extend_from_slice(&self.id);
        for (q, seed) in self.seeds.chunks_exact(n).enumerate() {
            out.extend_from_slice(&self.ots_type.typecode().to_be_bytes());
            out.extend_from_slice(&self.id);
            out.extend_from_slice(&(q as u32).to_be_bytes());
            out.extend_from_slice(seed);
        }
        out
    }

    /// Decodes a key and rebuilds its tree. The cursor is set to the stored
    /// reservation counter, so leaves reserved before a crash are skipped.
    pub fn from_bytes(bytes: &[u8], settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let mut r = Reader::new(bytes);
        let key = Self::decode(&mut r, settings)?;
        r.finish()?;
        Ok(key)
    }

    pub(crate) fn decode(r: &mut Reader<'_>, settings: &Settings) -> Result<Self> {
        let lms_type = LmsType::try_from(r.typecode()?)?;
        let ots_type = LmsOtsType::try_from(r.u32()?)?;
        let reserved = r.u32()?;
        if reserved > lms_type.leaves() {
            return Err(DecodeError::InvalidQ.into());
        }
        let id: Identifier = r.array()?;

        let n = ots_type.n();
        let mut seeds = Zeroizing::new(Vec::with_capacity(lms_type.leaves() as usize * n));
        for q in 0..lms_type.leaves() {
            let ots = OtsPrivateKey::decode(r)?;
            if ots.ots_type != ots_type || ots.id != id {
                return Err(DecodeError::WrongAlgorithm.into());
            }
            if ots.q != q {
                return Err(DecodeError::InvalidQ.into());
            }
            seeds.extend_from_slice(&ots.seed);
        }

        let state = Reservation { q: reserved, reserved };
        debug!("loaded {lms_type} key, resuming at leaf {reserved}");
        Self::from_parts(lms_type, ots_type, id, seeds, state, settings)
    }
}

impl signature::Keypair for SigningKey {
    type VerifyingKey = VerifyingKey;

    fn verifying_key(&self) -> Self::VerifyingKey {
        self.public()
    }
}

impl signature::Signer<Signature> for SigningKey {
    fn try_sign(&self, msg: &[u8]) -> std::result::Result<Signature, signature::Error> {
        self.sign(&mut rand::rng(), msg)
            .map_err(|_| signature::Error::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FlakyStore, MemoryStore};

    fn small_key() -> SigningKey {
        SigningKey::new(
            LmsType::Sha256M32H5,
            LmsOtsType::Sha256N32W8,
            None,
            &Settings::default(),
            &mut rand::rng(),
        )
        .unwrap()
    }

    #[test]
    fn nothing_reserved_initially() {
        let sk = small_key();
        assert_eq!((sk.q(), sk.reserved()), (0, 0));
        assert!(!sk.has_reserved_key());
        assert!(matches!(sk.next_key(), Err(Error::NoReservedKeys)));
        assert!(matches!(
            sk.sign(&mut rand::rng(), b"msg"),
            Err(Error::NoReservedKeys)
        ));
        assert_eq!(sk.q(), 0);
    }

    #[test]
    fn reservation_is_capped() {
        let sk = small_key();
        let store = MemoryStore::new();
        sk.reserve(10, &store).unwrap();
        assert_eq!(sk.reserved(), 10);
        sk.reserve(u32::MAX, &store).unwrap();
        assert_eq!(sk.reserved(), 32);
        assert_eq!(sk.reserved_keys(), 32);
    }

    #[test]
    fn next_key_advances() {
        let sk = small_key();
        sk.reserve(2, &MemoryStore::new()).unwrap();
        assert_eq!(sk.next_key().unwrap().q(), 0);
        assert_eq!(sk.next_key().unwrap().q(), 1);
        assert!(matches!(sk.next_key(), Err(Error::NoReservedKeys)));
    }

    #[test]
    fn exhausted_after_all_leaves() {
        let sk = small_key();
        sk.reserve(32, &MemoryStore::new()).unwrap();
        for _ in 0..32 {
            sk.next_key().unwrap();
        }
        assert!(sk.is_exhausted());
        assert!(matches!(sk.next_key(), Err(Error::Exhausted)));
    }

    #[test]
    fn reserve_persists() {
        let sk = small_key();
        let store = MemoryStore::new();
        sk.reserve(5, &store).unwrap();
        let loaded = SigningKey::from_bytes(&store.contents().unwrap(), &Settings::default()).unwrap();
        assert_eq!(loaded.q(), 5);
        assert_eq!(loaded.reserved(), 5);
        assert_eq!(loaded.public(), sk.public());
    }

    #[test]
    fn failed_persist_rolls_back() {
        let sk = small_key();
        let store = FlakyStore::default();
        sk.reserve(3, &store).unwrap();
        store.refuse_writes(true);
        assert!(matches!(sk.reserve(4, &store), Err(Error::Io(_))));
        assert_eq!(sk.reserved(), 3);
        assert_eq!(sk.next_key().unwrap().q(), 0);

        // the stored counter is still the committed one
        let loaded = SigningKey::from_bytes(&store.fetch().unwrap(), &Settings::default()).unwrap();
        assert_eq!(loaded.q(), 3);
    }

    #[test]
    fn in_memory_rollback_restores_counter() {
        let sk = small_key();
        sk.reserve_keys(4);
        sk.rollback_reservation(0);
        assert_eq!(sk.reserved(), 0);
        assert!(matches!(sk.next_key(), Err(Error::NoReservedKeys)));
    }

    #[test]
    fn deterministic_from_seed() {
        let settings = Settings::default();
        let a = SigningKey::new(LmsType::Sha256M24H5, LmsOtsType::Sha256N24W8, Some(&b"seed"[..]), &settings, &mut rand::rng()).unwrap();
        let b = SigningKey::new(LmsType::Sha256M24H5, LmsOtsType::Sha256N24W8, Some(&b"seed"[..]), &settings.with_threads(3), &mut rand::rng()).unwrap();
        assert_eq!(a, b);
        for q in 0..32 {
            assert_eq!(a.leaf_private_elements(q).unwrap(), b.leaf_private_elements(q).unwrap());
        }
        assert!(a.leaf_private_elements(32).is_err());
    }

    #[test]
    fn empty_seed_rejected() {
        let res = SigningKey::new(LmsType::Sha256M32H5, LmsOtsType::Sha256N32W8, Some(&[][..]), &Settings::default(), &mut rand::rng());
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn decode_rejects_reorder() {
        let sk = small_key();
        let mut bytes = sk.to_bytes().to_vec();
        // q of the first embedded one-time key
        let q_offset = 28 + 4 + ID_LEN;
        bytes[q_offset + 3] = 1;
        assert!(matches!(
            SigningKey::from_bytes(&bytes, &Settings::default()),
            Err(Error::Decode(DecodeError::InvalidQ))
        ));
    }
}
