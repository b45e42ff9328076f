//! Durable storage for keys and signatures.
//!
//! Private keys are persisted synchronously by the reservation and chain
//! signing paths. A single store must never be driven by two key instances at
//! once; there is no cross-process locking.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::error::Result;
use crate::{hss, lms, ots};

/// Where a serialized key lives.
pub trait KeyStore: std::fmt::Debug + Send + Sync {
    /// Replaces the stored bytes. Must be durable when it returns `Ok`.
    fn store(&self, bytes: &[u8]) -> io::Result<()>;

    /// Reads back the stored bytes.
    fn fetch(&self) -> io::Result<Vec<u8>>;
}

impl<S: KeyStore + ?Sized> KeyStore for Arc<S> {
    fn store(&self, bytes: &[u8]) -> io::Result<()> {
        (**self).store(bytes)
    }

    fn fetch(&self) -> io::Result<Vec<u8>> {
        (**self).fetch()
    }
}

/// A single file, replaced atomically on every write.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Uses the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for FileStore {
    fn store(&self, bytes: &[u8]) -> io::Result<()> {
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        // must reach the disk before the rename makes it visible
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, &self.path)?;
        debug!("wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn fetch(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// In-memory store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bytes: Mutex<Option<Zeroizing<Vec<u8>>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the last stored bytes, if any.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| b.to_vec())
    }
}

impl KeyStore for MemoryStore {
    fn store(&self, bytes: &[u8]) -> io::Result<()> {
        *self.bytes.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Zeroizing::new(bytes.to_vec()));
        Ok(())
    }

    fn fetch(&self) -> io::Result<Vec<u8>> {
        self.contents()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "nothing stored"))
    }
}

/// A [`MemoryStore`] whose writes can be switched off.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    refuse: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl FlakyStore {
    pub(crate) fn refuse_writes(&self, refuse: bool) {
        self.refuse.store(refuse, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl KeyStore for FlakyStore {
    fn store(&self, bytes: &[u8]) -> io::Result<()> {
        if self.refuse.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(io::Error::other("write refused"));
        }
        self.inner.store(bytes)
    }

    fn fetch(&self) -> io::Result<Vec<u8>> {
        self.inner.fetch()
    }
}

/// Entities with a persistent binary form.
pub trait Storable: Sized {
    /// The exact persisted encoding.
    fn to_stored_bytes(&self) -> Zeroizing<Vec<u8>>;

    /// Reconstructs the entity. Private keys rebuild their trees using
    /// `settings`.
    fn from_stored_bytes(bytes: &[u8], settings: &Settings) -> Result<Self>;
}

/// Persists `value` to `store`.
pub fn save<T: Storable>(value: &T, store: &dyn KeyStore) -> Result<()> {
    store.store(&value.to_stored_bytes())?;
    Ok(())
}

/// Loads a `T` from `store`.
pub fn load<T: Storable>(store: &dyn KeyStore, settings: &Settings) -> Result<T> {
    let bytes = Zeroizing::new(store.fetch()?);
    T::from_stored_bytes(&bytes, settings)
}

macro_rules! storable_public {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Storable for $ty {
                fn to_stored_bytes(&self) -> Zeroizing<Vec<u8>> {
                    Zeroizing::new(self.to_bytes())
                }

                fn from_stored_bytes(bytes: &[u8], _settings: &Settings) -> Result<Self> {
                    Ok(Self::try_from(bytes)?)
                }
            }
        )+
    };
}

storable_public!(
    ots::PublicKey,
    ots::Signature,
    lms::VerifyingKey,
    lms::Signature,
    hss::VerifyingKey,
    hss::Signature,
);

impl Storable for ots::PrivateKey {
    fn to_stored_bytes(&self) -> Zeroizing<Vec<u8>> {
        self.to_bytes()
    }

    fn from_stored_bytes(bytes: &[u8], _settings: &Settings) -> Result<Self> {
        Ok(Self::try_from(bytes)?)
    }
}

impl Storable for lms::SigningKey {
    fn to_stored_bytes(&self) -> Zeroizing<Vec<u8>> {
        self.to_bytes()
    }

    fn from_stored_bytes(bytes: &[u8], settings: &Settings) -> Result<Self> {
        Self::from_bytes(bytes, settings)
    }
}

impl Storable for hss::SigningKey {
    fn to_stored_bytes(&self) -> Zeroizing<Vec<u8>> {
        self.to_bytes()
    }

    fn from_stored_bytes(bytes: &[u8], settings: &Settings) -> Result<Self> {
        Self::from_bytes(bytes, settings)
    }
}
