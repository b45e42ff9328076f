//! LMS and HSS in Rust
//!
//! A strongly typed implementation of Leighton-Micali signatures (RFC 8554)
//! with persistent key reservation. See [ots] for the one-time signature
//! layer, [lms] for single Merkle trees and [hss] for hierarchical chains of
//! up to eight trees.
//!
//! Every leaf of a tree signs at most once. Before a leaf is used its index
//! must be covered by a reservation that has been written to a [`KeyStore`];
//! a key reloaded after a crash skips every leaf that was reserved but not
//! yet used.
//!
//! ```
//! use lms_hss::{LmsOtsType, LmsType, MemoryStore, Settings, hss};
//!
//! let mut rng = rand::rng();
//! let settings = Settings::default().with_reserve_count(8);
//! let store = Box::new(MemoryStore::new());
//! let (mut sk, pk) = hss::generate(
//!     &[LmsType::Sha256M32H5],
//!     LmsOtsType::Sha256N32W8,
//!     None,
//!     &settings,
//!     Some(store),
//!     &mut rng,
//! )
//! .unwrap();
//! let sig = sk.sign(&mut rng, b"hello").unwrap();
//! assert!(pk.verify(b"hello", &sig).unwrap());
//! ```

pub(crate) mod codec;
mod config;
pub mod constants;
mod error;
mod hash;
pub mod hss;
pub mod lms;
pub mod ots;
mod store;
mod types;

pub use config::Settings;
pub use error::{DecodeError, Error, Result};
pub use hash::{HashAlgorithm, Hasher, hash_function};
pub use lms::LmsType;
pub use ots::LmsOtsType;
pub use store::{FileStore, KeyStore, MemoryStore, Storable, load, save};
pub use types::{Identifier, Typecode};
