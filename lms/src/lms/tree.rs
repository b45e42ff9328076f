//! Partially cached Merkle tree.
//!
//! Node numbering follows RFC 8554: node 1 is the root, node `r` has
//! children `2r` and `2r + 1`, and the leaves are nodes `2^H..2^(H+1)`.
//! All leaf hashes are kept, together with internal nodes `1..=T` where
//! `T = min(2^H - 2, stored_top_level_nodes)`. Every other internal node is
//! recomputed from the leaves when an authentication path is requested.

use std::borrow::Cow;

use log::{debug, trace};
use rayon::prelude::*;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::constants::{D_INTR, D_LEAF};
use crate::error::{Error, Result};
use crate::lms::modes::LmsType;
use crate::ots::{LmsOtsType, PrivateKey as OtsPrivateKey};
use crate::types::Identifier;

/// Hash of leaf `q`: `H(I || u32str(2^H + q) || u16str(D_LEAF) || K)`.
pub(crate) fn leaf_hash(
    lms_type: LmsType,
    ots_type: LmsOtsType,
    id: &Identifier,
    q: u32,
    seed: &[u8],
) -> Vec<u8> {
    let ots_pub = OtsPrivateKey::from_parts(ots_type, q, *id, Zeroizing::new(seed.to_vec())).public();
    lms_type
        .hash()
        .hasher()
        .chain_update(id)
        .chain_update((lms_type.leaves() + q).to_be_bytes())
        .chain_update(D_LEAF)
        .chain_update(ots_pub.k())
        .finalize()
}

/// Hash of internal node `r`: `H(I || u32str(r) || u16str(D_INTR) || left || right)`.
pub(crate) fn interior_hash(lms_type: LmsType, id: &Identifier, r: u32, left: &[u8], right: &[u8]) -> Vec<u8> {
    lms_type
        .hash()
        .hasher()
        .chain_update(id)
        .chain_update(r.to_be_bytes())
        .chain_update(D_INTR)
        .chain_update(left)
        .chain_update(right)
        .finalize()
}

/// Leaf hashes plus the cached top slice of internal nodes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MerkleTree {
    lms_type: LmsType,
    /// Slot `q` holds node `2^H + q`.
    leaves: Vec<u8>,
    /// Slot `r - 1` holds node `r`.
    top: Vec<u8>,
    root: Vec<u8>,
}

impl MerkleTree {
    /// Builds the tree over the OTS keys derived from `seeds` (`2^H` slots of
    /// `n` bytes). Leaves are hashed on a pool of `settings.threads` workers.
    pub(crate) fn build(
        lms_type: LmsType,
        ots_type: LmsOtsType,
        id: &Identifier,
        seeds: &[u8],
        settings: &Settings,
    ) -> Result<Self> {
        let n = ots_type.n();
        let m = lms_type.m();
        let leaf_count = lms_type.leaves() as usize;
        if seeds.len() != leaf_count * n {
            return Err(Error::InconsistentTreeState("seed arena size"));
        }

        let mut leaves = vec![0u8; leaf_count * m];
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .build()?;
        pool.install(|| {
            leaves
                .par_chunks_mut(m)
                .zip(seeds.par_chunks(n))
                .enumerate()
                .for_each(|(q, (slot, seed))| {
                    slot.copy_from_slice(&leaf_hash(lms_type, ots_type, id, q as u32, seed));
                });
        });

        let top_count = (leaf_count - 2).min(settings.stored_top_level_nodes);
        let mut top = vec![0u8; top_count * m];

        // reduce one level at a time; `level` holds nodes first..2*first
        let mut level = Cow::Borrowed(leaves.as_slice());
        let mut first = leaf_count;
        while first > 1 {
            let parent_first = first / 2;
            let mut parents = Vec::with_capacity(parent_first * m);
            for (k, pair) in level.chunks_exact(2 * m).enumerate() {
                let r = parent_first + k;
                let node = interior_hash(lms_type, id, r as u32, &pair[..m], &pair[m..]);
                if r <= top_count {
                    top[(r - 1) * m..r * m].copy_from_slice(&node);
                }
                parents.extend_from_slice(&node);
            }
            level = Cow::Owned(parents);
            first = parent_first;
        }

        debug!(
            "built {lms_type} tree: {leaf_count} leaves, {top_count} cached internal nodes, {} worker(s)",
            settings.threads
        );
        let root = level.into_owned();
        Ok(Self {
            lms_type,
            leaves,
            top,
            root,
        })
    }

    pub(crate) fn root(&self) -> &[u8] {
        &self.root
    }

    /// Number of cached internal nodes.
    pub(crate) fn cached_nodes(&self) -> usize {
        self.top.len() / self.lms_type.m()
    }

    /// Authentication path for leaf `q`: the `H` siblings from the leaf up to
    /// (excluding) the root.
    ///
    /// Uncached internal nodes are recomputed into a local buffer, so this
    /// never mutates the tree.
    pub(crate) fn auth_path(&self, id: &Identifier, q: u32) -> Result<Vec<Vec<u8>>> {
        let m = self.lms_type.m();
        let leaf_count = self.lms_type.leaves() as usize;
        if self.leaves.len() % m != 0 || self.top.len() % m != 0 || self.root.len() != m {
            return Err(Error::InconsistentTreeState("node size mismatch"));
        }
        if q as usize >= leaf_count {
            return Err(Error::InconsistentTreeState("leaf index outside tree"));
        }
        let cached_leaves = self.leaves.len() / m;
        let cached_top = self.top.len() / m;
        if cached_leaves != leaf_count || cached_top > leaf_count - 1 {
            return Err(Error::InconsistentTreeState("cache sizes"));
        }

        // nodes cached_top+1 .. leaf_count-1, slot `r - cached_top - 1`
        let missing = leaf_count - 1 - cached_top;
        let mut recomputed = vec![0u8; missing * m];
        let mut computed = 0usize;
        for r in (cached_top + 1..leaf_count).rev() {
            let node = {
                let left = self.node(&recomputed, cached_top, 2 * r);
                let right = self.node(&recomputed, cached_top, 2 * r + 1);
                interior_hash(self.lms_type, id, r as u32, left, right)
            };
            let slot = r - cached_top - 1;
            recomputed[slot * m..(slot + 1) * m].copy_from_slice(&node);
            computed += 1;
        }
        trace!("recomputed {computed} internal nodes for leaf {q}");

        if computed + cached_leaves + cached_top != 2 * leaf_count - 1 {
            return Err(Error::InconsistentTreeState("node count"));
        }
        if cached_top == 0 && self.node(&recomputed, cached_top, 1) != self.root.as_slice() {
            return Err(Error::InconsistentTreeState("recomputed root"));
        }

        let mut path = Vec::with_capacity(self.lms_type.h());
        let mut node = leaf_count + q as usize;
        while node > 1 {
            path.push(self.node(&recomputed, cached_top, node ^ 1).to_vec());
            node /= 2;
        }
        Ok(path)
    }

    fn node<'a>(&'a self, recomputed: &'a [u8], cached_top: usize, r: usize) -> &'a [u8] {
        let m = self.lms_type.m();
        let leaf_count = self.lms_type.leaves() as usize;
        let (buf, slot) = if r >= leaf_count {
            (self.leaves.as_slice(), r - leaf_count)
        } else if r <= cached_top {
            (self.top.as_slice(), r - 1)
        } else {
            (recomputed, r - cached_top - 1)
        };
        &buf[slot * m..(slot + 1) * m]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: Identifier = [7; 16];

    fn seeds(ty: LmsType, ots: LmsOtsType) -> Vec<u8> {
        (0..ty.leaves() as usize * ots.n()).map(|i| (i % 251) as u8).collect()
    }

    // reference: walk the tree without any cache and fold the path back to the root
    fn fold(ty: LmsType, leaf: Vec<u8>, q: u32, path: &[Vec<u8>]) -> Vec<u8> {
        let mut node = ty.leaves() + q;
        let mut tmp = leaf;
        for sibling in path {
            tmp = if node % 2 == 1 {
                interior_hash(ty, &ID, node / 2, sibling, &tmp)
            } else {
                interior_hash(ty, &ID, node / 2, &tmp, sibling)
            };
            node /= 2;
        }
        tmp
    }

    #[test]
    fn cache_limit_does_not_change_paths() {
        let ty = LmsType::Sha256M32H5;
        let ots = LmsOtsType::Sha256N32W8;
        let seeds = seeds(ty, ots);
        let settings = Settings::default().with_threads(2);

        let full = MerkleTree::build(ty, ots, &ID, &seeds, &settings).unwrap();
        assert_eq!(full.cached_nodes(), 30);
        let small = MerkleTree::build(ty, ots, &ID, &seeds, &settings.with_stored_top_level_nodes(3))
            .unwrap();
        assert_eq!(small.cached_nodes(), 3);
        let none = MerkleTree::build(ty, ots, &ID, &seeds, &settings.with_stored_top_level_nodes(0))
            .unwrap();
        assert_eq!(none.cached_nodes(), 0);

        assert_eq!(full.root(), small.root());
        assert_eq!(full.root(), none.root());
        for q in [0, 1, 17, 31] {
            let path = full.auth_path(&ID, q).unwrap();
            assert_eq!(path.len(), 5);
            assert_eq!(path, small.auth_path(&ID, q).unwrap());
            assert_eq!(path, none.auth_path(&ID, q).unwrap());

            let leaf = leaf_hash(ty, ots, &ID, q, &seeds[q as usize * 32..(q as usize + 1) * 32]);
            assert_eq!(fold(ty, leaf, q, &path), full.root());
        }
    }

    #[test]
    fn thread_count_does_not_change_root() {
        let ty = LmsType::ShakeM24H5;
        let ots = LmsOtsType::ShakeN24W8;
        let seeds = seeds(ty, ots);
        let one = MerkleTree::build(ty, ots, &ID, &seeds, &Settings::default().with_threads(1)).unwrap();
        let many = MerkleTree::build(ty, ots, &ID, &seeds, &Settings::default().with_threads(7)).unwrap();
        assert_eq!(one, many);
        assert_eq!(one.root().len(), 24);
    }

    #[test]
    fn corrupted_cache_is_fatal() {
        let ty = LmsType::Sha256M32H5;
        let ots = LmsOtsType::Sha256N32W8;
        let mut tree = MerkleTree::build(ty, ots, &ID, &seeds(ty, ots), &Settings::default()).unwrap();
        tree.leaves.truncate(tree.leaves.len() - 32);
        assert!(matches!(
            tree.auth_path(&ID, 0),
            Err(Error::InconsistentTreeState(_))
        ));
    }

    #[test]
    fn wrong_seed_arena_is_fatal() {
        let res = MerkleTree::build(
            LmsType::Sha256M32H5,
            LmsOtsType::Sha256N32W8,
            &ID,
            &[0u8; 31],
            &Settings::default(),
        );
        assert!(matches!(res, Err(Error::InconsistentTreeState(_))));
    }
}
