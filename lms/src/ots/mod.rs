//! Everything related to LM-OTS

pub(crate) mod modes;
mod private;
mod public;
pub mod signature;
pub(crate) mod util;

pub use modes::{LmsOtsType, OtsParams};
pub use private::PrivateKey;
pub use public::PublicKey;
pub use signature::Signature;

use crate::types::Identifier;

/// Iterates chain `i` from step `from` up to (excluding) step `to`:
/// `tmp = H(I || u32str(q) || u16str(i) || u8str(j) || tmp)`.
pub(crate) fn chain(
    params: &OtsParams,
    id: &Identifier,
    q: u32,
    i: usize,
    from: u8,
    to: u8,
    start: &[u8],
) -> Vec<u8> {
    let mut tmp = start.to_vec();
    let chain_index = (i as u16).to_be_bytes();
    for j in from..to {
        let mut h = params.hash.hasher();
        h.update(id);
        h.update(q.to_be_bytes());
        h.update(chain_index);
        h.update([j]);
        h.update(&tmp);
        h.finalize_into(&mut tmp);
    }
    tmp
}
