//! Shared primitive types

use crate::constants::ID_LEN;

/// Anything that has a corresponding `lmots_algorithm_type` or
/// `lms_algorithm_type` will implement this trait.
pub trait Typecode {
    /// The numeric typecode registered for the algorithm.
    fn typecode(&self) -> u32;
}

/// The 16 byte identifier I from the LM-OTS algorithm.
pub type Identifier = [u8; ID_LEN];
