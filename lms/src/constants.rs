//! Constants as defined in RFC 8554, plus the crate defaults

/// The length of the identifier `I`
pub const ID_LEN: usize = 16;

/// `D_PBLC`
pub const D_PBLC: [u8; 2] = [0x80, 0x80];
/// `D_MESG`
pub const D_MESG: [u8; 2] = [0x81, 0x81];
/// `D_LEAF`
pub const D_LEAF: [u8; 2] = [0x82, 0x82];
/// `D_INTR`
pub const D_INTR: [u8; 2] = [0x83, 0x83];

/// Separator used when deriving the tree identifier from a master seed
pub(crate) const D_IDENT: [u8; 2] = [0x90, 0x90];
/// Separator used when deriving the working seed from a master seed
pub(crate) const D_SEED: [u8; 2] = [0x91, 0x91];
/// Chain index byte used for pseudorandom private element generation (RFC 8554 Appendix A)
pub(crate) const D_PRIV: u8 = 0xff;

/// Maximum number of levels in a hierarchical chain
pub const MAX_LEVELS: usize = 8;

/// Number of keys reserved at once on the terminal level of a chain
pub const DEFAULT_KEY_RESERVE_COUNT: u32 = 20;
/// Upper bound on the number of internal node hashes kept in memory per tree
pub const STORED_TOP_LEVEL_NODES: usize = 65_535;
/// Number of workers used for leaf generation
pub const THREAD_COUNT: usize = 16;
