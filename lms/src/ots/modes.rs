//! LM-OTS parameter sets

use std::fmt;
use std::str::FromStr;

use crate::error::{DecodeError, Error, Result};
use crate::hash::HashAlgorithm;
use crate::ots::util::coefs;
use crate::types::Typecode;

macro_rules! lms_ots_types {
    ($($variant:ident = $tc:literal, $name:literal, $hash:ident, $w:literal;)+) => {
        /// Registered LM-OTS algorithm types.
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        pub enum LmsOtsType {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl LmsOtsType {
            /// Every supported parameter set, in typecode order.
            pub const ALL: &'static [LmsOtsType] = &[$(LmsOtsType::$variant),+];

            /// Canonical name, e.g. `LMOTS_SHA256_N32_W8`.
            pub fn name(&self) -> &'static str {
                match self {
                    $(LmsOtsType::$variant => $name,)+
                }
            }

            /// Computes the derived parameters of this type.
            pub fn params(&self) -> OtsParams {
                match self {
                    $(LmsOtsType::$variant => OtsParams::new(HashAlgorithm::$hash, $w),)+
                }
            }
        }

        impl Typecode for LmsOtsType {
            fn typecode(&self) -> u32 {
                match self {
                    $(LmsOtsType::$variant => $tc,)+
                }
            }
        }

        impl TryFrom<u32> for LmsOtsType {
            type Error = DecodeError;

            fn try_from(tc: u32) -> std::result::Result<Self, DecodeError> {
                match tc {
                    $($tc => Ok(LmsOtsType::$variant),)+
                    other => Err(DecodeError::UnknownTypecode(other)),
                }
            }
        }

        impl FromStr for LmsOtsType {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($name => Ok(LmsOtsType::$variant),)+
                    other => Err(Error::invalid(format!("unknown LM-OTS type {other}"))),
                }
            }
        }
    };
}

lms_ots_types! {
    Sha256N32W1 = 1, "LMOTS_SHA256_N32_W1", Sha256, 1;
    Sha256N32W2 = 2, "LMOTS_SHA256_N32_W2", Sha256, 2;
    Sha256N32W4 = 3, "LMOTS_SHA256_N32_W4", Sha256, 4;
    Sha256N32W8 = 4, "LMOTS_SHA256_N32_W8", Sha256, 8;
    Sha256N24W1 = 5, "LMOTS_SHA256_N24_W1", Sha256_192, 1;
    Sha256N24W2 = 6, "LMOTS_SHA256_N24_W2", Sha256_192, 2;
    Sha256N24W4 = 7, "LMOTS_SHA256_N24_W4", Sha256_192, 4;
    Sha256N24W8 = 8, "LMOTS_SHA256_N24_W8", Sha256_192, 8;
    ShakeN32W1 = 9, "LMOTS_SHAKE_N32_W1", Shake256, 1;
    ShakeN32W2 = 10, "LMOTS_SHAKE_N32_W2", Shake256, 2;
    ShakeN32W4 = 11, "LMOTS_SHAKE_N32_W4", Shake256, 4;
    ShakeN32W8 = 12, "LMOTS_SHAKE_N32_W8", Shake256, 8;
    ShakeN24W1 = 13, "LMOTS_SHAKE_N24_W1", Shake256_192, 1;
    ShakeN24W2 = 14, "LMOTS_SHAKE_N24_W2", Shake256_192, 2;
    ShakeN24W4 = 15, "LMOTS_SHAKE_N24_W4", Shake256_192, 4;
    ShakeN24W8 = 16, "LMOTS_SHAKE_N24_W8", Shake256_192, 8;
}

impl fmt::Display for LmsOtsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl LmsOtsType {
    /// Looks up a parameter set by typecode.
    pub fn from_typecode(tc: u32) -> Result<Self> {
        Self::try_from(tc).map_err(|_| Error::invalid(format!("unknown LM-OTS typecode {tc}")))
    }

    /// The underlying hash function.
    pub fn hash(&self) -> HashAlgorithm {
        self.params().hash
    }

    /// Hash output length `n`.
    pub fn n(&self) -> usize {
        self.params().n
    }

    /// Length of an encoded private or public key: `24 + n`.
    pub fn key_len(&self) -> usize {
        24 + self.n()
    }

    /// Length of an encoded signature: `4 + n(p + 1)`.
    pub fn signature_len(&self) -> usize {
        self.params().sig_len
    }
}

/// Derived LM-OTS parameters (RFC 8554 Appendix B).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OtsParams {
    /// The underlying hash function
    pub hash: HashAlgorithm,
    /// The length of the hash function output
    pub n: usize,
    /// The Winternitz window, which should be a value that divides 8
    pub w: usize,
    /// The number of `w` bit fields required to contain the hash of the message
    pub u: usize,
    /// The number of `w` bit fields required to contain the checksum
    pub v: usize,
    /// Computed as `u` + `v`
    pub p: usize,
    /// The left shift required to get the checksum bits
    pub ls: usize,
    /// The total length of the signature
    pub sig_len: usize,
}

impl OtsParams {
    fn new(hash: HashAlgorithm, w: usize) -> Self {
        let n = hash.output_len();
        let u = (8 * n).div_ceil(w);
        let v = (((1usize << w) - 1) * u).ilog2() as usize / w + 1;
        let p = u + v;
        Self {
            hash,
            n,
            w,
            u,
            v,
            p,
            ls: 16 - v * w,
            sig_len: 4 + n * (p + 1),
        }
    }

    /// Largest chain step, `2^w - 1`.
    pub(crate) fn max_digit(&self) -> u8 {
        // w = 8 gives 255, which still fits
        ((1u16 << self.w) - 1) as u8
    }

    /// Expands a message hash into its Winternitz coefficients followed by
    /// the coefficients of its checksum.
    pub(crate) fn expand(&self, message: &[u8]) -> Vec<u8> {
        // Returns Coefs(Q, w, u) || Coefs(Cksm(Q), w, v), see RFC 8554 section 4.4
        let mut arr: Vec<u8> = coefs(message, self.w).take(self.u).collect();

        // The checksum is the sum of all "negated" chunks, so raising any
        // message digit lowers the checksum.
        let max = u16::from(self.max_digit());
        let cksum = arr.iter().map(|&x| max - u16::from(x)).sum::<u16>() << self.ls;

        let cksum_bytes = cksum.to_be_bytes();
        arr.extend(coefs(&cksum_bytes, self.w).take(self.v));
        arr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_values() {
        let expected = [
            (LmsOtsType::Sha256N32W1, 32, 265, 7, 8516),
            (LmsOtsType::Sha256N32W2, 32, 133, 6, 4292),
            (LmsOtsType::Sha256N32W4, 32, 67, 4, 2180),
            (LmsOtsType::Sha256N32W8, 32, 34, 0, 1124),
            (LmsOtsType::Sha256N24W1, 24, 200, 8, 4828),
            (LmsOtsType::Sha256N24W2, 24, 101, 6, 2452),
            (LmsOtsType::Sha256N24W4, 24, 51, 4, 1252),
            (LmsOtsType::Sha256N24W8, 24, 26, 0, 652),
        ];
        for (ty, n, p, ls, sig_len) in expected {
            let params = ty.params();
            assert_eq!(params.n, n, "{ty}");
            assert_eq!(params.p, p, "{ty}");
            assert_eq!(params.ls, ls, "{ty}");
            assert_eq!(params.sig_len, sig_len, "{ty}");
        }
    }

    #[test]
    fn shake_mirrors_sha256_sizes() {
        for (sha, shake) in LmsOtsType::ALL[..8].iter().zip(&LmsOtsType::ALL[8..]) {
            let (a, b) = (sha.params(), shake.params());
            assert_eq!((a.n, a.w, a.p, a.ls), (b.n, b.w, b.p, b.ls));
        }
    }

    #[test]
    fn typecode_lookup() {
        for (i, ty) in LmsOtsType::ALL.iter().enumerate() {
            assert_eq!(ty.typecode() as usize, i + 1);
            assert_eq!(LmsOtsType::try_from(ty.typecode()), Ok(*ty));
            assert_eq!(ty.name().parse::<LmsOtsType>().unwrap(), *ty);
        }
        assert_eq!(
            LmsOtsType::try_from(0),
            Err(DecodeError::UnknownTypecode(0))
        );
        assert!(matches!(
            LmsOtsType::from_typecode(17),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_checksum_zero_w1() {
        let params = LmsOtsType::Sha256N32W1.params();
        let cksm = params.expand(&[0u8; 32]);
        assert_eq!(&cksm[params.u..], &[1, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_checksum_ones_w1() {
        let params = LmsOtsType::Sha256N32W1.params();
        let cksm = params.expand(&[0xff; 32]);
        assert_eq!(&cksm[params.u..], &[0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_checksum_ten_w4() {
        let params = LmsOtsType::Sha256N32W4.params();
        let cksm = params.expand(&[0xaa; 32]);
        assert_eq!(&cksm[params.u..], &[0x01, 0x04, 0x00]);
    }

    #[test]
    fn test_expand_zero_w8() {
        let params = LmsOtsType::Sha256N32W8.params();
        let expanded = params.expand(&[0u8; 32]);
        let mut expected = [0u8; 34];
        expected[params.u] = 0x1f;
        expected[params.u + 1] = 0xe0;
        assert_eq!(expanded, expected);
    }
}
