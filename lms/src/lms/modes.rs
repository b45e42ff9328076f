//! LMS parameter sets

use std::fmt;
use std::str::FromStr;

use crate::error::{DecodeError, Error, Result};
use crate::hash::HashAlgorithm;
use crate::ots::LmsOtsType;
use crate::types::Typecode;

macro_rules! lms_types {
    ($($variant:ident = $tc:literal, $name:literal, $hash:ident, $h:literal;)+) => {
        /// Registered LMS algorithm types.
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        pub enum LmsType {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl LmsType {
            /// Every supported parameter set, in typecode order.
            pub const ALL: &'static [LmsType] = &[$(LmsType::$variant),+];

            /// Canonical name, e.g. `LMS_SHA256_M32_H10`.
            pub fn name(&self) -> &'static str {
                match self {
                    $(LmsType::$variant => $name,)+
                }
            }

            /// The underlying hash function.
            pub fn hash(&self) -> HashAlgorithm {
                match self {
                    $(LmsType::$variant => HashAlgorithm::$hash,)+
                }
            }

            /// Tree height `H`.
            pub fn h(&self) -> usize {
                match self {
                    $(LmsType::$variant => $h,)+
                }
            }
        }

        impl Typecode for LmsType {
            fn typecode(&self) -> u32 {
                match self {
                    $(LmsType::$variant => $tc,)+
                }
            }
        }

        impl TryFrom<u32> for LmsType {
            type Error = DecodeError;

            fn try_from(tc: u32) -> std::result::Result<Self, DecodeError> {
                match tc {
                    $($tc => Ok(LmsType::$variant),)+
                    other => Err(DecodeError::UnknownTypecode(other)),
                }
            }
        }

        impl FromStr for LmsType {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($name => Ok(LmsType::$variant),)+
                    other => Err(Error::invalid(format!("unknown LMS type {other}"))),
                }
            }
        }
    };
}

lms_types! {
    Sha256M32H5 = 5, "LMS_SHA256_M32_H5", Sha256, 5;
    Sha256M32H10 = 6, "LMS_SHA256_M32_H10", Sha256, 10;
    Sha256M32H15 = 7, "LMS_SHA256_M32_H15", Sha256, 15;
    Sha256M32H20 = 8, "LMS_SHA256_M32_H20", Sha256, 20;
    Sha256M32H25 = 9, "LMS_SHA256_M32_H25", Sha256, 25;
    Sha256M24H5 = 10, "LMS_SHA256_M24_H5", Sha256_192, 5;
    Sha256M24H10 = 11, "LMS_SHA256_M24_H10", Sha256_192, 10;
    Sha256M24H15 = 12, "LMS_SHA256_M24_H15", Sha256_192, 15;
    Sha256M24H20 = 13, "LMS_SHA256_M24_H20", Sha256_192, 20;
    Sha256M24H25 = 14, "LMS_SHA256_M24_H25", Sha256_192, 25;
    ShakeM32H5 = 15, "LMS_SHAKE_M32_H5", Shake256, 5;
    ShakeM32H10 = 16, "LMS_SHAKE_M32_H10", Shake256, 10;
    ShakeM32H15 = 17, "LMS_SHAKE_M32_H15", Shake256, 15;
    ShakeM32H20 = 18, "LMS_SHAKE_M32_H20", Shake256, 20;
    ShakeM32H25 = 19, "LMS_SHAKE_M32_H25", Shake256, 25;
    ShakeM24H5 = 20, "LMS_SHAKE_M24_H5", Shake256_192, 5;
    ShakeM24H10 = 21, "LMS_SHAKE_M24_H10", Shake256_192, 10;
    ShakeM24H15 = 22, "LMS_SHAKE_M24_H15", Shake256_192, 15;
    ShakeM24H20 = 23, "LMS_SHAKE_M24_H20", Shake256_192, 20;
    ShakeM24H25 = 24, "LMS_SHAKE_M24_H25", Shake256_192, 25;
}

impl fmt::Display for LmsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl LmsType {
    /// Looks up a parameter set by typecode.
    pub fn from_typecode(tc: u32) -> Result<Self> {
        Self::try_from(tc).map_err(|_| Error::invalid(format!("unknown LMS typecode {tc}")))
    }

    /// Node size `m`.
    pub fn m(&self) -> usize {
        self.hash().output_len()
    }

    /// Number of leaves, `2^H`.
    pub fn leaves(&self) -> u32 {
        1 << self.h()
    }

    /// Length of an encoded private key: `28 + 2^H (24 + n)`.
    pub fn private_key_len(&self, ots_type: LmsOtsType) -> usize {
        28 + self.leaves() as usize * ots_type.key_len()
    }

    /// Length of an encoded public key: `24 + m`.
    pub fn public_key_len(&self) -> usize {
        24 + self.m()
    }

    /// Length of an encoded signature: `8 + otsSig + H m`.
    pub fn signature_len(&self, ots_type: LmsOtsType) -> usize {
        8 + ots_type.signature_len() + self.h() * self.m()
    }
}
