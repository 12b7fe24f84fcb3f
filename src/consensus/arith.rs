//! 256-bit target arithmetic
//!
//! Difficulty targets are 256-bit unsigned integers carried in block
//! headers as a 32-bit compact form: an 8-bit exponent, a 23-bit
//! mantissa, and a sign bit. A one-bit divergence in this arithmetic
//! forks the chain, so every retargeting algorithm goes through this
//! one type instead of a general big-integer library with different
//! truncation rules.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Shl, Shr, Sub};

/// 256-bit unsigned integer stored as four little-endian 64-bit limbs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uint256([u64; 4]);

impl Uint256 {
    /// The zero value
    pub const ZERO: Uint256 = Uint256([0; 4]);

    /// The largest representable value, 2^256 - 1
    pub const MAX: Uint256 = Uint256([u64::MAX; 4]);

    /// Build from a single 64-bit value
    pub const fn from_u64(value: u64) -> Self {
        Uint256([value, 0, 0, 0])
    }

    /// True if every limb is zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0u64; 4]
    }

    /// Position of the highest set bit plus one; zero for zero
    pub fn bits(&self) -> u32 {
        for (i, &limb) in self.0.iter().enumerate().rev() {
            if limb != 0 {
                return i as u32 * 64 + (64 - limb.leading_zeros());
            }
        }
        0
    }

    /// The low 64 bits
    pub fn low64(&self) -> u64 {
        self.0[0]
    }

    /// Decode a compact target.
    ///
    /// Returns the expanded value together with its negative and
    /// overflow flags. The mantissa is negative when nonzero with the
    /// sign bit set, and overflows when its significant bytes would be
    /// shifted past the top of 256 bits.
    pub fn from_compact(compact: u32) -> (Self, bool, bool) {
        let size = compact >> 24;
        let mut word = compact & 0x007f_ffff;

        let target = if size <= 3 {
            word >>= 8 * (3 - size);
            Uint256::from_u64(u64::from(word))
        } else {
            Uint256::from_u64(u64::from(word)) << (8 * (size - 3))
        };

        let negative = word != 0 && (compact & 0x0080_0000) != 0;
        let overflow = word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

        (target, negative, overflow)
    }

    /// Encode to the compact representation.
    ///
    /// Targets are non-negative, so the sign bit is always clear; a
    /// mantissa whose high bit would be set instead bumps the exponent.
    pub fn to_compact(&self) -> u32 {
        let mut size = (self.bits() + 7) / 8;
        let mut word = if size <= 3 {
            self.low64() << (8 * (3 - size))
        } else {
            (*self >> (8 * (size - 3))).low64()
        };

        if word & 0x0080_0000 != 0 {
            word >>= 8;
            size += 1;
        }

        debug_assert_eq!(word & !0x007f_ffff, 0);
        (word as u32) | (size << 24)
    }

    /// Parse big-endian display hex, the order target constants are
    /// written in. Shorter strings are zero-extended on the left.
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        let trimmed = hex_str.trim_start_matches("0x");
        let padded = format!("{:0>64}", trimmed);
        if padded.len() != 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }

        let decoded = hex::decode(&padded)?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Self::from_be_bytes(bytes))
    }

    /// Big-endian display hex, 64 digits
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }

    /// Interpret 32 bytes with byte 0 most significant
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, chunk) in bytes.chunks_exact(8).enumerate() {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            limbs[3 - i] = u64::from_be_bytes(buf);
        }
        Uint256(limbs)
    }

    /// Big-endian byte representation
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for i in 0..4 {
            out[8 * i..8 * (i + 1)].copy_from_slice(&self.0[3 - i].to_be_bytes());
        }
        out
    }

    /// Interpret 32 bytes with byte 0 least significant, the block-hash
    /// convention.
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, chunk) in bytes.chunks_exact(8).enumerate() {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            limbs[i] = u64::from_le_bytes(buf);
        }
        Uint256(limbs)
    }

    /// Little-endian byte representation
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for i in 0..4 {
            out[8 * i..8 * (i + 1)].copy_from_slice(&self.0[i].to_le_bytes());
        }
        out
    }
}

impl Shl<u32> for Uint256 {
    type Output = Uint256;

    /// Bits shifted beyond the top of the 256-bit width are dropped.
    fn shl(self, shift: u32) -> Uint256 {
        let mut out = [0u64; 4];
        let limb_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in 0..4 {
            let src = self.0[i];
            if src == 0 {
                continue;
            }
            let dst = i + limb_shift;
            if dst < 4 {
                out[dst] |= src << bit_shift;
            }
            if bit_shift > 0 && dst + 1 < 4 {
                out[dst + 1] |= src >> (64 - bit_shift);
            }
        }

        Uint256(out)
    }
}

impl Shr<u32> for Uint256 {
    type Output = Uint256;

    /// Bits shifted below the bottom of the 256-bit width are dropped.
    fn shr(self, shift: u32) -> Uint256 {
        let mut out = [0u64; 4];
        let limb_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for dst in 0..4 {
            let src = dst + limb_shift;
            if src >= 4 {
                break;
            }
            out[dst] = self.0[src] >> bit_shift;
            if bit_shift > 0 && src + 1 < 4 {
                out[dst] |= self.0[src + 1] << (64 - bit_shift);
            }
        }

        Uint256(out)
    }
}

impl Add for Uint256 {
    type Output = Uint256;

    /// Saturates at `Uint256::MAX` instead of wrapping.
    fn add(self, rhs: Uint256) -> Uint256 {
        let mut out = [0u64; 4];
        let mut carry = 0u64;

        for i in 0..4 {
            let (sum, c1) = self.0[i].overflowing_add(rhs.0[i]);
            let (sum, c2) = sum.overflowing_add(carry);
            out[i] = sum;
            carry = u64::from(c1) + u64::from(c2);
        }

        if carry != 0 {
            Uint256::MAX
        } else {
            Uint256(out)
        }
    }
}

impl Sub for Uint256 {
    type Output = Uint256;

    /// Saturates at zero; callers order their operands first.
    fn sub(self, rhs: Uint256) -> Uint256 {
        if rhs > self {
            return Uint256::ZERO;
        }

        let mut out = [0u64; 4];
        let mut borrow = 0u64;

        for i in 0..4 {
            let (diff, b1) = self.0[i].overflowing_sub(rhs.0[i]);
            let (diff, b2) = diff.overflowing_sub(borrow);
            out[i] = diff;
            borrow = u64::from(b1) + u64::from(b2);
        }

        Uint256(out)
    }
}

impl Mul<u64> for Uint256 {
    type Output = Uint256;

    /// Saturates at `Uint256::MAX` instead of wrapping.
    fn mul(self, rhs: u64) -> Uint256 {
        let mut out = [0u64; 4];
        let mut carry = 0u128;

        for i in 0..4 {
            let product = u128::from(self.0[i]) * u128::from(rhs) + carry;
            out[i] = product as u64;
            carry = product >> 64;
        }

        if carry != 0 {
            Uint256::MAX
        } else {
            Uint256(out)
        }
    }
}

impl Div<u64> for Uint256 {
    type Output = Uint256;

    /// Panics on a zero divisor. All divisors in the retargeting code
    /// are products of positive consensus parameters, so a zero here is
    /// a programmer error.
    fn div(self, rhs: u64) -> Uint256 {
        assert!(rhs != 0, "division of a 256-bit target by zero");

        let mut out = [0u64; 4];
        let mut rem = 0u128;

        for i in (0..4).rev() {
            let cur = (rem << 64) | u128::from(self.0[i]);
            out[i] = (cur / u128::from(rhs)) as u64;
            rem = cur % u128::from(rhs);
        }

        Uint256(out)
    }
}

impl Ord for Uint256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..4).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Uint256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint256({})", self.to_hex())
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Uint256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Uint256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Uint256::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}
