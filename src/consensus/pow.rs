//! Proof-of-work validation
//!
//! Ties together the claimed compact target, the range the network
//! allows, and the block hash interpreted as a 256-bit integer.

use crate::consensus::{BlockHash, Params, Uint256};

/// Check that a block hash satisfies its claimed compact target.
///
/// Rejects targets that decode negative, zero, or overflowing, and
/// targets easier than the network's pow limit. The hash bytes are read
/// in the block-hash convention: byte 0 least significant.
pub fn check_proof_of_work(hash: &BlockHash, bits: u32, params: &Params) -> bool {
    let (target, negative, overflow) = Uint256::from_compact(bits);

    // Check range
    if negative || target.is_zero() || overflow || target > params.pow_limit {
        return false;
    }

    // Check proof of work matches claimed amount
    Uint256::from_le_bytes(hash.0) <= target
}

/// Human-readable difficulty for a compact target, relative to the
/// 0x1d00ffff baseline. Purely informational.
pub fn difficulty(bits: u32) -> f64 {
    let mut shift = (bits >> 24) & 0xff;
    let mut diff = f64::from(0x0000_ffff_u32) / f64::from(bits & 0x00ff_ffff);

    while shift < 29 {
        diff *= 256.0;
        shift += 1;
    }
    while shift > 29 {
        diff /= 256.0;
        shift -= 1;
    }

    diff
}
