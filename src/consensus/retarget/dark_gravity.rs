//! DarkGravityWave v3 retarget
//!
//! Retargets every block from a rolling 24-block window, weighting the
//! window with a cumulative running combination of past targets.

use crate::consensus::{BlockHeader, HeaderView, Params, Uint256};

/// Window length in blocks
const PAST_BLOCKS: u32 = 24;

pub(super) fn next_target<V: HeaderView>(last: V, candidate: &BlockHeader, params: &Params) -> u32 {
    let pow_limit_compact = params.pow_limit.to_compact();

    // the window needs PAST_BLOCKS + 1 headers behind the tip
    if last.height() < PAST_BLOCKS {
        return pow_limit_compact;
    }

    if params.allow_min_difficulty_blocks {
        // recent block is more than 2 hours old
        if candidate.time > last.time() + 2 * 60 * 60 {
            return pow_limit_compact;
        }
        // recent block is more than 4 spacings old
        if candidate.time > last.time() + params.pow_target_spacing * 4 {
            let (target, _, _) = Uint256::from_compact(last.bits());
            let mut eased = target * 10;
            if eased > params.pow_limit {
                eased = params.pow_limit;
            }
            return eased.to_compact();
        }
    }

    let mut index = last;
    let mut average = Uint256::ZERO;

    for count in 1..=PAST_BLOCKS {
        let (target, _, _) = Uint256::from_compact(index.bits());
        if count == 1 {
            average = target;
        } else {
            // not a true mean; the cumulative form is consensus
            average = (average * u64::from(count) + target) / u64::from(count + 1);
        }

        if count != PAST_BLOCKS {
            index = index
                .prev()
                .expect("window height was checked against the tip");
        }
    }
    let first = index;

    let target_timespan = i64::from(PAST_BLOCKS) * params.pow_target_spacing;
    let actual_timespan = (last.time() - first.time())
        .max(target_timespan / 3)
        .min(target_timespan * 3);

    let mut new_target = average * actual_timespan as u64 / target_timespan as u64;
    if new_target > params.pow_limit {
        new_target = params.pow_limit;
    }

    new_target.to_compact()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{BlockHash, HeaderChain};

    fn chain_with_spacing(blocks: usize, spacing: i64, bits: u32) -> HeaderChain {
        let mut chain = HeaderChain::with_genesis(1_700_000_000, bits);
        for i in 1..blocks {
            chain.push(1_700_000_000 + i as i64 * spacing, bits);
        }
        chain
    }

    fn candidate_after<V: HeaderView>(last: V, delta: i64) -> BlockHeader {
        BlockHeader::new(1, BlockHash::ZERO, BlockHash::ZERO, last.time() + delta, 0, 0)
    }

    #[test]
    fn test_short_chain_returns_limit() {
        let params = Params::mainnet();
        let chain = chain_with_spacing(24, 150, 0x1e00ffff);
        let last = chain.tip().unwrap();
        assert_eq!(last.height(), 23);

        let candidate = candidate_after(last, 150);
        assert_eq!(next_target(last, &candidate, &params), params.pow_limit.to_compact());
    }

    #[test]
    fn test_uniform_window_scales_by_elapsed_time() {
        let params = Params::mainnet();
        let chain = chain_with_spacing(100, 150, 0x1e00ffff);
        let last = chain.tip().unwrap();

        let candidate = candidate_after(last, 150);
        let bits = next_target(last, &candidate, &params);

        // 24 equal targets keep the running combination exact; the window
        // spans 23 spacings against a 24-spacing denominator
        let (target, _, _) = Uint256::from_compact(0x1e00ffff);
        let expected = target * (23 * 150) / (24 * 150);
        assert_eq!(bits, expected.to_compact());
    }

    #[test]
    fn test_slow_window_eases_target() {
        let params = Params::mainnet();
        // double spacing: the window took twice as long as it should
        let chain = chain_with_spacing(100, 300, 0x1c00ffff);
        let last = chain.tip().unwrap();

        let candidate = candidate_after(last, 300);
        let bits = next_target(last, &candidate, &params);

        let (target, _, _) = Uint256::from_compact(0x1c00ffff);
        let expected = target * (23 * 300) / (24 * 150);
        assert_eq!(bits, expected.to_compact());

        let (new_target, _, _) = Uint256::from_compact(bits);
        assert!(new_target > target);
    }

    #[test]
    fn test_fast_window_clamps_at_third() {
        let params = Params::mainnet();
        // one-second blocks: far below the timespan/3 floor
        let chain = chain_with_spacing(100, 1, 0x1c00ffff);
        let last = chain.tip().unwrap();

        let candidate = candidate_after(last, 1);
        let bits = next_target(last, &candidate, &params);

        let (target, _, _) = Uint256::from_compact(0x1c00ffff);
        let timespan = 24 * 150u64;
        let expected = target * (timespan / 3) / timespan;
        assert_eq!(bits, expected.to_compact());
    }

    #[test]
    fn test_min_difficulty_after_two_hours() {
        let mut params = Params::mainnet();
        params.allow_min_difficulty_blocks = true;
        let chain = chain_with_spacing(100, 150, 0x1c00ffff);
        let last = chain.tip().unwrap();

        let candidate = candidate_after(last, 2 * 60 * 60 + 1);
        assert_eq!(next_target(last, &candidate, &params), params.pow_limit.to_compact());
    }

    #[test]
    fn test_min_difficulty_tenfold_ease() {
        let mut params = Params::mainnet();
        params.allow_min_difficulty_blocks = true;
        let chain = chain_with_spacing(100, 150, 0x1c00ffff);
        let last = chain.tip().unwrap();

        // between 4 spacings and 2 hours late: ease tenfold
        let candidate = candidate_after(last, 4 * 150 + 1);
        let bits = next_target(last, &candidate, &params);

        let (target, _, _) = Uint256::from_compact(0x1c00ffff);
        assert_eq!(bits, (target * 10).to_compact());
    }

    #[test]
    fn test_min_difficulty_ease_clamped_to_limit() {
        let mut params = Params::mainnet();
        params.allow_min_difficulty_blocks = true;
        let limit_bits = params.pow_limit.to_compact();
        let chain = chain_with_spacing(100, 150, limit_bits);
        let last = chain.tip().unwrap();

        let candidate = candidate_after(last, 4 * 150 + 1);
        assert_eq!(next_target(last, &candidate, &params), limit_bits);
    }

    #[test]
    fn test_result_never_exceeds_limit() {
        let params = Params::mainnet();
        let limit_bits = params.pow_limit.to_compact();
        // very slow blocks at the limit target still clamp
        let chain = chain_with_spacing(100, 3600, limit_bits);
        let last = chain.tip().unwrap();

        let candidate = candidate_after(last, 3600);
        assert_eq!(next_target(last, &candidate, &params), limit_bits);
    }
}
