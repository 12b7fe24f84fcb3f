//! Difficulty retargeting
//!
//! Six interchangeable retargeting algorithms behind one dispatcher.
//! The node picks an algorithm by configuration at startup; every block
//! then asks the dispatcher for the compact target its header must
//! satisfy.

mod classic;
mod dark_gravity;
mod digishield;
mod dual_kgw;
mod kimoto;
mod super_shield;

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::consensus::{difficulty, BlockHeader, HeaderView, Params, RetargetAlgorithm};
use crate::constants::WARM_UP_WINDOW;

/// One-shot announce flag; races only cost a duplicate log line
static HAVE_ANNOUNCED: AtomicBool = AtomicBool::new(false);

/// Compute the compact target the next block's header must satisfy.
///
/// `last` is the current tip of the header index and `candidate` the
/// header being assembled or validated on top of it (some algorithms
/// read its timestamp for stall exceptions). The first `WARM_UP_WINDOW`
/// blocks are mined at the pow limit regardless of the configured
/// algorithm.
pub fn next_work_required<V: HeaderView>(
    last: V,
    candidate: &BlockHeader,
    params: &Params,
    algorithm: RetargetAlgorithm,
) -> u32 {
    let next_height = last.height() + 1;
    if next_height < WARM_UP_WINDOW {
        return params.pow_limit.to_compact();
    }

    if !HAVE_ANNOUNCED.swap(true, Ordering::SeqCst) {
        info!("using {} retarget algorithm", algorithm);
    }

    let bits = match algorithm {
        RetargetAlgorithm::Classic => classic::next_target(last, candidate, params),
        RetargetAlgorithm::DarkGravityWave => dark_gravity::next_target(last, candidate, params),
        RetargetAlgorithm::KimotoGravityWell => kimoto::next_target(last, params),
        RetargetAlgorithm::DigiShield => digishield::next_target(last, candidate, params),
        RetargetAlgorithm::DualKgw3 => dual_kgw::next_target(last, candidate, params),
        RetargetAlgorithm::SuperShield => super_shield::next_target(last, params),
    };

    debug!("next block difficulty is {:.4} ({:08x})", difficulty(bits), bits);
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{BlockHash, HeaderChain, Uint256};

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
    fn test_warm_up_window_overrides_every_algorithm() {
        let params = Params::mainnet();
        let limit_bits = params.pow_limit.to_compact();

        // tip at height 98: the next block is 99, still warming up
        let chain = chain_with_spacing(99, 150, 0x1c00ffff);
        let last = chain.tip().unwrap();
        let candidate = candidate_after(last, 150);

        for algorithm in RetargetAlgorithm::ALL {
            assert_eq!(
                next_work_required(last, &candidate, &params, algorithm),
                limit_bits,
                "warm-up must win for {algorithm}",
            );
        }
    }

    #[test]
    fn test_first_retargeted_height_leaves_warm_up() {
        let params = Params::mainnet();
        let limit_bits = params.pow_limit.to_compact();

        // tip at height 99: the next block is 100, warm-up is over
        let chain = chain_with_spacing(100, 150, 0x1c00ffff);
        let last = chain.tip().unwrap();
        let candidate = candidate_after(last, 150);

        // a perfectly paced classic interval keeps the tip bits, which
        // differ from the limit, proving the guard no longer fires
        let bits = next_work_required(last, &candidate, &params, RetargetAlgorithm::Classic);
        assert_ne!(bits, limit_bits);
        assert_eq!(bits, 0x1c00ffff);
    }

    #[test]
    fn test_dispatch_routes_by_selector() {
        let params = Params::mainnet();
        let chain = chain_with_spacing(200, 150, 0x1c00ffff);
        let last = chain.tip().unwrap();
        let candidate = candidate_after(last, 150);

        assert_eq!(
            next_work_required(last, &candidate, &params, RetargetAlgorithm::Classic),
            classic::next_target(last, &candidate, &params)
        );
        assert_eq!(
            next_work_required(last, &candidate, &params, RetargetAlgorithm::DarkGravityWave),
            dark_gravity::next_target(last, &candidate, &params)
        );
        assert_eq!(
            next_work_required(last, &candidate, &params, RetargetAlgorithm::KimotoGravityWell),
            kimoto::next_target(last, &params)
        );
        assert_eq!(
            next_work_required(last, &candidate, &params, RetargetAlgorithm::DigiShield),
            digishield::next_target(last, &candidate, &params)
        );
        assert_eq!(
            next_work_required(last, &candidate, &params, RetargetAlgorithm::DualKgw3),
            dual_kgw::next_target(last, &candidate, &params)
        );
        assert_eq!(
            next_work_required(last, &candidate, &params, RetargetAlgorithm::SuperShield),
            super_shield::next_target(last, &params)
        );
    }

    #[test]
    fn test_every_algorithm_stays_within_limit() {
        let params = Params::mainnet();

        // a hostile mix of timestamps at the easiest possible target
        let limit_bits = params.pow_limit.to_compact();
        let mut chain = HeaderChain::with_genesis(1_700_000_000, limit_bits);
        for i in 1..300 {
            let jitter = if i % 3 == 0 { 3600 } else { 1 };
            chain.push(1_700_000_000 + i * jitter, limit_bits);
        }
        let last = chain.tip().unwrap();
        let candidate = candidate_after(last, 150);

        for algorithm in RetargetAlgorithm::ALL {
            let bits = next_work_required(last, &candidate, &params, algorithm);
            let (target, negative, overflow) = Uint256::from_compact(bits);
            assert!(!negative && !overflow, "{algorithm} returned bad bits");
            assert!(target <= params.pow_limit, "{algorithm} exceeded the limit");
            assert!(!target.is_zero(), "{algorithm} returned a zero target");
        }
    }
}
