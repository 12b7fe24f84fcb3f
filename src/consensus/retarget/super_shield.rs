//! Orbitcoin Super Shield retarget
//!
//! Retargets every block from two averaging windows of 5 and 20 blocks
//! with 0.25 damping and an oscillation limiter of +5% / -10%.

use crate::consensus::{HeaderView, Params, Uint256};

/// Short averaging window in blocks
const INTERVAL_SHORT: i64 = 5;

/// Long averaging window in blocks
const INTERVAL_LONG: i64 = 20;

pub(super) fn next_target<V: HeaderView>(last: V, params: &Params) -> u32 {
    let target_spacing = params.pow_target_spacing;
    let target_timespan = target_spacing * INTERVAL_LONG;

    // The short-window scan re-anchors on the tip's predecessor at every
    // step, so it never advances further back and the measured short
    // timespan is always zero; the floor clamp below supplies its value.
    // Kept exactly: changing it would fork the chain.
    let prev = last
        .prev()
        .expect("a retargeting tip has a predecessor");
    let index_short = prev;
    let mut actual_timespan_short = prev.time() - index_short.time();

    // The long averaging window continues from where the short one ended
    let mut index_long = index_short;
    for _ in 0..(INTERVAL_LONG - INTERVAL_SHORT) {
        match index_long.prev() {
            Some(stepped) => index_long = stepped,
            None => break,
        }
    }
    let mut actual_timespan_long = last.time() - index_long.time();

    // Time warp protection
    actual_timespan_short = actual_timespan_short
        .max(target_spacing * INTERVAL_SHORT / 2)
        .min(target_spacing * INTERVAL_SHORT * 2);
    actual_timespan_long = actual_timespan_long
        .max(target_spacing * INTERVAL_LONG / 2)
        .min(target_spacing * INTERVAL_LONG * 2);

    // The average of both windows
    let average =
        (actual_timespan_short * (INTERVAL_LONG / INTERVAL_SHORT) + actual_timespan_long) / 2;

    // 0.25 damping
    let mut actual_timespan = (average + 3 * target_timespan) / 4;

    // Oscillation limiters, +5% to -10%
    actual_timespan = actual_timespan
        .max(target_timespan * 100 / 105)
        .min(target_timespan * 110 / 100);

    let (target, _, _) = Uint256::from_compact(last.bits());
    let mut new_target = target * actual_timespan as u64 / target_timespan as u64;

    if new_target > params.pow_limit {
        new_target = params.pow_limit;
    }

    new_target.to_compact()
}
