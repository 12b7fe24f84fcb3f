//! Dual-KGW3 retarget
//!
//! Averages a KimotoGravityWell pass over a day-bounded window with a
//! single-step classical retarget, then applies a fast-block damp and a
//! twelve-hour stall break.

use crate::consensus::{BlockHeader, HeaderView, Params, Uint256};

/// Seconds in a day; the KGW window is fixed to it rather than to the
/// configured timespan
const DAY_SECONDS: i64 = 60 * 60 * 24;

/// A block arriving this long after the tip resets to minimum difficulty
const LONG_TIME_LIMIT: i64 = 12 * 60 * 60;

pub(super) fn next_target<V: HeaderView>(last: V, candidate: &BlockHeader, params: &Params) -> u32 {
    let block_time = params.pow_target_spacing;
    let past_seconds_min = (DAY_SECONDS as f64 * 0.025) as u64;
    let past_seconds_max = (DAY_SECONDS * 7) as u64;
    let past_blocks_min = past_seconds_min / block_time as u64;
    let past_blocks_max = past_seconds_max / block_time as u64;

    if last.height() == 0 || u64::from(last.height()) < past_blocks_min {
        return params.pow_limit.to_compact();
    }

    let mut reading = last;
    let mut mass: u64 = 0;
    let mut actual_seconds: i64 = 0;
    let mut target_seconds: i64 = 0;
    let mut average = Uint256::ZERO;
    let mut previous_average = Uint256::ZERO;

    loop {
        if reading.height() == 0 {
            break;
        }
        if past_blocks_max > 0 && mass >= past_blocks_max {
            break;
        }
        mass += 1;

        let (target, _, _) = Uint256::from_compact(reading.bits());
        if mass == 1 {
            average = target;
        } else if target >= previous_average {
            average = (target - previous_average) / mass + previous_average;
        } else {
            average = previous_average - (previous_average - target) / mass;
        }
        previous_average = average;

        actual_seconds = (last.time() - reading.time()).max(0);
        target_seconds = block_time * mass as i64;

        let mut rate_ratio = 1.0_f64;
        if actual_seconds != 0 && target_seconds != 0 {
            rate_ratio = target_seconds as f64 / actual_seconds as f64;
        }

        let horizon = 1.0 + 0.7084 * (mass as f64 / 72.0).powf(-1.228);
        let horizon_fast = horizon;
        let horizon_slow = 1.0 / horizon;

        if mass >= past_blocks_min && (rate_ratio <= horizon_slow || rate_ratio >= horizon_fast) {
            break;
        }

        match reading.prev() {
            Some(prev) => reading = prev,
            None => break,
        }
    }

    // the gravity-well half
    let mut kgw_first = average;
    if actual_seconds != 0 && target_seconds != 0 {
        kgw_first = kgw_first * actual_seconds as u64;
        kgw_first = kgw_first / target_seconds as u64;
    }

    // the classical half over the single last step
    let (mut kgw_second, _, _) = Uint256::from_compact(last.bits());
    let prev = last
        .prev()
        .expect("a tip above the window floor has a predecessor");
    let short_delta = last.time() - prev.time();

    let mut bounded_delta = short_delta;
    if bounded_delta < 0 {
        bounded_delta = block_time;
    }
    bounded_delta = bounded_delta.max(block_time / 3).min(block_time * 3);

    kgw_second = kgw_second * bounded_delta as u64;
    kgw_second = kgw_second / block_time as u64;

    let mut new_target = (kgw_second + kgw_first) / 2;

    // a solve under a sixth of the block time tightens a further 15%,
    // keyed on the raw delta before any bounding
    if short_delta < block_time / 6 {
        new_target = new_target * 85 / 100;
    }

    // stall break: reset to minimum difficulty after twelve hours
    if candidate.time - last.time() > LONG_TIME_LIMIT {
        new_target = params.pow_limit;
    }

    if new_target > params.pow_limit {
        new_target = params.pow_limit;
    }

    new_target.to_compact()
}
