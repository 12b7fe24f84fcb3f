//! KimotoGravityWell retarget
//!
//! Walks an adaptive window backwards from the tip, growing it until
//! the measured block rate drifts outside an event-horizon envelope
//! that tightens as the window grows.

use crate::consensus::{HeaderView, Params, Uint256};

pub(super) fn next_target<V: HeaderView>(last: V, params: &Params) -> u32 {
    let past_seconds_min = (params.pow_target_timespan as f64 * 0.025) as u64;
    let past_seconds_max = params.pow_target_timespan as u64 * 7;
    let past_blocks_min = past_seconds_min / params.pow_target_spacing as u64;
    let past_blocks_max = past_seconds_max / params.pow_target_spacing as u64;

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
            // ordered operands keep the saturating arithmetic exact
            average = (target - previous_average) / mass + previous_average;
        } else {
            average = previous_average - (previous_average - target) / mass;
        }
        previous_average = average;

        actual_seconds = (last.time() - reading.time()).max(0);
        target_seconds = params.pow_target_spacing * mass as i64;

        let mut rate_ratio = 1.0_f64;
        if actual_seconds != 0 && target_seconds != 0 {
            rate_ratio = target_seconds as f64 / actual_seconds as f64;
        }

        let horizon = 1.0 + 0.7084 * (mass as f64 / 28.2).powf(-1.228);
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

    let mut new_target = average;
    if actual_seconds != 0 && target_seconds != 0 {
        new_target = new_target * actual_seconds as u64;
        new_target = new_target / target_seconds as u64;
    }

    if new_target > params.pow_limit {
        new_target = params.pow_limit;
    }

    new_target.to_compact()
}
