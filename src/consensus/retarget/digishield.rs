//! DigiShield retarget
//!
//! A per-interval retarget with asymmetric bounds: difficulty may rise
//! by at most a third per interval (timespan floor of 75%) and fall by
//! at most a third (timespan ceiling of 150%).

use tracing::debug;

use crate::consensus::{BlockHeader, HeaderView, Params, Uint256};

pub(super) fn next_target<V: HeaderView>(last: V, _candidate: &BlockHeader, params: &Params) -> u32 {
    let retarget_timespan = params.pow_target_timespan;
    let retarget_interval = retarget_timespan / params.pow_target_spacing;

    // Only change once per interval
    if i64::from(last.height() + 1) % retarget_interval != 0 {
        return last.bits();
    }

    // Go back the full interval, one step fewer on the first retarget
    let mut blocks_to_go_back = retarget_interval - 1;
    if i64::from(last.height() + 1) != retarget_interval {
        blocks_to_go_back = retarget_interval;
    }

    let mut first = last;
    for _ in 0..blocks_to_go_back {
        first = first
            .prev()
            .expect("retarget window never extends past genesis");
    }

    let mut actual_timespan = last.time() - first.time();
    debug!("digishield retarget: timespan {} actual {}", retarget_timespan, actual_timespan);

    actual_timespan = actual_timespan
        .max(retarget_timespan - retarget_timespan / 4)
        .min(retarget_timespan + retarget_timespan / 2);

    let (target, _, _) = Uint256::from_compact(last.bits());
    let mut new_target = target * actual_timespan as u64 / retarget_timespan as u64;

    if new_target > params.pow_limit {
        new_target = params.pow_limit;
    }

    new_target.to_compact()
}
