//! Classical per-interval retarget
//!
//! Difficulty moves once per adjustment interval, scaled by the wall
//! clock the interval actually took, clamped to a quarter or four times
//! the target timespan.

use crate::consensus::{BlockHeader, HeaderView, Params, Uint256};

pub(super) fn next_target<V: HeaderView>(last: V, candidate: &BlockHeader, params: &Params) -> u32 {
    let pow_limit_compact = params.pow_limit.to_compact();
    let interval = params.difficulty_adjustment_interval();

    // Only change once per difficulty adjustment interval
    if i64::from(last.height() + 1) % interval != 0 {
        if params.allow_min_difficulty_blocks {
            // A block arriving more than twice the spacing late may be
            // mined at minimum difficulty.
            if candidate.time > last.time() + params.pow_target_spacing * 2 {
                return pow_limit_compact;
            }
            // Otherwise inherit the last target that was not one of
            // those minimum-difficulty specials.
            let mut index = last;
            while let Some(prev) = index.prev() {
                if i64::from(index.height()) % interval == 0 || index.bits() != pow_limit_compact {
                    break;
                }
                index = prev;
            }
            return index.bits();
        }
        return last.bits();
    }

    // Walk the full interval back, except on the first retarget after
    // genesis where one fewer step lands exactly on the genesis header.
    let mut blocks_to_go_back = interval - 1;
    if i64::from(last.height() + 1) != interval {
        blocks_to_go_back = interval;
    }

    let mut first = last;
    for _ in 0..blocks_to_go_back {
        first = first
            .prev()
            .expect("retarget window never extends past genesis");
    }

    retarget(last, first.time(), params)
}

/// The adjustment step, split out so a first-block timestamp can be fed
/// directly.
pub(super) fn retarget<V: HeaderView>(last: V, first_time: i64, params: &Params) -> u32 {
    if params.no_retargeting {
        return last.bits();
    }

    // Limit adjustment step
    let actual_timespan = (last.time() - first_time)
        .max(params.pow_target_timespan / 4)
        .min(params.pow_target_timespan * 4);

    let (mut new_target, _, _) = Uint256::from_compact(last.bits());

    // The intermediate product can overflow by one bit when the target
    // sits at the top of the range; shift through the multiplication.
    let shift = new_target.bits() > params.pow_limit.bits() - 1;
    if shift {
        new_target = new_target >> 1;
    }
    new_target = new_target * actual_timespan as u64;
    new_target = new_target / params.pow_target_timespan as u64;
    if shift {
        new_target = new_target << 1;
    }

    if new_target > params.pow_limit {
        new_target = params.pow_limit;
    }

    new_target.to_compact()
}
