//! # Sync Planning
//!
//! Which heights a backfill or a poller tick should fetch.

use std::ops::RangeInclusive;

use super::alignment::align_down;
use crate::domain::SamplingRule;

/// Backfill candidates for `rule`, descending from the aligned head.
///
/// Steps back by `stride` until `count` heights are collected, a candidate
/// would be 0, or it would fall below a non-zero anchor height.
pub fn backfill_targets(head: u64, rule: &SamplingRule, count: usize) -> Vec<u64> {
    let Some(start) = align_down(head, rule) else {
        return Vec::new();
    };
    let step = rule.stride.max(1);
    let floor = rule.anchor_height;

    let mut targets = Vec::with_capacity(count);
    let mut next = Some(start);
    while targets.len() < count {
        match next {
            Some(height) if height > 0 && height >= floor => {
                targets.push(height);
                next = height.checked_sub(step);
            }
            _ => break,
        }
    }
    targets
}

/// New heights above `max_height` up to `head`, ascending.
///
/// Heights that could not survive eviction are left out, so the range never
/// spans more than `capacity` heights.
pub fn gap_range(max_height: u64, head: u64, capacity: usize) -> Option<RangeInclusive<u64>> {
    if head <= max_height {
        return None;
    }
    let window = (capacity.max(1) as u64).saturating_sub(1);
    let start = (max_height + 1).max(head.saturating_sub(window));
    Some(start..=head)
}
