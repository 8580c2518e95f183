//! # Alignment Filter
//!
//! Stride/anchor predicate selecting which heights a rule shows.

use crate::domain::{BlockRecord, SamplingRule};

/// Whether `height` qualifies under `rule`.
///
/// - stride <= 1: every height
/// - anchor > 0: `height >= anchor` and `(height - anchor) % stride == 0`
/// - otherwise: `height % stride == 0`
pub fn is_aligned(height: u64, rule: &SamplingRule) -> bool {
    if rule.stride <= 1 {
        return true;
    }
    if rule.anchor_height > 0 {
        return height >= rule.anchor_height && (height - rule.anchor_height) % rule.stride == 0;
    }
    height % rule.stride == 0
}

/// Highest aligned height at or below `head`, `None` if no height qualifies.
pub fn align_down(head: u64, rule: &SamplingRule) -> Option<u64> {
    if rule.stride <= 1 {
        return Some(head);
    }
    if rule.anchor_height > 0 {
        if head < rule.anchor_height {
            return None;
        }
        let steps = (head - rule.anchor_height) / rule.stride;
        return Some(rule.anchor_height + steps * rule.stride);
    }
    Some(head / rule.stride * rule.stride)
}

/// Records of `blocks` aligned to `rule`, order preserved.
pub fn sample_view(blocks: &[BlockRecord], rule: &SamplingRule) -> Vec<BlockRecord> {
    blocks
        .iter()
        .filter(|block| is_aligned(block.height, rule))
        .cloned()
        .collect()
}
