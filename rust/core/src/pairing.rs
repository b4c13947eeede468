// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segmented width detection
//!
//! Elevations often dimension each door rather than the whole cabinet:
//! `600 | 600` instead of `1200`. Two near-equal segment tokens whose sum
//! is a plausible cabinet width are reported as a candidate total.

use crate::types::{format_mm, MmRange, NumericToken, SegmentPairing};

/// Maximum difference between the two segments of a pair
pub const SEGMENT_TOLERANCE: f64 = 50.0;
/// Accepted range for the summed width
pub const SEGMENT_SUM_RANGE: MmRange = MmRange::new(900.0, 1800.0);

/// Find every unordered pair of segment tokens that could form the width.
///
/// Quadratic in the bucket size, which is tens of tokens at most.
/// Overlapping pairs are all reported; nothing is deduplicated.
pub fn detect_segment_pairings(segments: &[NumericToken]) -> Vec<SegmentPairing> {
    let mut pairings = Vec::new();

    for (i, a) in segments.iter().enumerate() {
        for b in &segments[i + 1..] {
            if (a.value - b.value).abs() > SEGMENT_TOLERANCE {
                continue;
            }
            let sum = a.value + b.value;
            if !SEGMENT_SUM_RANGE.contains(sum) {
                continue;
            }
            pairings.push(SegmentPairing {
                first: a.clone(),
                second: b.clone(),
                sum,
                description: format!(
                    "{}+{}={}",
                    format_mm(a.value),
                    format_mm(b.value),
                    format_mm(sum)
                ),
            });
        }
    }

    if !pairings.is_empty() {
        tracing::debug!(count = pairings.len(), "Detected segmented widths");
    }
    pairings
}

/// Whether `width` matches any pairing sum within the segment tolerance
pub fn matches_any_pairing(width: f64, pairings: &[SegmentPairing]) -> bool {
    pairings
        .iter()
        .any(|p| (p.sum - width).abs() <= SEGMENT_TOLERANCE)
}
