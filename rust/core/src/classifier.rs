// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Number classification into dimension buckets

use crate::types::{DimensionCandidateSet, MmRange, NumericToken};

pub const WIDTH_RANGE: MmRange = MmRange::new(800.0, 2000.0);
pub const HEIGHT_RANGE: MmRange = MmRange::new(400.0, 900.0);
pub const DEPTH_RANGE: MmRange = MmRange::new(250.0, 500.0);
pub const SEGMENT_RANGE: MmRange = MmRange::new(400.0, 800.0);
/// Above this a number is a room dimension
pub const LARGE_NUMBER_THRESHOLD: f64 = 2500.0;
/// Below this a number is hardware or a board thickness
pub const SMALL_NUMBER_THRESHOLD: f64 = 200.0;

pub fn is_large(value: f64) -> bool {
    value > LARGE_NUMBER_THRESHOLD
}

pub fn is_small(value: f64) -> bool {
    value < SMALL_NUMBER_THRESHOLD
}

/// Whether a token may stand for a cabinet dimension at all
pub fn is_cabinet_scale(value: f64) -> bool {
    !is_large(value) && !is_small(value)
}

/// Bucket tokens by the dimension they could describe.
///
/// Pure function of the input; a token lands in every bucket whose
/// range contains it.
pub fn classify_tokens(tokens: &[NumericToken]) -> DimensionCandidateSet {
    let pick = |pred: &dyn Fn(f64) -> bool| -> Vec<NumericToken> {
        tokens.iter().filter(|t| pred(t.value)).cloned().collect()
    };

    let set = DimensionCandidateSet {
        width_candidates: pick(&|v| WIDTH_RANGE.contains(v)),
        height_candidates: pick(&|v| HEIGHT_RANGE.contains(v)),
        depth_candidates: pick(&|v| DEPTH_RANGE.contains(v)),
        segment_candidates: pick(&|v| SEGMENT_RANGE.contains(v)),
        large_numbers: pick(&is_large),
        small_numbers: pick(&is_small),
        all_numbers: tokens.to_vec(),
    };

    tracing::debug!(
        total = tokens.len(),
        width = set.width_candidates.len(),
        height = set.height_candidates.len(),
        depth = set.depth_candidates.len(),
        segment = set.segment_candidates.len(),
        large = set.large_numbers.len(),
        small = set.small_numbers.len(),
        "Classified numeric tokens"
    );

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[f64]) -> Vec<NumericToken> {
        values.iter().copied().map(NumericToken::new).collect()
    }

    fn vals(bucket: &[NumericToken]) -> Vec<f64> {
        bucket.iter().map(|t| t.value).collect()
    }

    #[test]
    fn test_bucket_membership_table() {
        // value, width, height, depth, segment, large, small
        let table: &[(f64, [bool; 6])] = &[
            (199.0, [false, false, false, false, false, true]),
            (200.0, [false, false, false, false, false, false]),
            (249.0, [false, false, false, false, false, false]),
            (250.0, [false, false, true, false, false, false]),
            (399.0, [false, false, true, false, false, false]),
            (400.0, [false, true, true, true, false, false]),
            (500.0, [false, true, true, true, false, false]),
            (501.0, [false, true, false, true, false, false]),
            (799.0, [false, true, false, true, false, false]),
            (800.0, [true, true, false, true, false, false]),
            (801.0, [true, true, false, false, false, false]),
            (900.0, [true, true, false, false, false, false]),
            (901.0, [true, false, false, false, false, false]),
            (2000.0, [true, false, false, false, false, false]),
            (2001.0, [false, false, false, false, false, false]),
            (2500.0, [false, false, false, false, false, false]),
            (2501.0, [false, false, false, false, true, false]),
        ];

        for (value, expected) in table {
            let set = classify_tokens(&tokens(&[*value]));
            let got = [
                !set.width_candidates.is_empty(),
                !set.height_candidates.is_empty(),
                !set.depth_candidates.is_empty(),
                !set.segment_candidates.is_empty(),
                !set.large_numbers.is_empty(),
                !set.small_numbers.is_empty(),
            ];
            assert_eq!(&got, expected, "bucket membership for {}", value);
        }
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let input = tokens(&[600.0, 3795.0, 600.0, 18.0, 1200.0, 340.0]);
        let set = classify_tokens(&input);

        assert_eq!(vals(&set.segment_candidates), vec![600.0, 600.0]);
        assert_eq!(vals(&set.width_candidates), vec![1200.0]);
        assert_eq!(vals(&set.depth_candidates), vec![340.0]);
        assert_eq!(vals(&set.large_numbers), vec![3795.0]);
        assert_eq!(vals(&set.small_numbers), vec![18.0]);
        assert_eq!(set.all_numbers, input);
    }

    #[test]
    fn test_empty_input() {
        let set = classify_tokens(&[]);
        assert_eq!(set, DimensionCandidateSet::default());
    }
}
