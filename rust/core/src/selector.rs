// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dimension selection
//!
//! Two strategies resolve one width/height/depth per run:
//!
//! - **Delegated**: the reasoning collaborator's reply is range-checked
//!   and reconciled with the detected segment sums.
//! - **Local heuristic**: the largest cabinet-scale tokens become width
//!   and height, with a depth candidate or a 600mm default. Crude, and
//!   reported as low confidence.
//!
//! Both end in [`CabinetDimensions::validate`]; an invalid triple aborts
//! the run.

use serde::{Deserialize, Serialize};

use crate::classifier::is_cabinet_scale;
use crate::error::{AnalysisError, Result};
use crate::formula::CabinetFeatures;
use crate::pairing::matches_any_pairing;
use crate::reasoning::ReasoningReply;
use crate::types::{
    format_mm, CabinetDimensions, DimensionCandidateSet, DimensionLimits, OffsetConfiguration,
    SegmentPairing,
};

/// Depth used by the local heuristic when no depth candidate exists
pub const DEFAULT_DEPTH: f64 = 600.0;

/// How dimensions are chosen
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    #[default]
    Delegated,
    LocalHeuristic,
}

/// Which width wins when the collaborator and the segment sums disagree
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WidthTieBreak {
    #[default]
    PreferSegmentSum,
    PreferCollaborator,
}

/// Where the final width came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WidthSource {
    Collaborator,
    SegmentSum,
    SingleToken,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Low,
}

/// Resolved cabinet plus how it was resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub dimensions: CabinetDimensions,
    pub features: CabinetFeatures,
    pub width_source: WidthSource,
    pub confidence: Confidence,
}

fn closest_pairing_sum(width: f64, pairings: &[SegmentPairing]) -> Option<f64> {
    pairings
        .iter()
        .map(|p| p.sum)
        .min_by(|a, b| (a - width).abs().total_cmp(&(b - width).abs()))
}

fn largest_pairing_sum(pairings: &[SegmentPairing]) -> Option<f64> {
    pairings.iter().map(|p| p.sum).max_by(f64::total_cmp)
}

fn reject_out_of_scale(name: &str, value: f64) -> Result<()> {
    if is_cabinet_scale(value) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidDimensions(format!(
            "{} {} is not a cabinet-scale value",
            name,
            format_mm(value)
        )))
    }
}

/// Resolve dimensions from the reasoning collaborator's reply
pub fn select_delegated(
    reply: &ReasoningReply,
    pairings: &[SegmentPairing],
    offsets: &OffsetConfiguration,
    limits: &DimensionLimits,
    tie_break: WidthTieBreak,
) -> Result<Selection> {
    let reported = reply.reported_dimensions()?;
    let deduction = offsets.height_deduction();

    // Only total height matters; the collaborator's working height is
    // used solely to recover a missing total.
    let total_height = match (reported.total_height, reported.working_height) {
        (Some(total), _) => total,
        (None, Some(working)) => working + deduction,
        (None, None) => {
            return Err(AnalysisError::MalformedResponse("missing cabinet height".into()))
        }
    };

    reject_out_of_scale("height", total_height)?;
    reject_out_of_scale("depth", reported.depth)?;

    let (width, width_source) = match tie_break {
        WidthTieBreak::PreferSegmentSum if !matches_any_pairing(reported.width, pairings) => {
            match closest_pairing_sum(reported.width, pairings) {
                Some(sum) => {
                    tracing::info!(
                        reported = reported.width,
                        segment_sum = sum,
                        "Replacing collaborator width with segment sum"
                    );
                    (sum, WidthSource::SegmentSum)
                }
                None => (reported.width, WidthSource::Collaborator),
            }
        }
        _ => (reported.width, WidthSource::Collaborator),
    };
    if width_source == WidthSource::Collaborator {
        reject_out_of_scale("width", width)?;
    }

    let dimensions = CabinetDimensions::from_total_height(width, total_height, reported.depth, offsets);
    dimensions.validate(limits)?;

    let features = reply
        .features()?
        .unwrap_or_else(|| CabinetFeatures::estimate(&dimensions));

    Ok(Selection {
        dimensions,
        features,
        width_source,
        confidence: Confidence::High,
    })
}

/// Resolve dimensions from the classified tokens alone
pub fn select_local(
    candidates: &DimensionCandidateSet,
    pairings: &[SegmentPairing],
    offsets: &OffsetConfiguration,
    limits: &DimensionLimits,
    tie_break: WidthTieBreak,
) -> Result<Selection> {
    // Distinct cabinet-scale values, largest first. Room sizes and
    // hardware spacings never qualify.
    let mut singles: Vec<f64> = candidates
        .all_numbers
        .iter()
        .map(|t| t.value)
        .filter(|v| is_cabinet_scale(*v))
        .collect();
    singles.sort_by(|a, b| b.total_cmp(a));
    singles.dedup();

    let segment_sum = match tie_break {
        WidthTieBreak::PreferSegmentSum => largest_pairing_sum(pairings),
        WidthTieBreak::PreferCollaborator => None,
    };

    let (width, total_height, width_source) = match segment_sum {
        Some(sum) => {
            let height = singles.iter().copied().find(|v| *v != sum).ok_or(
                AnalysisError::InsufficientSignal {
                    found: singles.len(),
                    required: 1,
                },
            )?;
            (sum, height, WidthSource::SegmentSum)
        }
        None => match singles.as_slice() {
            [width, height, ..] => (*width, *height, WidthSource::SingleToken),
            _ => {
                return Err(AnalysisError::InsufficientSignal {
                    found: singles.len(),
                    required: 2,
                })
            }
        },
    };

    let depth = candidates
        .depth_candidates
        .iter()
        .map(|t| t.value)
        .filter(|v| *v != width && *v != total_height)
        .max_by(f64::total_cmp)
        .unwrap_or(DEFAULT_DEPTH);

    let dimensions = CabinetDimensions::from_total_height(width, total_height, depth, offsets);
    tracing::warn!(
        width,
        total_height,
        depth,
        "Using local heuristic dimensions (low confidence)"
    );
    dimensions.validate(limits)?;

    Ok(Selection {
        features: CabinetFeatures::estimate(&dimensions),
        dimensions,
        width_source,
        confidence: Confidence::Low,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify_tokens;
    use crate::pairing::detect_segment_pairings;
    use crate::reasoning::parse_reasoning_reply;
    use crate::types::{AnalysisStatus, NumericToken};

    fn candidates(values: &[f64]) -> DimensionCandidateSet {
        let tokens: Vec<NumericToken> = values.iter().copied().map(NumericToken::new).collect();
        classify_tokens(&tokens)
    }

    fn reply(json: &str) -> ReasoningReply {
        parse_reasoning_reply(json).unwrap()
    }

    #[test]
    fn test_delegated_canonical() {
        let r = reply(r#"{"cabinet_width": 1200, "cabinet_total_height": 675, "cabinet_working_height": 999, "cabinet_depth": 340}"#);
        let selection = select_delegated(
            &r,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        )
        .unwrap();

        let dims = selection.dimensions;
        assert_eq!((dims.width, dims.total_height, dims.depth), (1200.0, 675.0, 340.0));
        // Recomputed, not taken from the reply
        assert_eq!(dims.working_height, 550.0);
        assert_eq!(selection.width_source, WidthSource::Collaborator);
        assert_eq!(selection.confidence, Confidence::High);
    }

    #[test]
    fn test_delegated_working_height_only() {
        let r = reply(r#"{"cabinet_width": 900, "cabinet_working_height": 595, "cabinet_depth": 560}"#);
        let selection = select_delegated(
            &r,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        )
        .unwrap();
        assert_eq!(selection.dimensions.total_height, 720.0);
        assert_eq!(selection.dimensions.working_height, 595.0);
    }

    #[test]
    fn test_delegated_rejects_runaway_door_count() {
        let r = reply(
            r#"{"cabinet_width": 1200, "cabinet_total_height": 720, "cabinet_depth": 560,
                "component_analysis": {"doors_count": 4000000000}}"#,
        );
        let err = select_delegated(
            &r,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse(_)));
        assert_eq!(err.status(), AnalysisStatus::MalformedCollaboratorResponse);
    }

    #[test]
    fn test_delegated_rejects_room_dimension() {
        let r = reply(r#"{"cabinet_width": 3795, "cabinet_total_height": 720, "cabinet_depth": 560}"#);
        let err = select_delegated(
            &r,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDimensions(_)));
    }

    #[test]
    fn test_delegated_out_of_range_height() {
        let r = reply(r#"{"cabinet_width": 1200, "cabinet_total_height": 901, "cabinet_depth": 560}"#);
        let result = select_delegated(
            &r,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        );
        assert!(matches!(result, Err(AnalysisError::InvalidDimensions(_))));

        let tall = select_delegated(
            &r,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::tall(),
            WidthTieBreak::default(),
        );
        assert!(tall.is_ok());
    }

    #[test]
    fn test_segment_sum_overrides_collaborator() {
        let set = candidates(&[600.0, 600.0, 720.0, 340.0]);
        let pairings = detect_segment_pairings(&set.segment_candidates);
        let r = reply(r#"{"cabinet_width": 600, "cabinet_total_height": 720, "cabinet_depth": 560}"#);

        let preferred = select_delegated(
            &r,
            &pairings,
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::PreferSegmentSum,
        )
        .unwrap();
        assert_eq!(preferred.dimensions.width, 1200.0);
        assert_eq!(preferred.width_source, WidthSource::SegmentSum);

        let kept = select_delegated(
            &r,
            &pairings,
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::PreferCollaborator,
        )
        .unwrap();
        assert_eq!(kept.dimensions.width, 600.0);
        assert_eq!(kept.width_source, WidthSource::Collaborator);
    }

    #[test]
    fn test_collaborator_width_matching_sum_kept() {
        let set = candidates(&[600.0, 590.0, 720.0]);
        let pairings = detect_segment_pairings(&set.segment_candidates);
        let r = reply(r#"{"cabinet_width": 1200, "cabinet_total_height": 720, "cabinet_depth": 560}"#);
        let selection = select_delegated(
            &r,
            &pairings,
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::PreferSegmentSum,
        )
        .unwrap();
        // 1190 is within tolerance of 1200
        assert_eq!(selection.dimensions.width, 1200.0);
        assert_eq!(selection.width_source, WidthSource::Collaborator);
    }

    #[test]
    fn test_delegated_features_from_reply() {
        let r = reply(
            r#"{"cabinet_width": 1200, "cabinet_total_height": 720, "cabinet_depth": 560,
                "component_analysis": {"doors_count": 2, "drawers_count": 0, "shelves_count": 1}}"#,
        );
        let selection = select_delegated(
            &r,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        )
        .unwrap();
        assert_eq!(selection.features.drawers, 0);

        let estimated = reply(r#"{"cabinet_width": 1200, "cabinet_total_height": 720, "cabinet_depth": 560}"#);
        let selection = select_delegated(
            &estimated,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        )
        .unwrap();
        // (720 - 300) / 200 = 2
        assert_eq!(selection.features.drawers, 2);
    }

    #[test]
    fn test_local_two_largest_singles() {
        let set = candidates(&[1200.0, 675.0, 340.0, 3795.0, 18.0, 32.0]);
        let selection = select_local(
            &set,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        )
        .unwrap();
        let dims = selection.dimensions;
        assert_eq!((dims.width, dims.total_height, dims.depth), (1200.0, 675.0, 340.0));
        assert_eq!(dims.working_height, 550.0);
        assert_eq!(selection.width_source, WidthSource::SingleToken);
        assert_eq!(selection.confidence, Confidence::Low);
    }

    #[test]
    fn test_local_default_depth() {
        let set = candidates(&[1500.0, 850.0, 2600.0]);
        let selection = select_local(
            &set,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        )
        .unwrap();
        assert_eq!(selection.dimensions.depth, DEFAULT_DEPTH);
    }

    #[test]
    fn test_local_segment_sum_width() {
        let set = candidates(&[600.0, 600.0, 720.0, 450.0]);
        let pairings = detect_segment_pairings(&set.segment_candidates);
        let selection = select_local(
            &set,
            &pairings,
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::PreferSegmentSum,
        )
        .unwrap();
        let dims = selection.dimensions;
        assert_eq!((dims.width, dims.total_height, dims.depth), (1200.0, 720.0, 450.0));
        assert_eq!(selection.width_source, WidthSource::SegmentSum);
    }

    #[test]
    fn test_local_not_enough_values() {
        let set = candidates(&[700.0, 700.0, 12.0]);
        let result = select_local(
            &set,
            &[],
            &OffsetConfiguration::default(),
            &DimensionLimits::base(),
            WidthTieBreak::default(),
        );
        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientSignal { found: 1, required: 2 })
        ));
    }
}
