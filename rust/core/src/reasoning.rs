// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prompt construction and reply parsing for the reasoning collaborator
//!
//! The collaborator looks at the drawing and says which numbers are the
//! overall width, height and depth. Its reply is untrusted input: it is
//! parsed leniently here, and range-checked by the selector before use.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AnalysisError, Result};
use crate::formula::CabinetFeatures;
use crate::types::{format_mm, DimensionCandidateSet, NumericToken, OffsetConfiguration, SegmentPairing};

/// Overall dimensions block of the nested reply shape
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverallDimensions {
    #[serde(default, deserialize_with = "lenient_mm")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_mm")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_mm")]
    pub depth: Option<f64>,
}

/// Door/drawer/shelf counts reported by the collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentAnalysis {
    #[serde(default, deserialize_with = "lenient_count")]
    pub doors_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub drawers_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub shelves_count: Option<u32>,
}

/// One door or drawer opening seen on the elevation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Compartment {
    #[serde(default, deserialize_with = "lenient_mm")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_mm")]
    pub height: Option<f64>,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Parsed reply. Accepts the flat (`cabinet_*`) and the nested
/// (`overall_dimensions`) shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReasoningReply {
    #[serde(default, deserialize_with = "lenient_mm")]
    pub cabinet_width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_mm")]
    pub cabinet_total_height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_mm")]
    pub cabinet_working_height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_mm")]
    pub cabinet_depth: Option<f64>,
    #[serde(default)]
    pub overall_dimensions: Option<OverallDimensions>,
    #[serde(default)]
    pub component_analysis: Option<ComponentAnalysis>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub compartments: Vec<Compartment>,
    /// Per-category breakdown as the collaborator computed it. Kept for
    /// reference only; panel sizes are always recomputed locally.
    #[serde(default)]
    pub components: Option<Value>,
}

/// Dimensions the collaborator claims, before any validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedDimensions {
    pub width: f64,
    pub total_height: Option<f64>,
    pub working_height: Option<f64>,
    pub depth: f64,
}

impl ReasoningReply {
    /// Pull width/height/depth out of whichever shape the reply used.
    ///
    /// Missing width or depth, or no height of either kind, makes the
    /// reply malformed.
    pub fn reported_dimensions(&self) -> Result<ReportedDimensions> {
        let overall = self.overall_dimensions.clone().unwrap_or_default();

        let width = self
            .cabinet_width
            .or(overall.width)
            .ok_or_else(|| AnalysisError::MalformedResponse("missing cabinet width".into()))?;
        let depth = self
            .cabinet_depth
            .or(overall.depth)
            .ok_or_else(|| AnalysisError::MalformedResponse("missing cabinet depth".into()))?;
        let total_height = self.cabinet_total_height.or(overall.height);
        let working_height = self.cabinet_working_height;

        if total_height.is_none() && working_height.is_none() {
            return Err(AnalysisError::MalformedResponse("missing cabinet height".into()));
        }

        Ok(ReportedDimensions {
            width,
            total_height,
            working_height,
            depth,
        })
    }

    /// Fronts and internals, when the reply describes any.
    ///
    /// Counts beyond what one carcass can hold make the reply malformed.
    /// Per-opening sizes are cut down to the reported counts.
    pub fn features(&self) -> Result<Option<CabinetFeatures>> {
        if self.component_analysis.is_none() && self.compartments.is_empty() {
            return Ok(None);
        }
        let analysis = self.component_analysis.clone().unwrap_or_default();

        let of_kind = |kind: &str| -> Vec<&Compartment> {
            self.compartments
                .iter()
                .filter(|c| c.kind.eq_ignore_ascii_case(kind))
                .collect()
        };
        let doors = of_kind("door");
        let drawers = of_kind("drawer");
        let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);

        let door_count = analysis.doors_count.unwrap_or(count(doors.len()));
        let drawer_count = analysis.drawers_count.unwrap_or(count(drawers.len()));

        let features = CabinetFeatures {
            doors: door_count,
            drawers: drawer_count,
            fixed_shelves: analysis.shelves_count.unwrap_or(1),
            door_widths: doors
                .iter()
                .filter_map(|c| c.width)
                .take(door_count as usize)
                .collect(),
            drawer_heights: drawers
                .iter()
                .filter_map(|c| c.height)
                .take(drawer_count as usize)
                .collect(),
        };

        if !features.is_plausible() {
            return Err(AnalysisError::MalformedResponse(format!(
                "implausible component counts: {} doors, {} drawers, {} shelves",
                features.doors, features.drawers, features.fixed_shelves
            )));
        }
        Ok(Some(features))
    }
}

/// Parse the collaborator's message content.
///
/// Models often wrap JSON in prose or code fences, so the outermost
/// `{ ... }` span is taken.
pub fn parse_reasoning_reply(content: &str) -> Result<ReasoningReply> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if end > start => &content[start..=end],
        _ => {
            return Err(AnalysisError::MalformedResponse(
                "no JSON object in reply".into(),
            ))
        }
    };

    serde_json::from_str(json).map_err(|e| AnalysisError::MalformedResponse(e.to_string()))
}

fn value_to_mm(value: &Value) -> Option<f64> {
    let mm = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches("mm").trim().parse::<f64>().ok(),
        Value::Array(items) if items.len() == 1 => value_to_mm(&items[0]),
        _ => None,
    };
    mm.filter(|v| v.is_finite())
}

fn lenient_mm<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_mm))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(value_to_mm)
        .filter(|v| *v >= 0.0)
        .map(|v| v.round() as u32))
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<Compartment>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn join_values(tokens: &[NumericToken]) -> String {
    let values: Vec<String> = tokens.iter().map(|t| format_mm(t.value)).collect();
    format!("[{}]", values.join(", "))
}

/// Instruction text sent with the drawing image
pub fn build_reasoning_prompt(
    offsets: &OffsetConfiguration,
    candidates: &DimensionCandidateSet,
    pairings: &[SegmentPairing],
) -> String {
    let segment_sums = if pairings.is_empty() {
        "none".to_string()
    } else {
        pairings
            .iter()
            .map(|p| p.description.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        r#"Analyze this kitchen cabinet technical drawing and identify the overall cabinet dimensions in millimetres.

Numbers read from the drawing: {all}
Width candidates (800-2000): {width}
Height candidates (400-900): {height}
Depth candidates (250-500): {depth}
Door/drawer segment candidates (400-800): {segments}
Possible segmented widths: {segment_sums}
Room dimensions to ignore (>2500): {large}
Hardware and thickness values to ignore (<200): {small}

If the width is dimensioned as segments (for example 600+600), the cabinet width is the SUM of the segments, not a single large number.

Workshop allowances (for reference, do not apply them yourself):
- Height deduction: {leg}mm legs + {counter}mm countertop
- Back/shelf width offset: {back}mm
- Top/bottom depth offset: {top}mm, shelf depth offset: {shelf}mm
- Board thickness: {thickness}mm

Return only JSON:
{{
  "cabinet_width": number,
  "cabinet_total_height": number,
  "cabinet_depth": number,
  "component_analysis": {{"doors_count": number, "drawers_count": number, "shelves_count": number}},
  "compartments": [{{"type": "door|drawer|shelf", "width": number, "height": number}}]
}}"#,
        all = join_values(&candidates.all_numbers),
        width = join_values(&candidates.width_candidates),
        height = join_values(&candidates.height_candidates),
        depth = join_values(&candidates.depth_candidates),
        segments = join_values(&candidates.segment_candidates),
        segment_sums = segment_sums,
        large = join_values(&candidates.large_numbers),
        small = join_values(&candidates.small_numbers),
        leg = offsets.leg_height_deduction,
        counter = offsets.countertop_deduction,
        back = offsets.back_width_offset,
        top = offsets.top_depth_offset,
        shelf = offsets.shelf_depth_offset,
        thickness = offsets.board_thickness,
    )
}
