// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use panelcut_core::{
    AnalysisStatus, CabinetDimensions, CabinetFeatures, Confidence, CuttingList, DimensionLimits,
    FormulaSet, OffsetConfiguration, SelectionStrategy, WidthSource, WidthTieBreak,
};
use serde::{Deserialize, Serialize};

use crate::config::CabinetProfile;

/// Drawing analysis response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Outcome of the run; anything but `success` carries a zeroed list.
    pub status: AnalysisStatus,
    pub message: String,
    /// SHA256 of the uploaded image.
    pub image_sha256: String,
    pub dimensions: Option<CabinetDimensions>,
    pub width_source: Option<WidthSource>,
    pub confidence: Option<Confidence>,
    pub features: Option<CabinetFeatures>,
    /// Segment sums found on the drawing, e.g. `600+600=1200`.
    pub pairings: Vec<String>,
    /// Offsets the run used, after request overrides.
    pub offsets: OffsetConfiguration,
    /// Per-category cutting list, every category present.
    pub results: CuttingList,
    pub summary: ResultSummary,
    /// Packed cut layout, absent for failed runs.
    pub layout: Option<LayoutDocument>,
    pub processing_time_ms: u64,
}

/// Totals across all categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultSummary {
    pub total_pieces: u32,
    /// Square metres.
    pub total_area: f64,
    /// Categories with at least one panel.
    pub category_count: usize,
}

impl ResultSummary {
    pub fn of(list: &CuttingList) -> Self {
        Self {
            total_pieces: list.total_pieces(),
            total_area: list.total_area(),
            category_count: list.populated_categories(),
        }
    }
}

/// Embedded layout document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub format: String,
    pub filename: String,
    pub content_base64: String,
}

/// Defaults a request starts from.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub offsets: OffsetConfiguration,
    pub formula_set: FormulaSet,
    pub cabinet_profile: CabinetProfile,
    pub limits: DimensionLimits,
    pub selection_strategy: SelectionStrategy,
    pub width_tie_break: WidthTieBreak,
    pub sheet_width_mm: Option<f64>,
}
