// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for dimension inference and cutting list generation

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// A 2D point in image pixel space
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Mean of a vertex list, `None` when empty
    pub fn centroid(points: &[Point2D]) -> Option<Point2D> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point2D::new(sx / n, sy / n))
    }
}

/// A single text region reported by the OCR collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextRegion {
    pub text: String,
    /// Bounding polygon vertices in pixels (usually 4)
    pub bounding_box: Vec<Point2D>,
}

impl TextRegion {
    pub fn new(text: impl Into<String>, bounding_box: Vec<Point2D>) -> Self {
        Self {
            text: text.into(),
            bounding_box,
        }
    }
}

/// Everything the OCR collaborator returns for one image
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OcrOutput {
    /// Full recognized text, line breaks preserved
    pub full_text: String,
    /// Per-word regions (may be empty if the service only returns text)
    pub regions: Vec<TextRegion>,
}

impl OcrOutput {
    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty() && self.regions.is_empty()
    }
}

/// A number read off the drawing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumericToken {
    /// Value in millimetres
    pub value: f64,
    /// Text the value was parsed from
    pub source_text: String,
    /// Centroid of the OCR region the token came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point2D>,
}

impl NumericToken {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            source_text: format_mm(value),
            position: None,
        }
    }

    pub fn with_source(value: f64, source_text: impl Into<String>, position: Option<Point2D>) -> Self {
        Self {
            value,
            source_text: source_text.into(),
            position,
        }
    }
}

/// Format a millimetre value without a trailing `.0` for whole numbers
pub fn format_mm(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Numeric tokens bucketed by the range they could plausibly describe.
///
/// A token may sit in several buckets; the ranges overlap on purpose.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DimensionCandidateSet {
    pub width_candidates: Vec<NumericToken>,
    pub height_candidates: Vec<NumericToken>,
    pub depth_candidates: Vec<NumericToken>,
    pub segment_candidates: Vec<NumericToken>,
    /// Room-scale dimensions, never cabinet dimensions
    pub large_numbers: Vec<NumericToken>,
    /// Hardware spacing and board thicknesses
    pub small_numbers: Vec<NumericToken>,
    /// Every token in discovery order
    pub all_numbers: Vec<NumericToken>,
}

/// Two similar segment tokens whose sum plausibly gives the cabinet width
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentPairing {
    pub first: NumericToken,
    pub second: NumericToken,
    pub sum: f64,
    /// Human readable form, e.g. `600+600=1200`
    pub description: String,
}

/// Inclusive millimetre range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MmRange {
    pub min: f64,
    pub max: f64,
}

impl MmRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Realistic ranges a resolved cabinet must fall inside
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DimensionLimits {
    pub width: MmRange,
    /// Applied to the total (overall) height
    pub height: MmRange,
    pub depth: MmRange,
}

impl DimensionLimits {
    /// Base units (kitchen floor cabinets)
    pub const fn base() -> Self {
        Self {
            width: MmRange::new(200.0, 2000.0),
            height: MmRange::new(200.0, 900.0),
            depth: MmRange::new(200.0, 800.0),
        }
    }

    /// Tall and larder units
    pub const fn tall() -> Self {
        Self {
            width: MmRange::new(200.0, 2000.0),
            height: MmRange::new(200.0, 2600.0),
            depth: MmRange::new(200.0, 800.0),
        }
    }
}

impl Default for DimensionLimits {
    fn default() -> Self {
        Self::base()
    }
}

/// Workshop-specific offsets in millimetres.
///
/// Supplied once per analysis and never changed during it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OffsetConfiguration {
    /// Back/top/shelf width = cabinet width - this
    pub back_width_offset: u32,
    /// Top/bottom depth = cabinet depth - this
    pub top_depth_offset: u32,
    /// Adjustable shelf depth = cabinet depth - this
    pub shelf_depth_offset: u32,
    pub board_thickness: u32,
    /// Subtracted from total height for legs
    pub leg_height_deduction: u32,
    /// Subtracted from total height for the countertop
    pub countertop_deduction: u32,
}

impl OffsetConfiguration {
    /// Carcass without legs or countertop allowance
    pub const fn frameless() -> Self {
        Self {
            back_width_offset: 36,
            top_depth_offset: 30,
            shelf_depth_offset: 40,
            board_thickness: 18,
            leg_height_deduction: 0,
            countertop_deduction: 0,
        }
    }

    /// Total amount taken off the overall height
    pub fn height_deduction(&self) -> f64 {
        f64::from(self.leg_height_deduction) + f64::from(self.countertop_deduction)
    }
}

impl Default for OffsetConfiguration {
    fn default() -> Self {
        Self {
            back_width_offset: 36,
            top_depth_offset: 30,
            shelf_depth_offset: 70,
            board_thickness: 18,
            leg_height_deduction: 100,
            countertop_deduction: 25,
        }
    }
}

/// The one resolved cabinet of an analysis run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CabinetDimensions {
    pub width: f64,
    pub total_height: f64,
    /// Total height minus leg and countertop deductions
    pub working_height: f64,
    pub depth: f64,
}

impl CabinetDimensions {
    pub fn from_total_height(
        width: f64,
        total_height: f64,
        depth: f64,
        offsets: &OffsetConfiguration,
    ) -> Self {
        Self {
            width,
            total_height,
            working_height: total_height - offsets.height_deduction(),
            depth,
        }
    }

    /// Check every field against the realistic ranges.
    ///
    /// Out-of-range dimensions invalidate the whole run.
    pub fn validate(&self, limits: &DimensionLimits) -> Result<()> {
        let checks = [
            ("width", self.width, limits.width),
            ("height", self.total_height, limits.height),
            ("depth", self.depth, limits.depth),
        ];
        for (name, value, range) in checks {
            if !value.is_finite() || !range.contains(value) {
                return Err(AnalysisError::InvalidDimensions(format!(
                    "{} {} outside {}-{}mm",
                    name,
                    format_mm(value),
                    format_mm(range.min),
                    format_mm(range.max)
                )));
            }
        }
        if !self.working_height.is_finite() || self.working_height <= 0.0 {
            return Err(AnalysisError::InvalidDimensions(format!(
                "working height {} is not positive",
                format_mm(self.working_height)
            )));
        }
        Ok(())
    }
}

/// Panel category with its material and part-id code
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PanelCategory {
    Gable,
    TopBottomShelf,
    Back,
    ShelfHardware,
    Drawer,
    EndPanel,
    Brace,
    DoorFace,
}

impl PanelCategory {
    /// Carcass categories produced by the standard formula set
    pub const STANDARD: [PanelCategory; 4] = [
        PanelCategory::Gable,
        PanelCategory::TopBottomShelf,
        PanelCategory::Back,
        PanelCategory::ShelfHardware,
    ];

    pub const ALL: [PanelCategory; 8] = [
        PanelCategory::Gable,
        PanelCategory::TopBottomShelf,
        PanelCategory::Back,
        PanelCategory::ShelfHardware,
        PanelCategory::Drawer,
        PanelCategory::EndPanel,
        PanelCategory::Brace,
        PanelCategory::DoorFace,
    ];

    /// Workshop label shown on cutting lists
    pub fn label(self) -> &'static str {
        match self {
            PanelCategory::Gable => "GABLE",
            PanelCategory::TopBottomShelf => "T/B & FIX SHELVES",
            PanelCategory::Back => "BACKS",
            PanelCategory::ShelfHardware => "S/H",
            PanelCategory::Drawer => "DRAWS",
            PanelCategory::EndPanel => "END PANELS & INFILLS",
            PanelCategory::Brace => "BRACES",
            PanelCategory::DoorFace => "DOORS & DRAW FACES",
        }
    }

    /// Prefix for sequential part ids
    pub fn short_code(self) -> &'static str {
        match self {
            PanelCategory::Gable => "GABLE",
            PanelCategory::TopBottomShelf => "SHELF",
            PanelCategory::Back => "BACK",
            PanelCategory::ShelfHardware => "HARDWARE",
            PanelCategory::Drawer => "DRAW",
            PanelCategory::EndPanel => "END",
            PanelCategory::Brace => "BRACE",
            PanelCategory::DoorFace => "DOOR",
        }
    }

    pub fn material(self, board_thickness: u32) -> String {
        match self {
            PanelCategory::Back => "6mm MDF".to_string(),
            PanelCategory::ShelfHardware => "Hardware".to_string(),
            PanelCategory::DoorFace => format!("{}mm MDF", board_thickness),
            _ => format!("{}mm MFC", board_thickness),
        }
    }
}

/// One cut panel row of the cutting list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Panel {
    /// `{short_code}-{sequence:02}`, sequence per category starting at 1
    pub part_id: String,
    pub category: PanelCategory,
    pub height: u32,
    pub width: u32,
    pub quantity: u32,
    pub material_type: String,
    pub notes: String,
}

impl Panel {
    /// Size key used for unique-size counting, e.g. `550×340`
    pub fn dimensions(&self) -> String {
        format!("{}×{}", self.height, self.width)
    }

    /// Area of all pieces of this row in square millimetres
    pub fn total_area_mm2(&self) -> u64 {
        u64::from(self.height) * u64::from(self.width) * u64::from(self.quantity)
    }
}

/// Aggregate for one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySummary {
    pub category: PanelCategory,
    pub label: String,
    pub items: Vec<Panel>,
    pub total_pieces: u32,
    pub unique_sizes: usize,
    /// Square metres, rounded to 2 decimals; at least 0.01 when populated
    pub total_area: f64,
}

impl CategorySummary {
    pub fn empty(category: PanelCategory) -> Self {
        Self {
            category,
            label: category.label().to_string(),
            items: Vec::new(),
            total_pieces: 0,
            unique_sizes: 0,
            total_area: 0.0,
        }
    }
}

/// Per-category cutting list, in category order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CuttingList {
    pub categories: Vec<CategorySummary>,
}

impl CuttingList {
    pub fn get(&self, category: PanelCategory) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn total_pieces(&self) -> u32 {
        self.categories.iter().map(|c| c.total_pieces).sum()
    }

    /// Sum of category areas, rounded to 2 decimals
    pub fn total_area(&self) -> f64 {
        round2(self.categories.iter().map(|c| c.total_area).sum())
    }

    /// Number of categories holding at least one panel
    pub fn populated_categories(&self) -> usize {
        self.categories.iter().filter(|c| !c.items.is_empty()).count()
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.items.is_empty())
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One physical piece placed on the layout sheet.
///
/// `(x, y)` is the top-left corner; the piece extends to `y - height`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutPlacement {
    pub part_id: String,
    pub category: PanelCategory,
    /// 0-based index within the panel's quantity
    pub piece_index: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutPlacement {
    pub fn overlaps(&self, other: &LayoutPlacement) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y - self.height < other.y
            && other.y - other.height < self.y
    }
}

/// Outcome flag carried by every analysis report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Success,
    CollaboratorUnavailable,
    InsufficientSignal,
    ValidationFailure,
    MalformedCollaboratorResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid() {
        let pts = [
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 4.0),
            Point2D::new(0.0, 4.0),
        ];
        assert_eq!(Point2D::centroid(&pts), Some(Point2D::new(5.0, 2.0)));
        assert_eq!(Point2D::centroid(&[]), None);
    }

    #[test]
    fn test_working_height() {
        let dims = CabinetDimensions::from_total_height(1200.0, 720.0, 560.0, &OffsetConfiguration::default());
        assert_eq!(dims.working_height, 595.0);

        let frameless = CabinetDimensions::from_total_height(1200.0, 720.0, 560.0, &OffsetConfiguration::frameless());
        assert_eq!(frameless.working_height, 720.0);
    }

    #[test]
    fn test_validation_boundaries() {
        let limits = DimensionLimits::base();
        let offsets = OffsetConfiguration::default();

        let ok = CabinetDimensions::from_total_height(2000.0, 900.0, 560.0, &offsets);
        assert!(ok.validate(&limits).is_ok());

        let too_wide = CabinetDimensions::from_total_height(2001.0, 900.0, 560.0, &offsets);
        assert!(matches!(too_wide.validate(&limits), Err(AnalysisError::InvalidDimensions(_))));

        let too_tall = CabinetDimensions::from_total_height(2000.0, 901.0, 560.0, &offsets);
        assert!(too_tall.validate(&limits).is_err());
        assert!(too_tall.validate(&DimensionLimits::tall()).is_ok());

        let shallow = CabinetDimensions::from_total_height(1200.0, 720.0, 199.0, &offsets);
        assert!(shallow.validate(&limits).is_err());
    }

    #[test]
    fn test_non_positive_working_height_rejected() {
        let offsets = OffsetConfiguration {
            leg_height_deduction: 200,
            ..Default::default()
        };
        let dims = CabinetDimensions::from_total_height(1200.0, 220.0, 560.0, &offsets);
        assert!(dims.validate(&DimensionLimits::base()).is_err());
    }

    #[test]
    fn test_extreme_deductions_do_not_wrap() {
        let offsets = OffsetConfiguration {
            leg_height_deduction: u32::MAX,
            countertop_deduction: 1,
            ..Default::default()
        };
        assert_eq!(offsets.height_deduction(), 4_294_967_296.0);

        let dims = CabinetDimensions::from_total_height(1200.0, 720.0, 560.0, &offsets);
        assert!(dims.working_height < 0.0);
        assert!(dims.validate(&DimensionLimits::base()).is_err());
    }

    #[test]
    fn test_category_table() {
        assert_eq!(PanelCategory::TopBottomShelf.label(), "T/B & FIX SHELVES");
        assert_eq!(PanelCategory::ShelfHardware.short_code(), "HARDWARE");
        assert_eq!(PanelCategory::Gable.material(18), "18mm MFC");
        assert_eq!(PanelCategory::Back.material(18), "6mm MDF");
        assert_eq!(
            serde_json::to_string(&PanelCategory::TopBottomShelf).unwrap(),
            "\"TOP_BOTTOM_SHELF\""
        );
    }

    #[test]
    fn test_format_mm() {
        assert_eq!(format_mm(600.0), "600");
        assert_eq!(format_mm(18.5), "18.5");
    }

    #[test]
    fn test_overlap() {
        let a = LayoutPlacement {
            part_id: "GABLE-01".into(),
            category: PanelCategory::Gable,
            piece_index: 0,
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        };
        let mut b = a.clone();
        b.x = 100.0;
        assert!(!a.overlaps(&b));
        b.x = 99.0;
        assert!(a.overlaps(&b));
        b.x = 0.0;
        b.y = -100.0;
        assert!(!a.overlaps(&b));
    }
}
