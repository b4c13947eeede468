// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Panel formula engine
//!
//! Turns one resolved cabinet plus the workshop offsets into cut panels.
//! All arithmetic happens here, locally and deterministically; numbers a
//! collaborator may have computed are never used for panel sizes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{CabinetDimensions, OffsetConfiguration, Panel, PanelCategory};

/// Smallest dimension a panel is cut at
pub const MIN_PANEL_MM: u32 = 10;
/// Drawer box side height when the drawing gives none
pub const DRAWER_BOX_HEIGHT: f64 = 150.0;
/// Drawer box width clearance inside the carcass
pub const DRAWER_WIDTH_CLEARANCE: f64 = 20.0;
/// Drawer box depth clearance from the cabinet depth
pub const DRAWER_DEPTH_CLEARANCE: f64 = 50.0;
/// Drawer face overlap over the box height
pub const DRAWER_FACE_OVERLAP: f64 = 20.0;
/// Door height allowance below the overall height
pub const DOOR_HEIGHT_ALLOWANCE: f64 = 100.0;
pub const BRACE_HEIGHT: f64 = 100.0;
pub const HANGING_RAIL_SECTION: f64 = 25.0;

pub const END_PANEL_MIN_WIDTH: f64 = 1200.0;
pub const BRACE_MIN_WIDTH: f64 = 1000.0;
pub const DOUBLE_BRACE_MIN_WIDTH: f64 = 1500.0;
pub const HANGING_RAIL_MIN_HEIGHT: f64 = 1800.0;

/// Most doors a single carcass can carry
pub const MAX_DOORS: u32 = 8;
pub const MAX_DRAWERS: u32 = 10;
pub const MAX_FIXED_SHELVES: u32 = 10;

/// Which rows the engine produces
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormulaSet {
    /// Gables, top/bottom, back and shelf
    #[default]
    Standard,
    /// Standard plus doors, drawers, end panels, braces and rails
    Extended,
}

impl FormulaSet {
    /// Categories always present in this set's cutting list
    pub fn categories(self) -> &'static [PanelCategory] {
        match self {
            FormulaSet::Standard => &PanelCategory::STANDARD,
            FormulaSet::Extended => &PanelCategory::ALL,
        }
    }
}

/// Fronts and internals of the cabinet, used by the extended set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CabinetFeatures {
    pub doors: u32,
    pub drawers: u32,
    pub fixed_shelves: u32,
    /// Widths of individual doors, when the drawing dimensions them
    #[serde(default)]
    pub door_widths: Vec<f64>,
    /// Drawer face heights, top to bottom
    #[serde(default)]
    pub drawer_heights: Vec<f64>,
}

impl CabinetFeatures {
    /// Rough guess from overall size alone
    pub fn estimate(dims: &CabinetDimensions) -> Self {
        let doors = if dims.width > 800.0 {
            2
        } else if dims.width > 400.0 {
            1
        } else {
            0
        };
        let drawers = if dims.total_height > 600.0 {
            (((dims.total_height - 300.0) / 200.0).floor() as u32).min(3)
        } else {
            0
        };
        let fixed_shelves = (((dims.total_height - 200.0) / 350.0).floor().max(0.0) as u32).max(1);

        Self {
            doors,
            drawers,
            fixed_shelves,
            door_widths: Vec::new(),
            drawer_heights: Vec::new(),
        }
    }

    /// Whether every count fits a single carcass
    pub fn is_plausible(&self) -> bool {
        self.doors <= MAX_DOORS && self.drawers <= MAX_DRAWERS && self.fixed_shelves <= MAX_FIXED_SHELVES
    }
}

/// Collects panels for a single run, numbering part ids per category.
///
/// Counters start at 1 for every category and live only as long as the
/// builder; a new run gets a new builder.
#[derive(Debug)]
pub struct CuttingListBuilder {
    board_thickness: u32,
    panels: Vec<Panel>,
    counters: BTreeMap<PanelCategory, u32>,
}

impl CuttingListBuilder {
    pub fn new(offsets: &OffsetConfiguration) -> Self {
        Self {
            board_thickness: offsets.board_thickness,
            panels: Vec::new(),
            counters: BTreeMap::new(),
        }
    }

    /// Add a panel row.
    ///
    /// Non-positive or non-finite sizes skip the row; anything else is
    /// rounded to whole millimetres and floored at [`MIN_PANEL_MM`].
    pub fn add(
        &mut self,
        category: PanelCategory,
        height: f64,
        width: f64,
        quantity: u32,
        description: &str,
    ) -> Option<&Panel> {
        let (Some(height), Some(width)) = (round_mm(height), round_mm(width)) else {
            tracing::warn!(
                category = category.label(),
                height,
                width,
                "Skipping panel with non-positive size"
            );
            return None;
        };

        let counter = self.counters.entry(category).or_insert(1);
        let part_id = format!("{}-{:02}", category.short_code(), *counter);
        *counter += 1;

        self.panels.push(Panel {
            part_id,
            category,
            height,
            width,
            quantity: quantity.max(1),
            material_type: category.material(self.board_thickness),
            notes: format!("{} {}×{}", description, height, width),
        });
        self.panels.last()
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn into_panels(self) -> Vec<Panel> {
        self.panels
    }
}

/// Round to whole millimetres, `None` for sizes that cannot be cut
fn round_mm(value: f64) -> Option<u32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some((value.round() as u32).max(MIN_PANEL_MM))
}

/// Apply the formula set to one cabinet
pub fn generate_panels(
    dims: &CabinetDimensions,
    offsets: &OffsetConfiguration,
    formula_set: FormulaSet,
    features: &CabinetFeatures,
) -> Vec<Panel> {
    let mut builder = CuttingListBuilder::new(offsets);
    add_carcass(&mut builder, dims, offsets);
    if formula_set == FormulaSet::Extended {
        add_extended(&mut builder, dims, offsets, features);
    }

    let panels = builder.into_panels();
    tracing::info!(
        width = dims.width,
        working_height = dims.working_height,
        depth = dims.depth,
        panels = panels.len(),
        "Generated panels"
    );
    panels
}

fn add_carcass(builder: &mut CuttingListBuilder, dims: &CabinetDimensions, offsets: &OffsetConfiguration) {
    let inner_width = dims.width - f64::from(offsets.back_width_offset);

    builder.add(PanelCategory::Gable, dims.working_height, dims.depth, 2, "Gables");
    builder.add(
        PanelCategory::TopBottomShelf,
        inner_width,
        dims.depth - f64::from(offsets.top_depth_offset),
        2,
        "T/B Panels",
    );
    builder.add(
        PanelCategory::ShelfHardware,
        inner_width,
        dims.depth - f64::from(offsets.shelf_depth_offset),
        1,
        "Shelf Hardware",
    );
    builder.add(PanelCategory::Back, dims.working_height, inner_width, 1, "Back Panel");
}

fn add_extended(
    builder: &mut CuttingListBuilder,
    dims: &CabinetDimensions,
    offsets: &OffsetConfiguration,
    features: &CabinetFeatures,
) {
    let internal_width = dims.width - 2.0 * f64::from(offsets.board_thickness);

    if features.fixed_shelves > 0 {
        builder.add(
            PanelCategory::TopBottomShelf,
            dims.width - f64::from(offsets.back_width_offset),
            dims.depth - f64::from(offsets.top_depth_offset),
            features.fixed_shelves,
            "Fixed Shelves",
        );
    }

    add_doors(builder, dims, features);

    let drawer_width = internal_width - DRAWER_WIDTH_CLEARANCE;
    let drawer_depth = dims.depth - DRAWER_DEPTH_CLEARANCE;
    for i in 0..features.drawers as usize {
        let box_height = features
            .drawer_heights
            .get(i)
            .copied()
            .filter(|h| *h > 0.0)
            .unwrap_or(DRAWER_BOX_HEIGHT);

        builder.add(PanelCategory::Drawer, box_height, drawer_width, 2, "Drawer Front/Back");
        builder.add(PanelCategory::Drawer, box_height, drawer_depth, 2, "Drawer Sides");
        builder.add(PanelCategory::Drawer, drawer_depth, drawer_width, 1, "Drawer Bottom");
        builder.add(
            PanelCategory::DoorFace,
            box_height + DRAWER_FACE_OVERLAP,
            internal_width,
            1,
            "Drawer Face",
        );
    }

    if dims.width > END_PANEL_MIN_WIDTH {
        builder.add(PanelCategory::EndPanel, dims.total_height, dims.depth, 2, "End Panels");
    }

    if dims.width > BRACE_MIN_WIDTH {
        let count = if dims.width > DOUBLE_BRACE_MIN_WIDTH { 2 } else { 1 };
        builder.add(PanelCategory::Brace, BRACE_HEIGHT, internal_width, count, "Braces");
    }

    if dims.total_height > HANGING_RAIL_MIN_HEIGHT && features.doors > 0 {
        builder.add(
            PanelCategory::ShelfHardware,
            HANGING_RAIL_SECTION,
            internal_width,
            1,
            "Hanging Rail",
        );
    }
}

fn add_doors(builder: &mut CuttingListBuilder, dims: &CabinetDimensions, features: &CabinetFeatures) {
    if features.doors == 0 {
        return;
    }
    let door_height = dims.total_height - DOOR_HEIGHT_ALLOWANCE;

    if !features.door_widths.is_empty() {
        for width in &features.door_widths {
            builder.add(PanelCategory::DoorFace, door_height, *width, 1, "Cabinet Door");
        }
        return;
    }

    let door_width = if features.doors == 1 {
        dims.width - 30.0
    } else {
        ((dims.width - 60.0) / f64::from(features.doors)).floor()
    };
    builder.add(PanelCategory::DoorFace, door_height, door_width, features.doors, "Cabinet Doors");
}
