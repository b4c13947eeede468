// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Row-based sheet layout for the cut-layout document
//!
//! Greedy shelf packing: pieces go left to right along a row until the
//! next one would cross the sheet edge, then a new row starts below the
//! tallest piece of the current row. Each category starts on a fresh row
//! under its own header. Not space-optimal, but deterministic and easy to
//! check by eye.
//!
//! The y axis points up, so rows advance towards negative y. A placement
//! at `(x, y)` covers `x..x + width` and `y - height..y`.

use serde::{Deserialize, Serialize};

use crate::types::{CuttingList, LayoutPlacement, PanelCategory};

pub const DEFAULT_SHEET_WIDTH: f64 = 2400.0;
pub const DEFAULT_MARGIN: f64 = 50.0;
/// Space reserved at the top for the title text
pub const TITLE_BLOCK_HEIGHT: f64 = 80.0;
/// Space reserved under each category header
pub const HEADER_HEIGHT: f64 = 40.0;

/// Sheet parameters for [`pack_cutting_list`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    /// Row wrap width; `None` lays every category out on a single row
    pub sheet_width: Option<f64>,
    /// Gap between pieces and between rows
    pub margin: f64,
}

impl LayoutConfig {
    pub fn unbounded() -> Self {
        Self {
            sheet_width: None,
            ..Self::default()
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sheet_width: Some(DEFAULT_SHEET_WIDTH),
            margin: DEFAULT_MARGIN,
        }
    }
}

/// Header text position for one category block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryHeader {
    pub category: PanelCategory,
    pub label: String,
    pub x: f64,
    /// Text baseline
    pub y: f64,
}

/// Every physical piece of a cutting list placed on one sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SheetLayout {
    pub sheet_width: Option<f64>,
    pub headers: Vec<CategoryHeader>,
    pub placements: Vec<LayoutPlacement>,
    /// Rightmost piece edge
    pub extent_width: f64,
    /// Distance from the top of the sheet to the bottom of the last row
    pub extent_height: f64,
}

/// Place one rectangle per physical piece (quantities expanded).
///
/// Never fails. A piece wider than the sheet still goes on its own row
/// and sticks out past the sheet edge.
pub fn pack_cutting_list(list: &CuttingList, config: &LayoutConfig) -> SheetLayout {
    let margin = config.margin.max(0.0);
    let limit = config.sheet_width.unwrap_or(f64::INFINITY);

    let mut layout = SheetLayout {
        sheet_width: config.sheet_width,
        ..Default::default()
    };
    let mut y = -TITLE_BLOCK_HEIGHT;

    for summary in list.categories.iter().filter(|c| !c.items.is_empty()) {
        layout.headers.push(CategoryHeader {
            category: summary.category,
            label: summary.label.clone(),
            x: 0.0,
            y,
        });
        y -= HEADER_HEIGHT;

        let mut x = 0.0;
        let mut row_height: f64 = 0.0;

        for panel in &summary.items {
            let width = f64::from(panel.width);
            let height = f64::from(panel.height);

            for piece_index in 0..panel.quantity {
                if x > 0.0 && x + width > limit {
                    x = 0.0;
                    y -= row_height + margin;
                    row_height = 0.0;
                }

                layout.placements.push(LayoutPlacement {
                    part_id: panel.part_id.clone(),
                    category: panel.category,
                    piece_index,
                    x,
                    y,
                    width,
                    height,
                });
                layout.extent_width = layout.extent_width.max(x + width);

                x += width + margin;
                row_height = row_height.max(height);
            }
        }

        y -= row_height + 2.0 * margin;
    }

    layout.extent_height = -y;
    tracing::debug!(
        pieces = layout.placements.len(),
        extent_width = layout.extent_width,
        extent_height = layout.extent_height,
        "Packed sheet layout"
    );
    layout
}
