// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cutting list aggregation per category

use rustc_hash::FxHashSet;

use crate::types::{round2, CategorySummary, CuttingList, Panel, PanelCategory};

/// Smallest area a populated category reports
pub const MIN_REPORTED_AREA_M2: f64 = 0.01;

/// Group panels by category and total them.
///
/// Every category in `categories` is present in the output, zeroed when
/// it has no panels. Categories that only appear in `panels` are added
/// in enum order after the requested ones.
pub fn summarize(panels: &[Panel], categories: &[PanelCategory]) -> CuttingList {
    let mut order: Vec<PanelCategory> = categories.to_vec();
    for category in PanelCategory::ALL {
        if !order.contains(&category) && panels.iter().any(|p| p.category == category) {
            order.push(category);
        }
    }

    let categories = order
        .into_iter()
        .map(|category| {
            let items: Vec<Panel> = panels
                .iter()
                .filter(|p| p.category == category)
                .cloned()
                .collect();
            summarize_category(category, items)
        })
        .collect();

    CuttingList { categories }
}

/// The schema-stable list returned when an analysis fails
pub fn empty_cutting_list(categories: &[PanelCategory]) -> CuttingList {
    summarize(&[], categories)
}

fn summarize_category(category: PanelCategory, items: Vec<Panel>) -> CategorySummary {
    if items.is_empty() {
        return CategorySummary::empty(category);
    }

    let total_pieces = items.iter().map(|p| p.quantity).sum();
    let unique_sizes = items
        .iter()
        .map(Panel::dimensions)
        .collect::<FxHashSet<_>>()
        .len();
    let area_mm2: u64 = items.iter().map(Panel::total_area_mm2).sum();

    CategorySummary {
        category,
        label: category.label().to_string(),
        items,
        total_pieces,
        unique_sizes,
        total_area: area_m2(area_mm2),
    }
}

/// Square metres to 2 decimals. Any non-zero area reports at least
/// 0.01 so only an empty category shows zero.
fn area_m2(area_mm2: u64) -> f64 {
    if area_mm2 == 0 {
        return 0.0;
    }
    round2(area_mm2 as f64 / 1_000_000.0).max(MIN_REPORTED_AREA_M2)
}
