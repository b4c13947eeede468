// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DXF rendering of a packed sheet layout
//!
//! One closed LWPOLYLINE and one text label per physical piece, a header
//! text per category block and a timestamped title. Entities sit on a
//! layer named after the category short code so a CAM operator can
//! toggle categories.

use chrono::NaiveDateTime;
use dxf::entities::{Entity, EntityType, LwPolyline, Text};
use dxf::enums::{AcadVersion, Units};
use dxf::{Drawing, LwPolylineVertex, Point};
use thiserror::Error;

use crate::layout::SheetLayout;

pub const TITLE_TEXT_HEIGHT: f64 = 25.0;
pub const HEADER_TEXT_HEIGHT: f64 = 20.0;
pub const LABEL_TEXT_HEIGHT: f64 = 12.0;
const TITLE_LAYER: &str = "TITLE";

/// Errors while writing the layout document
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("DXF write failed: {0}")]
    Dxf(#[from] dxf::DxfError),

    #[error("DXF output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Title line of the layout document
pub fn title_text(generated_at: &NaiveDateTime) -> String {
    format!(
        "CABINET CUTTING LIST - {}",
        generated_at.format("%Y-%m-%d %H:%M")
    )
}

/// Build the DXF drawing for a layout
pub fn build_drawing(layout: &SheetLayout, generated_at: &NaiveDateTime) -> Drawing {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2010;
    drawing.header.default_drawing_units = Units::Millimeters;

    add_text(
        &mut drawing,
        title_text(generated_at),
        10.0,
        -30.0,
        TITLE_TEXT_HEIGHT,
        TITLE_LAYER,
    );

    for header in &layout.headers {
        add_text(
            &mut drawing,
            format!("=== {} ===", header.label),
            header.x,
            header.y,
            HEADER_TEXT_HEIGHT,
            header.category.short_code(),
        );
    }

    for piece in &layout.placements {
        let layer = piece.category.short_code();
        let (left, top) = (piece.x, piece.y);
        let (right, bottom) = (piece.x + piece.width, piece.y - piece.height);

        let mut outline = LwPolyline::default();
        outline.set_is_closed(true);
        for (x, y) in [(left, top), (right, top), (right, bottom), (left, bottom)] {
            outline.vertices.push(LwPolylineVertex {
                x,
                y,
                ..Default::default()
            });
        }
        let mut entity = Entity::new(EntityType::LwPolyline(outline));
        entity.common.layer = layer.to_string();
        drawing.add_entity(entity);

        add_text(
            &mut drawing,
            format!("{} {}×{}", piece.part_id, piece.width, piece.height),
            left + 5.0,
            top - 15.0,
            LABEL_TEXT_HEIGHT,
            layer,
        );
    }

    drawing
}

fn add_text(drawing: &mut Drawing, value: String, x: f64, y: f64, height: f64, layer: &str) {
    let text = Text {
        location: Point::new(x, y, 0.0),
        text_height: height,
        value,
        ..Default::default()
    };
    let mut entity = Entity::new(EntityType::Text(text));
    entity.common.layer = layer.to_string();
    drawing.add_entity(entity);
}

/// Render a layout to DXF text
pub fn render_dxf(layout: &SheetLayout, generated_at: &NaiveDateTime) -> Result<String, ExportError> {
    let drawing = build_drawing(layout, generated_at);
    let mut buffer: Vec<u8> = Vec::new();
    drawing.save(&mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
