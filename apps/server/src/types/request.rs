// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use panelcut_core::OffsetConfiguration;

use crate::error::ApiError;

/// Largest offset accepted from a request; anything beyond the tallest
/// cabinet is a typo, not a workshop setting.
pub const MAX_OFFSET_MM: u32 = 2600;

/// Per-request workshop offset overrides.
///
/// Accepted as multipart text fields or query parameters named after the
/// [`OffsetConfiguration`] fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetOverrides {
    pub back_width_offset: Option<u32>,
    pub top_depth_offset: Option<u32>,
    pub shelf_depth_offset: Option<u32>,
    pub board_thickness: Option<u32>,
    pub leg_height_deduction: Option<u32>,
    pub countertop_deduction: Option<u32>,
}

impl OffsetOverrides {
    pub const FIELDS: [&'static str; 6] = [
        "back_width_offset",
        "top_depth_offset",
        "shelf_depth_offset",
        "board_thickness",
        "leg_height_deduction",
        "countertop_deduction",
    ];

    pub fn is_field(name: &str) -> bool {
        Self::FIELDS.contains(&name)
    }

    /// Set one override from its text form. Unknown names are ignored.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), ApiError> {
        let slot = match name {
            "back_width_offset" => &mut self.back_width_offset,
            "top_depth_offset" => &mut self.top_depth_offset,
            "shelf_depth_offset" => &mut self.shelf_depth_offset,
            "board_thickness" => &mut self.board_thickness,
            "leg_height_deduction" => &mut self.leg_height_deduction,
            "countertop_deduction" => &mut self.countertop_deduction,
            _ => return Ok(()),
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }
        let value = raw
            .parse::<u32>()
            .ok()
            .filter(|v| *v <= MAX_OFFSET_MM)
            .ok_or_else(|| ApiError::InvalidParameter {
                field: name.to_string(),
                value: raw.to_string(),
            })?;
        *slot = Some(value);
        Ok(())
    }

    /// Overlay `other` on top of `self`.
    pub fn merge(self, other: OffsetOverrides) -> Self {
        Self {
            back_width_offset: other.back_width_offset.or(self.back_width_offset),
            top_depth_offset: other.top_depth_offset.or(self.top_depth_offset),
            shelf_depth_offset: other.shelf_depth_offset.or(self.shelf_depth_offset),
            board_thickness: other.board_thickness.or(self.board_thickness),
            leg_height_deduction: other.leg_height_deduction.or(self.leg_height_deduction),
            countertop_deduction: other.countertop_deduction.or(self.countertop_deduction),
        }
    }

    pub fn apply(&self, base: OffsetConfiguration) -> OffsetConfiguration {
        OffsetConfiguration {
            back_width_offset: self.back_width_offset.unwrap_or(base.back_width_offset),
            top_depth_offset: self.top_depth_offset.unwrap_or(base.top_depth_offset),
            shelf_depth_offset: self.shelf_depth_offset.unwrap_or(base.shelf_depth_offset),
            board_thickness: self.board_thickness.unwrap_or(base.board_thickness),
            leg_height_deduction: self.leg_height_deduction.unwrap_or(base.leg_height_deduction),
            countertop_deduction: self.countertop_deduction.unwrap_or(base.countertop_deduction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_apply() {
        let mut overrides = OffsetOverrides::default();
        overrides.set("board_thickness", " 16 ").unwrap();
        overrides.set("colour", "white").unwrap();
        overrides.set("shelf_depth_offset", "").unwrap();

        let offsets = overrides.apply(OffsetConfiguration::default());
        assert_eq!(offsets.board_thickness, 16);
        assert_eq!(offsets.shelf_depth_offset, 70);
    }

    #[test]
    fn test_invalid_value() {
        let mut overrides = OffsetOverrides::default();
        let err = overrides.set("top_depth_offset", "-5").unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter { ref field, .. } if field == "top_depth_offset"));
    }

    #[test]
    fn test_implausible_offset_rejected() {
        let mut overrides = OffsetOverrides::default();
        let err = overrides.set("leg_height_deduction", "4294967295").unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter { ref field, .. } if field == "leg_height_deduction"));
        assert!(overrides.set("countertop_deduction", "2601").is_err());

        overrides.set("countertop_deduction", "2600").unwrap();
        assert_eq!(overrides.countertop_deduction, Some(2600));
        assert_eq!(overrides.leg_height_deduction, None);
    }

    #[test]
    fn test_query_wins() {
        let form = OffsetOverrides {
            board_thickness: Some(16),
            top_depth_offset: Some(20),
            ..Default::default()
        };
        let query = OffsetOverrides {
            board_thickness: Some(19),
            ..Default::default()
        };
        let merged = form.merge(query);
        assert_eq!(merged.board_thickness, Some(19));
        assert_eq!(merged.top_depth_offset, Some(20));
    }
}
