// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use std::str::FromStr;

use panelcut_core::{
    AnalysisSettings, DimensionLimits, FormulaSet, LayoutConfig, OffsetConfiguration,
    SelectionStrategy, WidthTieBreak,
};
use serde::Serialize;

pub const DEFAULT_OCR_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const DEFAULT_REASONING_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_REASONING_MODEL: &str = "gpt-4o";

/// Realistic-range profile for resolved cabinets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinetProfile {
    /// Floor units, total height up to 900mm.
    #[default]
    Base,
    /// Tall and larder units, total height up to 2600mm.
    Tall,
}

impl CabinetProfile {
    pub fn limits(self) -> DimensionLimits {
        match self {
            CabinetProfile::Base => DimensionLimits::base(),
            CabinetProfile::Tall => DimensionLimits::tall(),
        }
    }
}

/// OCR collaborator settings.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub api_key: String,
    pub endpoint: String,
}

/// Reasoning collaborator settings.
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Maximum upload size in MB.
    pub max_file_size_mb: usize,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Per-call timeout for the OCR and reasoning services.
    pub collaborator_timeout_secs: u64,
    /// `None` when no OCR key is set.
    pub ocr: Option<OcrConfig>,
    /// `None` when no reasoning key is set.
    pub reasoning: Option<ReasoningConfig>,
    pub selection_strategy: SelectionStrategy,
    pub formula_set: FormulaSet,
    pub cabinet_profile: CabinetProfile,
    pub width_tie_break: WidthTieBreak,
    /// Layout row width; `None` packs each category on one row.
    pub sheet_width_mm: Option<f64>,
    /// Workshop defaults, overridable per request.
    pub offsets: OffsetConfiguration,
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            default
        }),
        None => default,
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_strategy(raw: &str) -> Option<SelectionStrategy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "delegated" | "reasoning" => Some(SelectionStrategy::Delegated),
        "local" | "local_heuristic" | "heuristic" => Some(SelectionStrategy::LocalHeuristic),
        _ => None,
    }
}

fn parse_formula_set(raw: &str) -> Option<FormulaSet> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "standard" | "minimal" => Some(FormulaSet::Standard),
        "extended" | "full" => Some(FormulaSet::Extended),
        _ => None,
    }
}

fn parse_profile(raw: &str) -> Option<CabinetProfile> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "base" => Some(CabinetProfile::Base),
        "tall" | "larder" => Some(CabinetProfile::Tall),
        _ => None,
    }
}

fn parse_tie_break(raw: &str) -> Option<WidthTieBreak> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "segment" | "segment_sum" => Some(WidthTieBreak::PreferSegmentSum),
        "collaborator" | "reasoning" => Some(WidthTieBreak::PreferCollaborator),
        _ => None,
    }
}

fn parse_choice<T: Default>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: fn(&str) -> Option<T>,
) -> T {
    match lookup(key) {
        Some(raw) => parse(&raw).unwrap_or_else(|| {
            tracing::warn!(key, value = %raw, "Unknown choice, using default");
            T::default()
        }),
        None => T::default(),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = OffsetConfiguration::default();
        let offsets = OffsetConfiguration {
            back_width_offset: parse_or(&lookup, "OFFSET_BACK_WIDTH", defaults.back_width_offset),
            top_depth_offset: parse_or(&lookup, "OFFSET_TOP_DEPTH", defaults.top_depth_offset),
            shelf_depth_offset: parse_or(&lookup, "OFFSET_SHELF_DEPTH", defaults.shelf_depth_offset),
            board_thickness: parse_or(&lookup, "BOARD_THICKNESS", defaults.board_thickness),
            leg_height_deduction: parse_or(&lookup, "LEG_HEIGHT_DEDUCTION", defaults.leg_height_deduction),
            countertop_deduction: parse_or(&lookup, "COUNTERTOP_DEDUCTION", defaults.countertop_deduction),
        };

        let ocr = non_empty(&lookup, "OCR_API_KEY").map(|api_key| OcrConfig {
            api_key,
            endpoint: non_empty(&lookup, "OCR_ENDPOINT").unwrap_or_else(|| DEFAULT_OCR_ENDPOINT.into()),
        });

        let reasoning = non_empty(&lookup, "REASONING_API_KEY")
            .or_else(|| non_empty(&lookup, "OPENAI_API_KEY"))
            .map(|api_key| ReasoningConfig {
                api_key,
                endpoint: non_empty(&lookup, "REASONING_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_REASONING_ENDPOINT.into()),
                model: non_empty(&lookup, "REASONING_MODEL")
                    .unwrap_or_else(|| DEFAULT_REASONING_MODEL.into()),
            });

        let sheet_width: f64 = parse_or(&lookup, "SHEET_WIDTH_MM", panelcut_core::layout::DEFAULT_SHEET_WIDTH);

        Self {
            port: parse_or(&lookup, "PORT", 8080),
            max_file_size_mb: parse_or(&lookup, "MAX_FILE_SIZE_MB", 20),
            request_timeout_secs: parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 150),
            collaborator_timeout_secs: parse_or(&lookup, "COLLABORATOR_TIMEOUT_SECS", 60),
            ocr,
            reasoning,
            selection_strategy: parse_choice(&lookup, "SELECTION_STRATEGY", parse_strategy),
            formula_set: parse_choice(&lookup, "FORMULA_SET", parse_formula_set),
            cabinet_profile: parse_choice(&lookup, "CABINET_PROFILE", parse_profile),
            width_tie_break: parse_choice(&lookup, "WIDTH_TIE_BREAK", parse_tie_break),
            sheet_width_mm: (sheet_width > 0.0).then_some(sheet_width),
            offsets,
        }
    }

    /// Analysis settings for one request, with its offset overrides applied.
    pub fn analysis_settings(&self, offsets: OffsetConfiguration) -> AnalysisSettings {
        AnalysisSettings {
            offsets,
            limits: self.cabinet_profile.limits(),
            formula_set: self.formula_set,
            strategy: self.selection_strategy,
            tie_break: self.width_tie_break,
            layout: LayoutConfig {
                sheet_width: self.sheet_width_mm,
                ..LayoutConfig::default()
            },
            ..AnalysisSettings::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_file_size_mb, 20);
        assert_eq!(config.collaborator_timeout_secs, 60);
        assert!(config.ocr.is_none());
        assert!(config.reasoning.is_none());
        assert_eq!(config.selection_strategy, SelectionStrategy::Delegated);
        assert_eq!(config.formula_set, FormulaSet::Standard);
        assert_eq!(config.sheet_width_mm, Some(2400.0));
        assert_eq!(config.offsets, OffsetConfiguration::default());
    }

    #[test]
    fn test_collaborators_and_choices() {
        let config = config(&[
            ("OCR_API_KEY", "ocr-key"),
            ("OPENAI_API_KEY", "fallback-key"),
            ("REASONING_MODEL", "gpt-4o-mini"),
            ("SELECTION_STRATEGY", "local"),
            ("FORMULA_SET", "Extended"),
            ("CABINET_PROFILE", "tall"),
            ("WIDTH_TIE_BREAK", "collaborator"),
            ("SHEET_WIDTH_MM", "0"),
            ("OFFSET_SHELF_DEPTH", "40"),
            ("LEG_HEIGHT_DEDUCTION", "lots"),
        ]);

        let ocr = config.ocr.as_ref().unwrap();
        assert_eq!(ocr.endpoint, DEFAULT_OCR_ENDPOINT);
        let reasoning = config.reasoning.as_ref().unwrap();
        assert_eq!(reasoning.api_key, "fallback-key");
        assert_eq!(reasoning.model, "gpt-4o-mini");

        assert_eq!(config.selection_strategy, SelectionStrategy::LocalHeuristic);
        assert_eq!(config.formula_set, FormulaSet::Extended);
        assert_eq!(config.width_tie_break, WidthTieBreak::PreferCollaborator);
        assert_eq!(config.sheet_width_mm, None);
        assert_eq!(config.offsets.shelf_depth_offset, 40);
        assert_eq!(config.offsets.leg_height_deduction, 100);

        let settings = config.analysis_settings(config.offsets);
        assert_eq!(settings.limits, DimensionLimits::tall());
        assert_eq!(settings.layout.sheet_width, None);
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let config = config(&[("OCR_API_KEY", "  "), ("REASONING_API_KEY", "")]);
        assert!(config.ocr.is_none());
        assert!(config.reasoning.is_none());
    }
}
