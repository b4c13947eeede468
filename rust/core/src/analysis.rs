// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One analysis run, from tokens to a packed cutting list
//!
//! A [`DrawingAnalysis`] is built per drawing and dropped afterwards. It
//! classifies tokens and finds segment pairings up front; the caller then
//! fetches a reasoning reply if the strategy needs one and calls
//! [`DrawingAnalysis::complete`]. Every failure folds into an
//! [`AnalysisReport`] with a status flag and a zeroed cutting list.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::aggregate::{empty_cutting_list, summarize};
use crate::classifier::{classify_tokens, is_cabinet_scale};
use crate::dxf_export::{render_dxf, ExportError};
use crate::error::{AnalysisError, Result};
use crate::formula::{generate_panels, CabinetFeatures, FormulaSet};
use crate::layout::{pack_cutting_list, LayoutConfig, SheetLayout};
use crate::pairing::detect_segment_pairings;
use crate::reasoning::{build_reasoning_prompt, ReasoningReply};
use crate::selector::{
    select_delegated, select_local, Confidence, Selection, SelectionStrategy, WidthSource,
    WidthTieBreak,
};
use crate::tokens::extract_numeric_tokens;
use crate::types::{
    AnalysisStatus, CabinetDimensions, CuttingList, DimensionCandidateSet, DimensionLimits,
    NumericToken, OcrOutput, OffsetConfiguration, SegmentPairing,
};

/// Fewer usable tokens than this and the run stops
pub const MIN_USABLE_TOKENS: usize = 3;

/// Everything that parameterizes a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSettings {
    pub offsets: OffsetConfiguration,
    pub limits: DimensionLimits,
    pub formula_set: FormulaSet,
    pub strategy: SelectionStrategy,
    pub tie_break: WidthTieBreak,
    pub layout: LayoutConfig,
    pub min_tokens: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            offsets: OffsetConfiguration::default(),
            limits: DimensionLimits::base(),
            formula_set: FormulaSet::Standard,
            strategy: SelectionStrategy::Delegated,
            tie_break: WidthTieBreak::PreferSegmentSum,
            layout: LayoutConfig::default(),
            min_tokens: MIN_USABLE_TOKENS,
        }
    }
}

/// Outcome of a run, successful or not
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    pub status: AnalysisStatus,
    pub message: String,
    pub dimensions: Option<CabinetDimensions>,
    pub width_source: Option<WidthSource>,
    pub confidence: Option<Confidence>,
    pub features: Option<CabinetFeatures>,
    pub pairings: Vec<SegmentPairing>,
    pub cutting_list: CuttingList,
    pub layout: Option<SheetLayout>,
}

impl AnalysisReport {
    /// Zeroed report for a run that stopped with `error`
    pub fn failed(error: &AnalysisError, formula_set: FormulaSet) -> Self {
        Self {
            status: error.status(),
            message: error.to_string(),
            dimensions: None,
            width_source: None,
            confidence: None,
            features: None,
            pairings: Vec::new(),
            cutting_list: empty_cutting_list(formula_set.categories()),
            layout: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AnalysisStatus::Success
    }

    /// DXF text of the packed layout, `None` for failed runs
    pub fn layout_document(
        &self,
        generated_at: &NaiveDateTime,
    ) -> std::result::Result<Option<String>, ExportError> {
        self.layout
            .as_ref()
            .map(|layout| render_dxf(layout, generated_at))
            .transpose()
    }
}

/// Per-drawing analysis state
#[derive(Debug, Clone)]
pub struct DrawingAnalysis {
    settings: AnalysisSettings,
    tokens: Vec<NumericToken>,
    candidates: DimensionCandidateSet,
    pairings: Vec<SegmentPairing>,
}

impl DrawingAnalysis {
    pub fn from_ocr(ocr: &OcrOutput, settings: AnalysisSettings) -> Self {
        Self::from_tokens(extract_numeric_tokens(ocr), settings)
    }

    pub fn from_tokens(tokens: Vec<NumericToken>, settings: AnalysisSettings) -> Self {
        let candidates = classify_tokens(&tokens);
        let pairings = detect_segment_pairings(&candidates.segment_candidates);
        Self {
            settings,
            tokens,
            candidates,
            pairings,
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn tokens(&self) -> &[NumericToken] {
        &self.tokens
    }

    pub fn candidates(&self) -> &DimensionCandidateSet {
        &self.candidates
    }

    pub fn pairings(&self) -> &[SegmentPairing] {
        &self.pairings
    }

    /// Tokens that could be a cabinet dimension
    pub fn usable_token_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| is_cabinet_scale(t.value))
            .count()
    }

    /// Stop early when the drawing carries too few numbers
    pub fn check_signal(&self) -> Result<()> {
        let found = self.usable_token_count();
        if found < self.settings.min_tokens {
            return Err(AnalysisError::InsufficientSignal {
                found,
                required: self.settings.min_tokens,
            });
        }
        Ok(())
    }

    /// Whether [`complete`](Self::complete) expects a reasoning reply
    pub fn needs_reasoning(&self) -> bool {
        self.settings.strategy == SelectionStrategy::Delegated
    }

    pub fn reasoning_prompt(&self) -> String {
        build_reasoning_prompt(&self.settings.offsets, &self.candidates, &self.pairings)
    }

    pub fn select(&self, reply: Option<&ReasoningReply>) -> Result<Selection> {
        let settings = &self.settings;
        match settings.strategy {
            SelectionStrategy::Delegated => {
                let reply = reply.ok_or_else(|| {
                    AnalysisError::CollaboratorUnavailable("no reasoning reply".into())
                })?;
                select_delegated(
                    reply,
                    &self.pairings,
                    &settings.offsets,
                    &settings.limits,
                    settings.tie_break,
                )
            }
            SelectionStrategy::LocalHeuristic => select_local(
                &self.candidates,
                &self.pairings,
                &settings.offsets,
                &settings.limits,
                settings.tie_break,
            ),
        }
    }

    /// Formulas, aggregation and packing for a resolved cabinet
    pub fn build_report(&self, selection: Selection) -> AnalysisReport {
        let settings = &self.settings;
        let panels = generate_panels(
            &selection.dimensions,
            &settings.offsets,
            settings.formula_set,
            &selection.features,
        );
        let cutting_list = summarize(&panels, settings.formula_set.categories());
        let layout = pack_cutting_list(&cutting_list, &settings.layout);

        AnalysisReport {
            status: AnalysisStatus::Success,
            message: format!(
                "Generated {} pieces in {} categories",
                cutting_list.total_pieces(),
                cutting_list.populated_categories()
            ),
            dimensions: Some(selection.dimensions),
            width_source: Some(selection.width_source),
            confidence: Some(selection.confidence),
            features: Some(selection.features),
            pairings: self.pairings.clone(),
            cutting_list,
            layout: Some(layout),
        }
    }

    /// Report for a run that stopped early
    pub fn fail(&self, error: &AnalysisError) -> AnalysisReport {
        tracing::warn!(status = ?error.status(), "Analysis aborted: {}", error);
        let mut report = AnalysisReport::failed(error, self.settings.formula_set);
        report.pairings = self.pairings.clone();
        report
    }

    /// Run the rest of the pipeline. Never fails; see the report status.
    pub fn complete(&self, reply: Option<&ReasoningReply>) -> AnalysisReport {
        let outcome = self.check_signal().and_then(|_| self.select(reply));
        match outcome {
            Ok(selection) => self.build_report(selection),
            Err(error) => self.fail(&error),
        }
    }
}

/// Local-heuristic run over already extracted tokens
pub fn analyze_tokens(tokens: Vec<NumericToken>, settings: AnalysisSettings) -> AnalysisReport {
    let settings = AnalysisSettings {
        strategy: SelectionStrategy::LocalHeuristic,
        ..settings
    };
    DrawingAnalysis::from_tokens(tokens, settings).complete(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::parse_reasoning_reply;
    use crate::types::PanelCategory;

    fn tokens(values: &[f64]) -> Vec<NumericToken> {
        values.iter().copied().map(NumericToken::new).collect()
    }

    #[test]
    fn test_insufficient_signal() {
        let analysis = DrawingAnalysis::from_tokens(tokens(&[1200.0, 18.0, 4000.0]), AnalysisSettings::default());
        assert_eq!(analysis.usable_token_count(), 1);

        let report = analysis.complete(None);
        assert_eq!(report.status, AnalysisStatus::InsufficientSignal);
        assert_eq!(report.cutting_list.categories.len(), 4);
        assert!(report.cutting_list.is_empty());
        assert!(report.layout.is_none());
    }

    #[test]
    fn test_delegated_without_reply() {
        let analysis =
            DrawingAnalysis::from_tokens(tokens(&[1200.0, 675.0, 340.0]), AnalysisSettings::default());
        assert!(analysis.needs_reasoning());
        let report = analysis.complete(None);
        assert_eq!(report.status, AnalysisStatus::CollaboratorUnavailable);
    }

    #[test]
    fn test_delegated_run() {
        let analysis =
            DrawingAnalysis::from_tokens(tokens(&[1200.0, 675.0, 340.0]), AnalysisSettings::default());
        let reply = parse_reasoning_reply(
            r#"{"cabinet_width": 1200, "cabinet_total_height": 675, "cabinet_depth": 340}"#,
        )
        .unwrap();

        let report = analysis.complete(Some(&reply));
        assert!(report.is_success());
        assert_eq!(report.confidence, Some(Confidence::High));
        assert_eq!(report.cutting_list.total_pieces(), 6);

        let back = report.cutting_list.get(PanelCategory::Back).unwrap();
        assert_eq!(back.items[0].dimensions(), "550×1164");

        let layout = report.layout.as_ref().unwrap();
        assert_eq!(layout.placements.len(), 6);
    }

    #[test]
    fn test_invalid_reply_dimensions() {
        let analysis =
            DrawingAnalysis::from_tokens(tokens(&[1200.0, 675.0, 340.0]), AnalysisSettings::default());
        let reply = parse_reasoning_reply(
            r#"{"cabinet_width": 2001, "cabinet_total_height": 675, "cabinet_depth": 340}"#,
        )
        .unwrap();

        let report = analysis.complete(Some(&reply));
        assert_eq!(report.status, AnalysisStatus::ValidationFailure);
        assert!(report.cutting_list.is_empty());
    }

    #[test]
    fn test_analyze_tokens_local() {
        let report = analyze_tokens(
            tokens(&[1200.0, 675.0, 340.0, 18.0]),
            AnalysisSettings {
                formula_set: FormulaSet::Extended,
                ..AnalysisSettings::default()
            },
        );
        assert!(report.is_success());
        assert_eq!(report.confidence, Some(Confidence::Low));
        assert_eq!(report.cutting_list.categories.len(), 8);
        assert!(report.cutting_list.get(PanelCategory::DoorFace).unwrap().total_pieces > 0);
    }

    #[test]
    fn test_runs_are_independent() {
        let settings = AnalysisSettings {
            strategy: SelectionStrategy::LocalHeuristic,
            ..AnalysisSettings::default()
        };
        let first = DrawingAnalysis::from_tokens(tokens(&[1200.0, 675.0, 340.0]), settings.clone()).complete(None);
        let second = DrawingAnalysis::from_tokens(tokens(&[1200.0, 675.0, 340.0]), settings).complete(None);
        assert_eq!(first, second);
        assert_eq!(first.cutting_list.get(PanelCategory::Gable).unwrap().items[0].part_id, "GABLE-01");
    }
}
