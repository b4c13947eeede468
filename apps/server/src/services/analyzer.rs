// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drives one drawing through the collaborators and the core pipeline.

use panelcut_core::{
    parse_reasoning_reply, AnalysisError, AnalysisReport, AnalysisSettings, DrawingAnalysis,
};

use super::ocr::TextDetector;
use super::reasoning::DrawingReasoner;
use crate::error::CollaboratorError;

/// Analyze one uploaded image.
///
/// Every call builds its own [`DrawingAnalysis`]; nothing is shared
/// between requests. Collaborator failures end the run immediately with
/// a zeroed report, with no retries.
pub async fn analyze_drawing<D, R>(
    image: &[u8],
    detector: Option<&D>,
    reasoner: Option<&R>,
    settings: AnalysisSettings,
) -> AnalysisReport
where
    D: TextDetector,
    R: DrawingReasoner,
{
    let formula_set = settings.formula_set;
    let fail = |error: AnalysisError| {
        tracing::warn!(status = ?error.status(), "Analysis aborted: {}", error);
        AnalysisReport::failed(&error, formula_set)
    };

    let Some(detector) = detector else {
        return fail(CollaboratorError::NotConfigured { service: "OCR service" }.into());
    };
    let ocr = match detector.detect_text(image).await {
        Ok(ocr) => ocr,
        Err(e) => return fail(e.into()),
    };

    let analysis = DrawingAnalysis::from_ocr(&ocr, settings);
    tracing::info!(
        tokens = analysis.tokens().len(),
        usable = analysis.usable_token_count(),
        pairings = analysis.pairings().len(),
        "Classified drawing numbers"
    );
    if let Err(error) = analysis.check_signal() {
        return analysis.fail(&error);
    }

    if !analysis.needs_reasoning() {
        return analysis.complete(None);
    }

    let Some(reasoner) = reasoner else {
        return analysis.fail(
            &CollaboratorError::NotConfigured {
                service: "reasoning service",
            }
            .into(),
        );
    };
    let content = match reasoner.reason(image, &analysis.reasoning_prompt()).await {
        Ok(content) => content,
        Err(e) => return analysis.fail(&e.into()),
    };

    match parse_reasoning_reply(&content) {
        Ok(reply) => analysis.complete(Some(&reply)),
        Err(error) => analysis.fail(&error),
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::Mutex;

    use panelcut_core::OcrOutput;

    use super::*;

    /// Detector returning a fixed text block.
    pub struct FakeDetector(pub Result<OcrOutput, CollaboratorError>);

    impl FakeDetector {
        pub fn text(text: &str) -> Self {
            Self(Ok(OcrOutput {
                full_text: text.into(),
                regions: Vec::new(),
            }))
        }
    }

    impl TextDetector for FakeDetector {
        async fn detect_text(&self, _image: &[u8]) -> Result<OcrOutput, CollaboratorError> {
            self.0.clone()
        }
    }

    /// Reasoner returning a fixed reply and recording the prompt.
    pub struct FakeReasoner {
        pub reply: Result<String, CollaboratorError>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeReasoner {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: CollaboratorError) -> Self {
            Self {
                reply: Err(error),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl DrawingReasoner for FakeReasoner {
        async fn reason(&self, _image: &[u8], prompt: &str) -> Result<String, CollaboratorError> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            self.reply.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{FakeDetector, FakeReasoner};
    use super::*;
    use panelcut_core::{AnalysisStatus, FormulaSet, PanelCategory, SelectionStrategy};

    const CANONICAL_TEXT: &str = "1200\n675\n340\n3795\n32";
    const CANONICAL_REPLY: &str =
        r#"{"cabinet_width": 1200, "cabinet_total_height": 675, "cabinet_depth": 340}"#;

    #[tokio::test]
    async fn test_delegated_canonical() {
        let detector = FakeDetector::text(CANONICAL_TEXT);
        let reasoner = FakeReasoner::replying(CANONICAL_REPLY);

        let report = analyze_drawing(b"img", Some(&detector), Some(&reasoner), AnalysisSettings::default()).await;
        assert_eq!(report.status, AnalysisStatus::Success);

        let tb = report.cutting_list.get(PanelCategory::TopBottomShelf).unwrap();
        assert_eq!(tb.items[0].dimensions(), "1164×310");

        let prompts = reasoner.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[3795]"));
    }

    #[tokio::test]
    async fn test_missing_ocr() {
        let reasoner = FakeReasoner::replying(CANONICAL_REPLY);
        let report = analyze_drawing::<FakeDetector, _>(b"img", None, Some(&reasoner), AnalysisSettings::default()).await;
        assert_eq!(report.status, AnalysisStatus::CollaboratorUnavailable);
        assert_eq!(report.cutting_list.categories.len(), 4);
        assert!(reasoner.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ocr_failure() {
        let detector = FakeDetector(Err(CollaboratorError::Timeout { service: "OCR service" }));
        let reasoner = FakeReasoner::replying(CANONICAL_REPLY);
        let report = analyze_drawing(b"img", Some(&detector), Some(&reasoner), AnalysisSettings::default()).await;
        assert_eq!(report.status, AnalysisStatus::CollaboratorUnavailable);
    }

    #[tokio::test]
    async fn test_insufficient_signal_skips_reasoning() {
        let detector = FakeDetector::text("KITCHEN 18 32");
        let reasoner = FakeReasoner::replying(CANONICAL_REPLY);
        let settings = AnalysisSettings {
            formula_set: FormulaSet::Extended,
            ..AnalysisSettings::default()
        };
        let report = analyze_drawing(b"img", Some(&detector), Some(&reasoner), settings).await;

        assert_eq!(report.status, AnalysisStatus::InsufficientSignal);
        assert_eq!(report.cutting_list.categories.len(), 8);
        assert!(reasoner.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reasoning_failures() {
        let detector = FakeDetector::text(CANONICAL_TEXT);

        let down = FakeReasoner::failing(CollaboratorError::Status {
            service: "reasoning service",
            status: 503,
        });
        let report = analyze_drawing(b"img", Some(&detector), Some(&down), AnalysisSettings::default()).await;
        assert_eq!(report.status, AnalysisStatus::CollaboratorUnavailable);

        let chatty = FakeReasoner::replying("The cabinet looks about a metre wide.");
        let report = analyze_drawing(b"img", Some(&detector), Some(&chatty), AnalysisSettings::default()).await;
        assert_eq!(report.status, AnalysisStatus::MalformedCollaboratorResponse);
        assert!(report.cutting_list.is_empty());

        let report = analyze_drawing::<_, FakeReasoner>(b"img", Some(&detector), None, AnalysisSettings::default()).await;
        assert_eq!(report.status, AnalysisStatus::CollaboratorUnavailable);
    }

    #[tokio::test]
    async fn test_local_strategy_ignores_reasoner() {
        let detector = FakeDetector::text(CANONICAL_TEXT);
        let settings = AnalysisSettings {
            strategy: SelectionStrategy::LocalHeuristic,
            ..AnalysisSettings::default()
        };
        let report = analyze_drawing::<_, FakeReasoner>(b"img", Some(&detector), None, settings).await;
        assert_eq!(report.status, AnalysisStatus::Success);
        assert_eq!(report.cutting_list.total_pieces(), 6);
    }
}
