// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Panelcut Core
//!
//! Turns the numbers read off a cabinet elevation drawing into a
//! workshop cutting list and a packed DXF cut layout.
//!
//! ## Overview
//!
//! The pipeline is synchronous and pure; network collaborators (OCR and
//! the reasoning service) live in the server and hand their results in:
//!
//! - **Token extraction**: numeric literals scanned with [nom](https://docs.rs/nom)
//! - **Number classification**: range buckets for width, height, depth,
//!   door/drawer segments, room dimensions and hardware values
//! - **Segment pairing**: `600 | 600` style widths summed into one candidate
//! - **Dimension selection**: delegated to the reasoning reply, or a
//!   low-confidence local heuristic
//! - **Panel formulas**: per-shop offsets applied to gables, top/bottom,
//!   backs and shelves, plus fronts and internals in the extended set
//! - **Aggregation and packing**: per-category totals and a row-based
//!   sheet layout rendered with [dxf](https://docs.rs/dxf)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use panelcut_core::{analyze_tokens, AnalysisSettings, NumericToken};
//!
//! let tokens = [1200.0, 675.0, 340.0, 18.0]
//!     .into_iter()
//!     .map(NumericToken::new)
//!     .collect();
//! let report = analyze_tokens(tokens, AnalysisSettings::default());
//!
//! for category in &report.cutting_list.categories {
//!     println!("{}: {} pieces", category.label, category.total_pieces);
//! }
//! ```
//!
//! ## Delegated Selection
//!
//! ```rust,ignore
//! use panelcut_core::{parse_reasoning_reply, AnalysisSettings, DrawingAnalysis};
//!
//! let analysis = DrawingAnalysis::from_ocr(&ocr, AnalysisSettings::default());
//! if let Err(error) = analysis.check_signal() {
//!     return analysis.fail(&error);
//! }
//! let content = ask_collaborator(&image, &analysis.reasoning_prompt()).await?;
//! let report = match parse_reasoning_reply(&content) {
//!     Ok(reply) => analysis.complete(Some(&reply)),
//!     Err(error) => analysis.fail(&error),
//! };
//! ```

pub mod aggregate;
pub mod analysis;
pub mod classifier;
pub mod dxf_export;
pub mod error;
pub mod formula;
pub mod layout;
pub mod pairing;
pub mod reasoning;
pub mod selector;
pub mod tokens;
pub mod types;

pub use aggregate::{empty_cutting_list, summarize};
pub use analysis::{analyze_tokens, AnalysisReport, AnalysisSettings, DrawingAnalysis, MIN_USABLE_TOKENS};
pub use classifier::classify_tokens;
pub use dxf_export::{build_drawing, render_dxf, title_text, ExportError};
pub use error::{AnalysisError, Result};
pub use formula::{generate_panels, CabinetFeatures, CuttingListBuilder, FormulaSet};
pub use layout::{pack_cutting_list, CategoryHeader, LayoutConfig, SheetLayout};
pub use pairing::{detect_segment_pairings, matches_any_pairing};
pub use reasoning::{build_reasoning_prompt, parse_reasoning_reply, ReasoningReply};
pub use selector::{
    select_delegated, select_local, Confidence, Selection, SelectionStrategy, WidthSource,
    WidthTieBreak,
};
pub use tokens::{extract_numeric_tokens, scan_numbers};
pub use types::{
    AnalysisStatus, CabinetDimensions, CategorySummary, CuttingList, DimensionCandidateSet,
    DimensionLimits, LayoutPlacement, MmRange, NumericToken, OcrOutput, OffsetConfiguration,
    Panel, PanelCategory, Point2D, SegmentPairing, TextRegion,
};
