// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collaborator clients and the per-request analysis driver.

pub mod analyzer;
pub mod ocr;
pub mod reasoning;

pub use analyzer::analyze_drawing;
pub use ocr::{OcrClient, TextDetector};
pub use reasoning::{DrawingReasoner, ReasoningClient};
