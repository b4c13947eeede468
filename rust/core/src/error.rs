// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::types::AnalysisStatus;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that end an analysis run early
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Insufficient signal: found {found} numeric tokens, need at least {required}")]
    InsufficientSignal { found: usize, required: usize },

    #[error("Invalid cabinet dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Malformed collaborator response: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    /// Status flag reported to callers for this failure
    pub fn status(&self) -> AnalysisStatus {
        match self {
            AnalysisError::CollaboratorUnavailable(_) => AnalysisStatus::CollaboratorUnavailable,
            AnalysisError::InsufficientSignal { .. } => AnalysisStatus::InsufficientSignal,
            AnalysisError::InvalidDimensions(_) => AnalysisStatus::ValidationFailure,
            AnalysisError::MalformedResponse(_) => AnalysisStatus::MalformedCollaboratorResponse,
        }
    }
}
