// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use axum::{extract::State, Json};
use panelcut_core::SelectionStrategy;
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub ocr_configured: bool,
    pub reasoning_configured: bool,
    pub selection_strategy: SelectionStrategy,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// GET /api/v1/health - Health check with collaborator status.
pub async fn check<D, R>(State(state): State<AppState<D, R>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "panelcut-server",
        ocr_configured: state.detector.is_some(),
        reasoning_configured: state.reasoner.is_some(),
        selection_strategy: state.config.selection_strategy,
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "panelcut-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Cabinet drawing analysis: cutting lists and DXF cut layouts",
        endpoints: vec![
            EndpointInfo {
                method: "GET",
                path: "/api/v1/health",
                description: "Health check and collaborator status",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/config",
                description: "Default workshop offsets and analysis settings",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/analyze",
                description: "Analyze a drawing image (multipart `file`, optional offset overrides)",
            },
        ],
    })
}
