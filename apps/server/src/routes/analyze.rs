// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drawing analysis endpoint.

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::NaiveDateTime;
use panelcut_core::{AnalysisReport, OffsetConfiguration};
use sha2::{Digest, Sha256};

use crate::error::ApiError;
use crate::services::{analyze_drawing, DrawingReasoner, TextDetector};
use crate::types::{AnalyzeResponse, LayoutDocument, OffsetOverrides, ResultSummary};
use crate::AppState;

/// Hex SHA256 of the upload.
pub fn image_fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Body-limit rejections surface as multipart errors; report them as
/// an oversize upload.
fn upload_error(err: MultipartError, max_mb: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::FileTooLarge { max_mb }
    } else {
        ApiError::Multipart(err)
    }
}

/// Read the image and any offset override fields from the form.
async fn extract_upload(
    multipart: &mut Multipart,
    overrides: &mut OffsetOverrides,
    max_mb: usize,
) -> Result<Vec<u8>, ApiError> {
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, max_mb))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        tracing::debug!(field_name = %field_name, "Processing multipart field");

        if field_name == "file" {
            let bytes = field.bytes().await.map_err(|e| upload_error(e, max_mb))?;
            tracing::debug!(size = bytes.len(), "Extracted file from multipart");
            file = Some(bytes.to_vec());
        } else if OffsetOverrides::is_field(&field_name) {
            let value = field.text().await.map_err(|e| upload_error(e, max_mb))?;
            overrides.set(&field_name, &value)?;
        }
    }

    match file {
        Some(data) if !data.is_empty() => Ok(data),
        _ => {
            tracing::warn!("No 'file' field found in multipart request");
            Err(ApiError::MissingFile)
        }
    }
}

/// Turn a report into the wire response, rendering the DXF layout.
pub fn build_response(
    report: AnalysisReport,
    image_sha256: String,
    offsets: OffsetConfiguration,
    generated_at: &NaiveDateTime,
    processing_time_ms: u64,
) -> Result<AnalyzeResponse, ApiError> {
    let layout = report
        .layout_document(generated_at)?
        .map(|dxf| LayoutDocument {
            format: "dxf".to_string(),
            filename: format!("cutting_list_{}.dxf", generated_at.format("%Y%m%d_%H%M%S")),
            content_base64: STANDARD.encode(dxf.as_bytes()),
        });

    Ok(AnalyzeResponse {
        status: report.status,
        message: report.message,
        image_sha256,
        dimensions: report.dimensions,
        width_source: report.width_source,
        confidence: report.confidence,
        features: report.features,
        pairings: report.pairings.into_iter().map(|p| p.description).collect(),
        offsets,
        summary: ResultSummary::of(&report.cutting_list),
        results: report.cutting_list,
        layout,
        processing_time_ms,
    })
}

/// POST /api/v1/analyze - Analyze one drawing image.
pub async fn analyze<D, R>(
    State(state): State<AppState<D, R>>,
    Query(query): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError>
where
    D: TextDetector + 'static,
    R: DrawingReasoner + 'static,
{
    let start = Instant::now();

    let mut form_overrides = OffsetOverrides::default();
    let data = extract_upload(&mut multipart, &mut form_overrides, state.config.max_file_size_mb).await?;

    if data.len() > state.config.max_file_size_mb * 1024 * 1024 {
        return Err(ApiError::FileTooLarge {
            max_mb: state.config.max_file_size_mb,
        });
    }

    let mut query_overrides = OffsetOverrides::default();
    for (name, value) in &query {
        query_overrides.set(name, value)?;
    }
    let offsets = form_overrides
        .merge(query_overrides)
        .apply(state.config.offsets);

    let image_sha256 = image_fingerprint(&data);
    tracing::info!(image_sha256 = %image_sha256, size = data.len(), "Analyzing drawing");

    let report = analyze_drawing(
        &data,
        state.detector.as_deref(),
        state.reasoner.as_deref(),
        state.config.analysis_settings(offsets),
    )
    .await;

    let generated_at = chrono::Local::now().naive_local();
    let processing_time_ms = start.elapsed().as_millis() as u64;

    // DXF rendering is CPU work
    let response = tokio::task::spawn_blocking(move || {
        build_response(report, image_sha256, offsets, &generated_at, processing_time_ms)
    })
    .await??;

    tracing::info!(
        status = ?response.status,
        total_pieces = response.summary.total_pieces,
        processing_time_ms,
        "Analysis complete"
    );

    Ok(Json(response))
}
