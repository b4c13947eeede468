// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP routes.

pub mod analyze;
pub mod config;
pub mod health;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::services::{DrawingReasoner, TextDetector};
use crate::AppState;

/// Build the application router with its middleware stack.
pub fn router<D, R>(state: AppState<D, R>) -> Router
where
    D: TextDetector + 'static,
    R: DrawingReasoner + 'static,
{
    let config = state.config.clone();

    Router::new()
        // Root endpoint - API information
        .route("/", get(health::info))
        .route("/api/v1/health", get(health::check::<D, R>))
        .route("/api/v1/config", get(config::defaults::<D, R>))
        .route("/api/v1/analyze", post(analyze::analyze::<D, R>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
                .layer(CompressionLayer::new())
                // Multipart overhead on top of the image itself
                .layer(DefaultBodyLimit::max(config.max_file_size_mb * 1024 * 1024 + 64 * 1024)),
        )
        .with_state(state)
}
