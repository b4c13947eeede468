// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Panelcut Server - cabinet drawing analysis over HTTP.
//!
//! Accepts an elevation drawing image, reads its numbers through an OCR
//! service, resolves the cabinet dimensions (optionally with a reasoning
//! service), and returns a per-category cutting list plus a packed DXF
//! cut layout.
//!
//! # Endpoints
//!
//! - `GET /` - API information
//! - `GET /api/v1/health` - Health check and collaborator status
//! - `GET /api/v1/config` - Default offsets and analysis settings
//! - `POST /api/v1/analyze` - Analyze a drawing (multipart `file`)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;
use services::{OcrClient, ReasoningClient};

/// Application state shared across handlers.
///
/// Holds configuration and collaborator clients only; analysis state is
/// created per request.
pub struct AppState<D = OcrClient, R = ReasoningClient> {
    pub config: Arc<Config>,
    pub detector: Option<Arc<D>>,
    pub reasoner: Option<Arc<R>>,
}

impl<D, R> Clone for AppState<D, R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            detector: self.detector.clone(),
            reasoner: self.reasoner.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,panelcut_server=debug")),
        )
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        max_file_size_mb = config.max_file_size_mb,
        ocr_configured = config.ocr.is_some(),
        reasoning_configured = config.reasoning.is_some(),
        selection_strategy = ?config.selection_strategy,
        formula_set = ?config.formula_set,
        "Starting Panelcut Server"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.collaborator_timeout_secs))
        .build()
        .context("failed to build collaborator HTTP client")?;

    let detector = config
        .ocr
        .as_ref()
        .map(|ocr| Arc::new(OcrClient::new(http.clone(), ocr)));
    let reasoner = config
        .reasoning
        .as_ref()
        .map(|reasoning| Arc::new(ReasoningClient::new(http.clone(), reasoning)));

    if detector.is_none() {
        tracing::warn!("OCR_API_KEY not set; every analysis will report collaborator_unavailable");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState {
        config: Arc::new(config),
        detector,
        reasoner,
    };
    let app = routes::router(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
