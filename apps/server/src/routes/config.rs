// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Default settings endpoint.

use axum::{extract::State, Json};

use crate::types::ConfigResponse;
use crate::AppState;

/// GET /api/v1/config - Defaults each analysis starts from.
pub async fn defaults<D, R>(State(state): State<AppState<D, R>>) -> Json<ConfigResponse> {
    let config = &state.config;
    Json(ConfigResponse {
        offsets: config.offsets,
        formula_set: config.formula_set,
        cabinet_profile: config.cabinet_profile,
        limits: config.cabinet_profile.limits(),
        selection_strategy: config.selection_strategy,
        width_tie_break: config.width_tie_break,
        sheet_width_mm: config.sheet_width_mm,
    })
}
