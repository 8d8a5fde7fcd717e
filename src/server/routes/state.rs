//! Current slot state as JSON.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::server::state::AppState;
use crate::store::StateSnapshot;

/// GET /api/state - The same object new WebSocket clients receive first.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateSnapshot> {
    Json(state.engine.store().snapshot())
}
