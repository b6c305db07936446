use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = if state.store.ping().await { "Connected" } else { "Disconnected" };
    Json(json!({
        "message": "Server is running!",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "database": database,
    }))
}
