use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::midwares::app_state::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct GraphQlRequest {
  #[serde(default)]
  pub query: String,
}

// the only root field this endpoint serves
const TRANSPORTS_FIELD: &str = "transports";

fn selects_transports(query: &str) -> bool {
  query
    .split(|c: char| !c.is_alphanumeric() && c != '_')
    .any(|word| word == TRANSPORTS_FIELD)
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
  let emitted = state.simulator.read().await.emitted();
  (StatusCode::OK, Json(json!({"code": 200, "status": "ok", "updatesEmitted": emitted})))
}

/// GraphQL-shaped snapshot endpoint: `{data: {transports}}` or `{errors: [{message}]}`.
pub async fn graphql_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, AppError> {
  let request: GraphQlRequest = serde_json::from_slice(&body)
    .map_err(|e| AppError::DeserializeError(format!("invalid query body: {}", e)))?;

  if request.query.trim().is_empty() {
    return Err(AppError::BadRequest("query must not be empty".to_string()));
  }

  if !selects_transports(&request.query) {
    debug!("rejecting query without a transports selection: {}", request.query);
    return Ok(Json(json!({
      "errors": [{ "message": format!("Cannot query anything but '{}' on this endpoint", TRANSPORTS_FIELD) }]
    })));
  }

  let transports = state.simulator.read().await.snapshot();
  info!("serving snapshot of {} transports", transports.len());
  Ok(Json(json!({ "data": { "transports": transports } })))
}
