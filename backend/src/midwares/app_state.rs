use std::{env, sync::Arc, time::Duration};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use tokio::sync::{broadcast, RwLock};

use crate::fleet_generator::{gen::FleetSimulator, model::TransportUpdate};

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_INTERVAL_MS: u64 = 750;
// updates buffered per subscriber before it starts lagging
const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Serialize, Clone)]
pub enum AppError {
  DeserializeError(String),
  BadRequest(String),
  InternalError(String),
}

impl std::fmt::Display for AppError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::DeserializeError(msg) => write!(f, "deserialize error: {}", msg),
      Self::BadRequest(msg) => write!(f, "bad request: {}", msg),
      Self::InternalError(msg) => write!(f, "internal error: {}", msg),
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> axum::response::Response {
    let (status, message) = match self {
      Self::DeserializeError(msg) => (StatusCode::BAD_REQUEST, msg),
      Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
      Self::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
    };

    let body = Json(json!({"error": message, "code": status.as_u16()}));

    (status, body).into_response()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
  pub port: u16,
  pub interval: Duration,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self { port: DEFAULT_PORT, interval: Duration::from_millis(DEFAULT_INTERVAL_MS) }
  }
}

impl FeedConfig {
  /// `FEED_PORT` and `FEED_INTERVAL_MS`, falling back to the defaults when unset.
  pub fn from_env() -> Result<Self, AppError> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
    let port = match lookup("FEED_PORT") {
      Some(raw) => raw.trim().parse::<u16>()
        .map_err(|e| AppError::InternalError(format!("FEED_PORT={:?} is not a port: {}", raw, e)))?,
      None => DEFAULT_PORT,
    };
    let interval_ms = match lookup("FEED_INTERVAL_MS") {
      Some(raw) => raw.trim().parse::<u64>()
        .map_err(|e| AppError::InternalError(format!("FEED_INTERVAL_MS={:?} is not a number: {}", raw, e)))?,
      None => DEFAULT_INTERVAL_MS,
    };
    if interval_ms == 0 {
      return Err(AppError::InternalError("FEED_INTERVAL_MS must be above zero".to_string()));
    }
    Ok(Self { port, interval: Duration::from_millis(interval_ms) })
  }
}

/// Shared by every handler: the simulated fleet and the update fan-out.
#[derive(Clone)]
pub struct AppState {
  pub simulator: Arc<RwLock<FleetSimulator>>,
  pub updates: broadcast::Sender<TransportUpdate>,
}

impl AppState {
  pub fn new(simulator: FleetSimulator) -> Self {
    let (updates, _) = broadcast::channel(BROADCAST_CAPACITY);
    Self { simulator: Arc::new(RwLock::new(simulator)), updates }
  }
}
