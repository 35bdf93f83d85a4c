use std::fmt;
use serde::{Deserialize, Serialize};

use super::transport::Transport;

pub const GRAPHQL_URL: &str = env!("GRAPHQL_URL");
pub const WSS_URL: &str = env!("WSS_URL");

/// The only topic the dashboard subscribes to.
pub const TRANSPORT_UPDATE_CHANNEL: &str = "transportUpdate";

pub const TRANSPORTS_QUERY: &str = r#"
  query GetTransports {
    transports {
      id
      orderNo
      route { from to }
      status
      eta
      planEta
      delay
      position { lat lng address }
      cargo
      driver
      progress
      riskScore
    }
  }
"#;

/* Server Requests */
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WsRequest {
  Subscribe { channel: String }
}

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
  pub query: &'a str
}

/* Server Responses */

/// Raw `{ type, payload }` envelope, typed later by the channel.
#[derive(Debug, Deserialize)]
pub struct WsEnvelope {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub payload: serde_json::Value
}

#[derive(Debug, Deserialize)]
pub struct SubscribedPayload {
  pub channel: String
}

#[derive(Debug, Deserialize)]
pub struct ServerErrorPayload {
  pub message: String
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
  pub data: Option<TransportsData>,
  pub errors: Option<Vec<GraphQlError>>
}

#[derive(Debug, Deserialize)]
pub struct TransportsData {
  pub transports: Option<Vec<Transport>>
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
  pub message: String
}

impl GraphQlResponse {
  /// Structured errors win over data, like the query endpoint's own clients expect.
  pub fn into_transports(self) -> Result<Vec<Transport>, AppError> {
    if let Some(first) = self.errors.and_then(|errs| errs.into_iter().next()) {
      return Err(AppError::FetchError(first.message));
    }
    self.data
      .and_then(|d| d.transports)
      .ok_or_else(|| AppError::FetchError("response carried no transports".to_string()))
  }
}

// App Errors
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
  FetchError(String),
  WsConnectionError(String),
  WsChannelError(String),
  SerializeError(String),
  StorageError(String),
  WebhookMissing(String),
  WebhookError(String),
  WasmError(String),
}

impl std::error::Error for AppError {}

impl fmt::Display for AppError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AppError::FetchError(msg) => write!(f, "{}", msg),
      AppError::WsConnectionError(msg) => write!(f, "Websocket connection error: {}", msg),
      AppError::WsChannelError(msg) => write!(f, "Websocket update channel error: {}", msg),
      AppError::SerializeError(msg) => write!(f, "Serialize error: {}", msg),
      AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
      AppError::WebhookMissing(key) => write!(f, "No webhook URL configured for {}", key),
      AppError::WebhookError(msg) => write!(f, "Webhook error: {}", msg),
      AppError::WasmError(msg) => write!(f, "Wasm error: {}", msg),
    }
  }
}
