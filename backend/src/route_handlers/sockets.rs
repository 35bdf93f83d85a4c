use std::net::SocketAddr;
use axum::{
  extract::{ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket}, ConnectInfo, State, WebSocketUpgrade},
  response::IntoResponse
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{fleet_generator::model::TransportUpdate, midwares::app_state::{AppError, AppState}};

pub const TRANSPORT_UPDATE_CHANNEL: &str = "transportUpdate";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum WsRequest {
  Subscribe { channel: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WsResponse {
  Subscribed { channel: String },
  Error { message: String },
  TransportUpdate(TransportUpdate),
}

/// Ok with the channel name for a valid subscribe, Err with the message to send back.
fn parse_subscribe(text: &str) -> Result<String, String> {
  match serde_json::from_str::<WsRequest>(text) {
    Ok(WsRequest::Subscribe { channel }) if channel == TRANSPORT_UPDATE_CHANNEL => Ok(channel),
    Ok(WsRequest::Subscribe { channel }) => Err(format!("unknown channel: {}", channel)),
    Err(e) => Err(format!("unsupported message: {}", e)),
  }
}

pub async fn ws_handler(
  ws: WebSocketUpgrade,
  State(state): State<AppState>,
  ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
  info!("client at {} connected", addr);
  ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
}

async fn handle_socket(socket: WebSocket, state: AppState, who: SocketAddr) {
  let (mut sender, mut receiver) = socket.split();
  // filled on the first valid subscribe
  let mut updates: Option<broadcast::Receiver<TransportUpdate>> = None;

  loop {
    tokio::select! {
      msg = receiver.next() => {
        match msg {
          Some(Ok(Message::Text(t))) => {
            debug!(">>> {} sent: {}", who, t.as_str());
            let reply = match parse_subscribe(t.as_str()) {
              Ok(channel) => {
                if updates.is_none() {
                  updates = Some(state.updates.subscribe());
                  info!("{} subscribed to {}", who, channel);
                }
                WsResponse::Subscribed { channel }
              },
              Err(message) => {
                warn!("{} sent a bad subscribe: {}", who, message);
                WsResponse::Error { message }
              }
            };
            if let Err(e) = send_json(&mut sender, &reply).await {
              warn!("reply to {} failed: {}", who, e);
              break;
            }
          },
          Some(Ok(Message::Close(_))) | None => {
            info!(">> {} closed the connection", who);
            break;
          },
          Some(Ok(_)) => debug!(">> {} sent Binary, Ping or Pong", who),
          Some(Err(e)) => {
            warn!("socket error from {}: {}", who, e);
            break;
          }
        }
      }

      update = next_update(&mut updates) => {
        match update {
          Ok(update) => {
            if let Err(e) = send_json(&mut sender, &WsResponse::TransportUpdate(update)).await {
              warn!("pushing update to {} failed: {}", who, e);
              break;
            }
          },
          Err(RecvError::Lagged(skipped)) => warn!("{} is lagging, skipped {} updates", who, skipped),
          Err(RecvError::Closed) => {
            graceful_ws_closure(sender, close_code::AWAY, "update feed stopped").await;
            break;
          }
        }
      }
    }
  }

  info!("Websocket context destroyed for: {}", who);
}

// never resolves until the client has subscribed
async fn next_update(updates: &mut Option<broadcast::Receiver<TransportUpdate>>) -> Result<TransportUpdate, RecvError> {
  match updates {
    Some(rx) => rx.recv().await,
    None => std::future::pending().await,
  }
}

async fn send_json(sender: &mut SplitSink<WebSocket, Message>, response: &WsResponse) -> Result<(), AppError> {
  let json_data = serde_json::to_string(response).map_err(|e| AppError::InternalError(e.to_string()))?;
  sender.send(Message::text(json_data)).await.map_err(|e| AppError::InternalError(e.to_string()))
}

// helper to close the Websocket gracefully
async fn graceful_ws_closure(mut sender: SplitSink<WebSocket, Message>, code: u16, reason_str: &'static str) {
  if let Err(e) = sender.send(Message::Close(Some(CloseFrame {
    code,
    reason: Utf8Bytes::from_static(reason_str)
  }))).await {
    warn!("error sending close frame: {}", e);
  }
  if let Err(e) = sender.flush().await {
    warn!("error flushing sender: {}", e);
  };
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use super::*;

  #[test]
  fn accepts_transport_update_subscription() {
    assert_eq!(parse_subscribe(r#"{"type":"subscribe","channel":"transportUpdate"}"#), Ok("transportUpdate".to_string()));
  }

  #[test]
  fn rejects_unknown_channel_and_garbage() {
    assert_eq!(parse_subscribe(r#"{"type":"subscribe","channel":"prices"}"#), Err("unknown channel: prices".to_string()));
    assert!(parse_subscribe(r#"{"type":"unsubscribe","channel":"transportUpdate"}"#).is_err());
    assert!(parse_subscribe("hello").is_err());
  }

  #[test]
  fn responses_use_type_and_payload_envelope() {
    let ack = serde_json::to_value(WsResponse::Subscribed { channel: "transportUpdate".to_string() }).expect("serializes");
    assert_eq!(ack, json!({"type": "subscribed", "payload": {"channel": "transportUpdate"}}));

    let err = serde_json::to_value(WsResponse::Error { message: "unknown channel: x".to_string() }).expect("serializes");
    assert_eq!(err, json!({"type": "error", "payload": {"message": "unknown channel: x"}}));

    let update = TransportUpdate { id: "T-003".to_string(), progress: Some(21), ..Default::default() };
    let frame = serde_json::to_value(WsResponse::TransportUpdate(update)).expect("serializes");
    assert_eq!(frame, json!({"type": "transportUpdate", "payload": {"id": "T-003", "progress": 21}}));
  }

  #[tokio::test]
  async fn unsubscribed_socket_waits_for_updates() {
    let mut none: Option<broadcast::Receiver<TransportUpdate>> = None;
    let waited = tokio::time::timeout(std::time::Duration::from_millis(20), next_update(&mut none)).await;
    assert!(waited.is_err());

    let (tx, rx) = broadcast::channel(4);
    let mut some = Some(rx);
    tx.send(TransportUpdate { id: "T-001".to_string(), delay: Some(3), ..Default::default() }).expect("receiver alive");
    let got = next_update(&mut some).await.expect("update delivered");
    assert_eq!(got.id, "T-001");
  }
}
