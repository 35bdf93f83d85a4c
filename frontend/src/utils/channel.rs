use std::time::Duration;

use super::{
  server::{ServerErrorPayload, SubscribedPayload, WsEnvelope, WsRequest, TRANSPORT_UPDATE_CHANNEL},
  transport::TransportUpdate
};

/// Fixed delay before the single reconnect attempt after a drop.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
  Disconnected,
  Connecting,
  Connected
}

/// Typed form of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
  Subscribed { channel: String },
  Update(TransportUpdate),
  ServerError(String),
  Unhandled(String),
  Malformed(String)
}

/// Connection bookkeeping for the push channel, free of any socket.
///
/// The driver reports socket signals here and acts on what comes back: a
/// frame to send after open, a delay to sleep after close. Nothing here
/// schedules timers itself.
#[derive(Debug)]
pub struct UpdateChannel {
  state: ChannelState,
  reconnect_delay: Duration,
  disposed: bool,
  connections: u64
}

impl Default for UpdateChannel {
  fn default() -> Self {
    Self::new(RECONNECT_DELAY)
  }
}

impl UpdateChannel {
  pub fn new(reconnect_delay: Duration) -> Self {
    Self { state: ChannelState::Disconnected, reconnect_delay, disposed: false, connections: 0 }
  }

  pub fn state(&self) -> ChannelState {
    self.state
  }

  pub fn is_connected(&self) -> bool {
    self.state == ChannelState::Connected
  }

  /// number of successful opens so far
  pub fn connections(&self) -> u64 {
    self.connections
  }

  /// Disconnected -> Connecting. False when already live or disposed.
  pub fn begin_connect(&mut self) -> bool {
    if self.disposed || self.state != ChannelState::Disconnected {
      return false;
    }
    self.state = ChannelState::Connecting;
    true
  }

  /// Connecting -> Connected. Hands back the one subscribe frame for this connection.
  pub fn on_open(&mut self) -> Option<WsRequest> {
    if self.disposed || self.state != ChannelState::Connecting {
      return None;
    }
    self.state = ChannelState::Connected;
    self.connections += 1;
    Some(WsRequest::Subscribe { channel: TRANSPORT_UPDATE_CHANNEL.to_string() })
  }

  /// Close or error from the socket. Returns the delay before reconnecting,
  /// or `None` once disposed.
  pub fn on_close(&mut self) -> Option<Duration> {
    self.state = ChannelState::Disconnected;
    if self.disposed {
      None
    } else {
      Some(self.reconnect_delay)
    }
  }

  /// Teardown. Later closes never schedule a reconnect.
  pub fn dispose(&mut self) {
    self.disposed = true;
    self.state = ChannelState::Disconnected;
  }

  pub fn on_frame(&self, text: &str) -> ChannelEvent {
    let envelope = match serde_json::from_str::<WsEnvelope>(text) {
      Ok(envelope) => envelope,
      Err(e) => return ChannelEvent::Malformed(e.to_string())
    };

    match envelope.kind.as_str() {
      TRANSPORT_UPDATE_CHANNEL => match serde_json::from_value::<TransportUpdate>(envelope.payload) {
        Ok(update) => ChannelEvent::Update(update),
        Err(e) => ChannelEvent::Malformed(format!("bad transportUpdate payload: {}", e))
      },
      "subscribed" => match serde_json::from_value::<SubscribedPayload>(envelope.payload) {
        Ok(ack) => ChannelEvent::Subscribed { channel: ack.channel },
        Err(e) => ChannelEvent::Malformed(format!("bad subscribe ack: {}", e))
      },
      "error" => match serde_json::from_value::<ServerErrorPayload>(envelope.payload) {
        Ok(err) => ChannelEvent::ServerError(err.message),
        Err(e) => ChannelEvent::Malformed(format!("bad error frame: {}", e))
      },
      other => ChannelEvent::Unhandled(other.to_string())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::utils::transport::TransportStatus;

  fn subscribe_frame() -> WsRequest {
    WsRequest::Subscribe { channel: "transportUpdate".to_string() }
  }

  #[test]
  fn connect_open_sends_single_subscribe() {
    let mut channel = UpdateChannel::default();
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert!(channel.begin_connect());
    assert_eq!(channel.state(), ChannelState::Connecting);
    assert!(!channel.is_connected());

    assert_eq!(channel.on_open(), Some(subscribe_frame()));
    assert!(channel.is_connected());
    // a repeated open signal on the same connection does not subscribe twice
    assert_eq!(channel.on_open(), None);
    assert_eq!(channel.connections(), 1);
  }

  #[test]
  fn close_drops_flag_and_waits_before_reconnect() {
    let mut channel = UpdateChannel::default();
    channel.begin_connect();
    channel.on_open();

    assert_eq!(channel.on_close(), Some(Duration::from_secs(5)));
    assert!(!channel.is_connected());

    // an open signal before the delay elapsed and a new attempt began is ignored
    assert_eq!(channel.on_open(), None);
    assert!(!channel.is_connected());

    // delay elapsed: driver starts the next attempt
    assert!(channel.begin_connect());
    assert!(!channel.is_connected());
    assert_eq!(channel.on_open(), Some(subscribe_frame()));
    assert!(channel.is_connected());
    assert_eq!(channel.connections(), 2);
  }

  #[test]
  fn each_reconnect_gets_exactly_one_subscribe() {
    let mut channel = UpdateChannel::new(Duration::from_millis(10));
    let mut subscribes = 0;
    for _ in 0..4 {
      channel.begin_connect();
      if channel.on_open().is_some() {
        subscribes += 1;
      }
      channel.on_open();
      assert_eq!(channel.on_close(), Some(Duration::from_millis(10)));
    }
    assert_eq!(subscribes, 4);
    assert_eq!(channel.connections(), 4);
  }

  #[test]
  fn failed_connect_schedules_one_reconnect() {
    let mut channel = UpdateChannel::default();
    channel.begin_connect();
    // error before open
    assert_eq!(channel.on_close(), Some(RECONNECT_DELAY));
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert_eq!(channel.connections(), 0);
  }

  #[test]
  fn begin_connect_only_from_disconnected() {
    let mut channel = UpdateChannel::default();
    assert!(channel.begin_connect());
    assert!(!channel.begin_connect());
    channel.on_open();
    assert!(!channel.begin_connect());
  }

  #[test]
  fn dispose_stops_reconnecting() {
    let mut channel = UpdateChannel::default();
    channel.begin_connect();
    channel.on_open();
    channel.dispose();

    assert!(!channel.is_connected());
    assert_eq!(channel.on_close(), None);
    assert!(!channel.begin_connect());
    assert_eq!(channel.on_open(), None);
  }

  #[test]
  fn frame_transport_update() {
    let channel = UpdateChannel::default();
    let event = channel.on_frame(r#"{"type":"transportUpdate","payload":{"id":"T-002","status":"delayed","delay":30,"riskScore":65}}"#);
    match event {
      ChannelEvent::Update(update) => {
        assert_eq!(update.id, "T-002");
        assert_eq!(update.status, Some(TransportStatus::Delayed));
        assert_eq!(update.delay, Some(30));
        assert_eq!(update.risk_score, Some(65));
      },
      other => panic!("expected update, got {:?}", other)
    }
  }

  #[test]
  fn frame_ack_error_and_unknown() {
    let channel = UpdateChannel::default();
    assert_eq!(
      channel.on_frame(r#"{"type":"subscribed","payload":{"channel":"transportUpdate"}}"#),
      ChannelEvent::Subscribed { channel: "transportUpdate".to_string() }
    );
    assert_eq!(
      channel.on_frame(r#"{"type":"error","payload":{"message":"unknown channel"}}"#),
      ChannelEvent::ServerError("unknown channel".to_string())
    );
    assert_eq!(channel.on_frame(r#"{"type":"heartbeat"}"#), ChannelEvent::Unhandled("heartbeat".to_string()));
  }

  #[test]
  fn malformed_frames_leave_state_alone() {
    let mut channel = UpdateChannel::default();
    channel.begin_connect();
    channel.on_open();

    assert!(matches!(channel.on_frame("not json"), ChannelEvent::Malformed(_)));
    assert!(matches!(channel.on_frame(r#"{"payload":{}}"#), ChannelEvent::Malformed(_)));
    assert!(matches!(channel.on_frame(r#"{"type":"transportUpdate","payload":{"delay":3}}"#), ChannelEvent::Malformed(_)));
    assert!(matches!(channel.on_frame(r#"{"type":"transportUpdate","payload":{"id":"T-1","status":"lost"}}"#), ChannelEvent::Malformed(_)));
    assert!(channel.is_connected());
  }
}
