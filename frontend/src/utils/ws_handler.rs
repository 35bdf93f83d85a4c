use std::{pin::Pin, time::Duration};
use dioxus::{logger::tracing::{debug, info, warn}, prelude::{Signal, Writable}};
use futures::{future::{poll_fn, select, Either}, stream::{SplitSink, SplitStream}, Sink, SinkExt};
use futures_util::StreamExt;
use gloo_net::websocket::{futures::WebSocket, Message};
use tokio::sync::mpsc::UnboundedSender;

use crate::utils::{
  channel::{ChannelEvent, UpdateChannel},
  live::Lifecycle,
  server::AppError,
  transport::TransportUpdate
};

/// One socket at a time plus the reconnect timer, as seen by the driver.
pub trait UpdateSocket {
  /// Opens a fresh connection and resolves once it reports open.
  async fn open(&mut self) -> Result<(), AppError>;
  async fn send(&mut self, frame: String) -> Result<(), AppError>;
  /// Next inbound text frame. `None` once the connection is closed.
  async fn next_frame(&mut self) -> Option<Result<String, AppError>>;
  async fn sleep(&mut self, delay: Duration);
}

/// Keeps the push channel alive for as long as the owning component lives.
///
/// Parsed updates are handed to `update_tx` without waiting on the
/// reconciler. `connected` flips on open and on close only.
pub async fn run_update_channel(url: &'static str,
  mut connected: Signal<bool>,
  update_tx: UnboundedSender<TransportUpdate>,
  lifecycle: Lifecycle) {

  let mut socket = GlooSocket::new(url);
  let channel = drive_update_channel(&mut socket, |live| connected.set(live), &update_tx, &lifecycle).await;
  debug!("update channel stopped after {} connections", channel.connections());
}

/// The reconnect loop. Returns the channel once teardown stopped it.
pub async fn drive_update_channel<S: UpdateSocket>(socket: &mut S,
  mut set_connected: impl FnMut(bool),
  update_tx: &UnboundedSender<TransportUpdate>,
  lifecycle: &Lifecycle) -> UpdateChannel {

  let mut channel = UpdateChannel::default();

  while channel.begin_connect() {
    if let Err(e) = run_connection(socket, &mut channel, &mut set_connected, update_tx).await {
      warn!("update channel dropped: {}", e);
    }
    if lifecycle.is_disposed() {
      channel.dispose();
    }

    let was_connected = channel.is_connected();
    let reconnect_after = channel.on_close();
    if was_connected {
      set_connected(false);
    }

    match reconnect_after {
      Some(delay) => {
        info!("update channel closed, reconnecting in {}s", delay.as_secs());
        socket.sleep(delay).await;
        if lifecycle.is_disposed() {
          channel.dispose();
        }
      },
      None => break
    }
  }
  channel
}

async fn run_connection<S: UpdateSocket>(socket: &mut S,
  channel: &mut UpdateChannel,
  set_connected: &mut impl FnMut(bool),
  update_tx: &UnboundedSender<TransportUpdate>) -> Result<(), AppError> {

  socket.open().await?;

  if let Some(subscribe) = channel.on_open() {
    set_connected(true);
    let frame = serde_json::to_string(&subscribe).map_err(|e| AppError::SerializeError(e.to_string()))?;
    socket.send(frame).await?;
    info!("update channel open, subscribe sent");
  }

  while let Some(frame) = socket.next_frame().await {
    let text = frame?;
    match channel.on_frame(&text) {
      ChannelEvent::Update(update) => {
        update_tx.send(update).map_err(|e| AppError::WsChannelError(e.to_string()))?;
      },
      ChannelEvent::Subscribed { channel } => info!("server acknowledged subscription to {}", channel),
      ChannelEvent::ServerError(msg) => warn!("update channel server error: {}", msg),
      ChannelEvent::Unhandled(kind) => debug!("ignoring {} frame", kind),
      ChannelEvent::Malformed(reason) => warn!("dropping malformed frame: {}", reason)
    }
  }
  Ok(())
}

/// Browser WebSocket behind `UpdateSocket`.
struct GlooSocket {
  url: &'static str,
  write: Option<SplitSink<WebSocket, Message>>,
  read: Option<SplitStream<WebSocket>>
}

impl GlooSocket {
  fn new(url: &'static str) -> Self {
    Self { url, write: None, read: None }
  }

  fn drop_connection(&mut self) {
    self.write = None;
    self.read = None;
  }
}

impl UpdateSocket for GlooSocket {
  async fn open(&mut self) -> Result<(), AppError> {
    let ws = WebSocket::open(self.url).map_err(|e| AppError::WsConnectionError(e.to_string()))?;
    let (mut write, mut read) = ws.split();
    wait_for_open(&mut write, &mut read).await?;
    self.write = Some(write);
    self.read = Some(read);
    Ok(())
  }

  async fn send(&mut self, frame: String) -> Result<(), AppError> {
    let write = self.write.as_mut().ok_or_else(|| AppError::WsConnectionError("socket not open".to_string()))?;
    write.send(Message::Text(frame)).await.map_err(|e| AppError::WsConnectionError(e.to_string()))
  }

  async fn next_frame(&mut self) -> Option<Result<String, AppError>> {
    loop {
      let server_msg = self.read.as_mut()?.next().await;
      match server_msg {
        Some(Ok(Message::Text(s))) => return Some(Ok(s)),
        Some(Ok(Message::Bytes(bytes))) => match String::from_utf8(bytes) {
          Ok(s) => return Some(Ok(s)),
          Err(e) => warn!("dropping non utf-8 binary frame: {}", e)
        },
        Some(Err(e)) => {
          self.drop_connection();
          return Some(Err(AppError::WsConnectionError(e.to_string())));
        },
        None => {
          self.drop_connection();
          return None;
        }
      }
    }
  }

  async fn sleep(&mut self, delay: Duration) {
    async_std::task::sleep(delay).await;
  }
}

// resolves once the socket reports open, or fails if it errors or closes first
async fn wait_for_open(write: &mut SplitSink<WebSocket, Message>, read: &mut SplitStream<WebSocket>) -> Result<(), AppError> {
  let ready = poll_fn(|cx| Pin::new(&mut *write).poll_ready(cx));

  match select(ready, read.next()).await {
    Either::Left((Ok(()), _)) => Ok(()),
    Either::Left((Err(e), _)) => Err(AppError::WsConnectionError(e.to_string())),
    Either::Right((Some(Err(e)), _)) => Err(AppError::WsConnectionError(e.to_string())),
    Either::Right((_, _)) => Err(AppError::WsConnectionError("socket closed before open".to_string()))
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, collections::VecDeque, rc::Rc};
  use futures::executor::block_on;
  use tokio::sync::mpsc;
  use super::*;
  use crate::utils::channel::RECONNECT_DELAY;

  const SUBSCRIBE: &str = r#"{"type":"subscribe","channel":"transportUpdate"}"#;
  const T002_UPDATE: &str = r#"{"type":"transportUpdate","payload":{"id":"T-002","delay":30}}"#;

  struct Attempt {
    opens: bool,
    frames: Vec<&'static str>,
    // unmount while this connection is live
    dispose_on_close: bool
  }

  /// Plays back scripted connections and records what the driver did.
  struct ScriptedSocket {
    attempts: VecDeque<Attempt>,
    frames: VecDeque<&'static str>,
    dispose_on_close: bool,
    log: Rc<RefCell<Vec<String>>>,
    lifecycle: Lifecycle
  }

  impl ScriptedSocket {
    fn new(attempts: Vec<Attempt>, log: Rc<RefCell<Vec<String>>>, lifecycle: Lifecycle) -> Self {
      Self { attempts: attempts.into(), frames: VecDeque::new(), dispose_on_close: false, log, lifecycle }
    }

    fn record(&self, entry: String) {
      self.log.borrow_mut().push(entry);
    }
  }

  impl UpdateSocket for ScriptedSocket {
    async fn open(&mut self) -> Result<(), AppError> {
      match self.attempts.pop_front() {
        Some(attempt) if attempt.opens => {
          self.record("open".to_string());
          self.frames = attempt.frames.into();
          self.dispose_on_close = attempt.dispose_on_close;
          Ok(())
        },
        _ => {
          self.record("open failed".to_string());
          Err(AppError::WsConnectionError("refused".to_string()))
        }
      }
    }

    async fn send(&mut self, frame: String) -> Result<(), AppError> {
      self.record(format!("send {}", frame));
      Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<String, AppError>> {
      if let Some(frame) = self.frames.pop_front() {
        return Some(Ok(frame.to_string()));
      }
      if self.dispose_on_close {
        self.lifecycle.dispose();
      }
      self.record("closed".to_string());
      None
    }

    async fn sleep(&mut self, delay: Duration) {
      self.record(format!("sleep {}ms", delay.as_millis()));
      // script exhausted: the component unmounts while waiting
      if self.attempts.is_empty() {
        self.lifecycle.dispose();
      }
    }
  }

  fn run(attempts: Vec<Attempt>) -> (Vec<String>, UpdateChannel, Vec<TransportUpdate>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let lifecycle = Lifecycle::default();
    let mut socket = ScriptedSocket::new(attempts, log.clone(), lifecycle.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let flag_log = log.clone();
    let channel = block_on(drive_update_channel(
      &mut socket,
      move |live| flag_log.borrow_mut().push(format!("connected={}", live)),
      &tx,
      &lifecycle
    ));

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
      updates.push(update);
    }
    let entries = log.borrow().clone();
    (entries, channel, updates)
  }

  #[test]
  fn close_drops_flag_then_waits_before_reopening() {
    let (log, channel, updates) = run(vec![
      Attempt { opens: true, frames: vec![T002_UPDATE], dispose_on_close: false },
      Attempt { opens: true, frames: vec![], dispose_on_close: false },
    ]);
    let sleep = format!("sleep {}ms", RECONNECT_DELAY.as_millis());
    let send = format!("send {}", SUBSCRIBE);

    assert_eq!(log, vec![
      "open", "connected=true", send.as_str(), "closed", "connected=false", sleep.as_str(),
      "open", "connected=true", send.as_str(), "closed", "connected=false", sleep.as_str(),
    ]);
    assert_eq!(channel.connections(), 2);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, "T-002");
    assert_eq!(updates[0].delay, Some(30));
  }

  #[test]
  fn failed_open_never_raises_flag() {
    let (log, channel, _) = run(vec![
      Attempt { opens: false, frames: vec![], dispose_on_close: false },
      Attempt { opens: true, frames: vec![], dispose_on_close: false },
    ]);
    let sleep = format!("sleep {}ms", RECONNECT_DELAY.as_millis());

    assert_eq!(&log[..2], &["open failed".to_string(), sleep.clone()]);
    assert_eq!(log.iter().filter(|e| e.starts_with("connected=")).count(), 2);
    assert_eq!(log.iter().filter(|e| e.starts_with("send ")).count(), 1);
    assert_eq!(channel.connections(), 1);
  }

  #[test]
  fn teardown_while_connected_stops_without_reconnect() {
    let (log, mut channel, _) = run(vec![
      Attempt { opens: true, frames: vec![], dispose_on_close: true },
      Attempt { opens: true, frames: vec![], dispose_on_close: false },
    ]);
    let send = format!("send {}", SUBSCRIBE);

    assert_eq!(log, vec!["open", "connected=true", send.as_str(), "closed"]);
    assert!(!log.iter().any(|e| e.starts_with("sleep")));
    assert!(!channel.begin_connect());
  }

  #[test]
  fn bad_frames_keep_the_connection() {
    let (log, channel, updates) = run(vec![
      Attempt { opens: true, frames: vec!["not json", r#"{"type":"heartbeat"}"#, T002_UPDATE], dispose_on_close: false },
    ]);
    assert_eq!(updates.len(), 1);
    assert_eq!(channel.connections(), 1);
    assert_eq!(log.iter().filter(|e| *e == "closed").count(), 1);
  }
}
