use std::{cell::Cell, rc::Rc};
use dioxus::{logger::tracing::{debug, warn}, prelude::*};
use futures_util::StreamExt;

use crate::utils::{
  reconciler::{update_queue, TICK_INTERVAL},
  server::{AppError, GRAPHQL_URL, WSS_URL},
  snapshot::SnapshotFetcher,
  transport::{seed_transports, Transport},
  ws_handler::run_update_channel
};

/// Set once the owning component unmounts. Results landing after that are dropped.
#[derive(Clone, Default)]
pub struct Lifecycle(Rc<Cell<bool>>);

impl Lifecycle {
  pub fn dispose(&self) {
    self.0.set(true);
  }

  pub fn is_disposed(&self) -> bool {
    self.0.get()
  }
}

enum Action {
  Refresh
}

/// Folds a finished fetch into the collection. On failure the last known
/// collection stays and the message is returned for display.
pub fn settle_snapshot(result: Result<Vec<Transport>, AppError>, current: &mut Vec<Transport>) -> Option<String> {
  match result {
    Ok(fresh) => {
      *current = fresh;
      None
    },
    Err(e) => {
      warn!("snapshot fetch failed, keeping last known transports: {}", e);
      Some(e.to_string())
    }
  }
}

/// Observable state of the live transport collection.
#[derive(Clone, Copy)]
pub struct LiveTransports {
  transports: Signal<Vec<Transport>>,
  loading: Signal<bool>,
  error: Signal<Option<String>>,
  connected: Signal<bool>,
  refresher: Coroutine<Action>
}

impl LiveTransports {
  pub fn transports(&self) -> ReadOnlySignal<Vec<Transport>> {
    ReadOnlySignal::new(self.transports)
  }

  pub fn loading(&self) -> ReadOnlySignal<bool> {
    ReadOnlySignal::new(self.loading)
  }

  pub fn error(&self) -> ReadOnlySignal<Option<String>> {
    ReadOnlySignal::new(self.error)
  }

  pub fn connected(&self) -> ReadOnlySignal<bool> {
    ReadOnlySignal::new(self.connected)
  }

  /// Re-runs the snapshot fetch. Queued updates are kept and apply to the new snapshot.
  pub fn refresh(&self) {
    self.refresher.send(Action::Refresh);
  }

  pub fn dismiss_error(&self) {
    let mut error = self.error;
    error.set(None);
  }
}

/// Snapshot fetch, push channel and reconcile tick for one component instance.
pub fn use_live_transports() -> LiveTransports {
  let mut transports = use_signal(seed_transports);
  let mut loading = use_signal(|| false);
  let mut error: Signal<Option<String>> = use_signal(|| None);
  let connected = use_signal(|| false);
  let lifecycle = use_hook(Lifecycle::default);

  let refresher = use_coroutine({
    let lifecycle = lifecycle.clone();
    move |mut rx: UnboundedReceiver<Action>| {
      let lifecycle = lifecycle.clone();
      async move {
        let fetcher = SnapshotFetcher::new(reqwest::Client::new(), GRAPHQL_URL);
        while let Some(Action::Refresh) = rx.next().await {
          loading.set(true);
          error.set(None);

          let result = fetcher.fetch().await;
          if lifecycle.is_disposed() {
            debug!("discarding snapshot that arrived after teardown");
            break;
          }

          let failure = settle_snapshot(result, &mut transports.write());
          error.set(failure);
          loading.set(false);
        }
      }
    }
  });

  use_hook({
    let lifecycle = lifecycle.clone();
    move || {
      refresher.send(Action::Refresh);

      let (update_tx, mut reconciler) = update_queue();
      spawn(run_update_channel(WSS_URL, connected, update_tx, lifecycle.clone()));

      let lifecycle = lifecycle.clone();
      spawn(async move {
        loop {
          async_std::task::sleep(TICK_INTERVAL).await;
          if lifecycle.is_disposed() {
            break;
          }
          let outcome = reconciler.tick(&transports.peek());
          if let Some(outcome) = outcome {
            if outcome.stale > 0 {
              debug!("discarded {} stale updates", outcome.stale);
            }
            transports.set(outcome.transports);
          }
        }
      });
    }
  });

  use_drop({
    let lifecycle = lifecycle.clone();
    move || lifecycle.dispose()
  });

  LiveTransports { transports, loading, error, connected, refresher }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::utils::channel::{ChannelState, UpdateChannel};

  #[test]
  fn successful_snapshot_replaces_collection() {
    let mut current = seed_transports();
    let fresh: Vec<Transport> = seed_transports().into_iter().take(2).collect();
    let failure = settle_snapshot(Ok(fresh.clone()), &mut current);
    assert_eq!(failure, None);
    assert_eq!(current, fresh);
  }

  #[test]
  fn failed_snapshot_keeps_last_known() {
    let mut current: Vec<Transport> = seed_transports().into_iter().skip(1).collect();
    let before = current.clone();
    let failure = settle_snapshot(Err(AppError::FetchError("HTTP error! status: 502".to_string())), &mut current);
    assert_eq!(failure.as_deref(), Some("HTTP error! status: 502"));
    assert_eq!(current, before);
  }

  #[test]
  fn refresh_while_disconnected_leaves_channel_alone() {
    let mut channel = UpdateChannel::default();
    channel.begin_connect();
    channel.on_open();
    channel.on_close();

    let mut current = seed_transports();
    let fresh: Vec<Transport> = seed_transports().into_iter().rev().collect();
    settle_snapshot(Ok(fresh.clone()), &mut current);

    assert_eq!(current, fresh);
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert!(!channel.is_connected());
    assert_eq!(channel.connections(), 1);
  }

  #[test]
  fn lifecycle_is_shared_between_clones() {
    let lifecycle = Lifecycle::default();
    let clone = lifecycle.clone();
    assert!(!clone.is_disposed());
    lifecycle.dispose();
    assert!(clone.is_disposed());
  }
}
