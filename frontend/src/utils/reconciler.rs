use std::{collections::HashMap, time::Duration};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use super::transport::{Transport, TransportUpdate};

/// Cadence of the drain-and-merge step.
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Result of folding one drained batch into the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
  pub transports: Vec<Transport>,
  pub applied: usize,
  pub stale: usize
}

/// Folds `updates` into a copy of `current` in arrival order.
///
/// Updates whose id is not in the collection are counted as stale and
/// dropped; no transport is ever created or removed here. Updates without
/// any recognised field change nothing and are neither applied nor stale.
pub fn merge_batch(current: &[Transport], updates: impl IntoIterator<Item = TransportUpdate>) -> MergeOutcome {
  let mut transports = current.to_vec();
  let index: HashMap<String, usize> = transports.iter()
    .enumerate()
    .map(|(idx, t)| (t.id.clone(), idx))
    .collect();

  let (mut applied, mut stale) = (0, 0);
  for update in updates {
    if update.is_empty() {
      continue;
    }
    match index.get(&update.id) {
      Some(&idx) => {
        transports[idx].apply(&update);
        applied += 1;
      },
      None => stale += 1
    }
  }

  MergeOutcome { transports, applied, stale }
}

/// Consumer end of the pending update queue.
pub struct Reconciler {
  pending: UnboundedReceiver<TransportUpdate>
}

/// Creates the queue: the sender goes to the update channel, the reconciler drains it.
pub fn update_queue() -> (UnboundedSender<TransportUpdate>, Reconciler) {
  let (tx, rx) = mpsc::unbounded_channel();
  (tx, Reconciler { pending: rx })
}

impl Reconciler {
  /// Everything queued so far, oldest first.
  pub fn drain(&mut self) -> Vec<TransportUpdate> {
    let mut batch = Vec::new();
    loop {
      match self.pending.try_recv() {
        Ok(update) => batch.push(update),
        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break
      }
    }
    batch
  }

  /// One tick. `None` means nothing changed and the caller must not publish,
  /// either because the queue was empty or every update was stale.
  pub fn tick(&mut self, current: &[Transport]) -> Option<MergeOutcome> {
    let batch = self.drain();
    if batch.is_empty() {
      return None;
    }
    let outcome = merge_batch(current, batch);
    if outcome.applied == 0 {
      return None;
    }
    Some(outcome)
  }
}
