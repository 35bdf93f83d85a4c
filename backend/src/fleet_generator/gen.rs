use rand::{rngs::StdRng, seq::index, SeedableRng};
use rand_distr::{Bernoulli, Distribution, Normal, Uniform};

use crate::{
  fleet_generator::model::{seed_fleet, Position, Transport, TransportStatus, TransportUpdate},
  midwares::app_state::AppError
};

pub const MIN_DELAY: i32 = -30;
pub const MAX_DELAY: i32 = 240;
const MINUTES_PER_DAY: i32 = 24 * 60;

/// Status implied by a delay (minutes) and trip progress.
pub fn derive_status(delay: i32, progress: u8) -> TransportStatus {
  if progress >= 100 {
    TransportStatus::Arrived
  } else if delay >= 60 {
    TransportStatus::Critical
  } else if delay >= 15 {
    TransportStatus::Delayed
  } else {
    TransportStatus::OnTime
  }
}

/// Risk grows with lateness; being early scores like being on time.
pub fn risk_from_delay(delay: i32) -> u8 {
  let score = 10.0 + delay.max(0) as f64 * 1.05;
  score.round().clamp(0.0, 100.0) as u8
}

/// "HH:MM" shifted by `minutes`, wrapping at midnight.
pub fn shift_clock(clock: &str, minutes: i32) -> Option<String> {
  let (h, m) = clock.split_once(':')?;
  let (h, m): (i32, i32) = (h.trim().parse().ok()?, m.trim().parse().ok()?);
  if !(0..24).contains(&h) || !(0..60).contains(&m) {
    return None;
  }
  let total = (h * 60 + m + minutes).rem_euclid(MINUTES_PER_DAY);
  Some(format!("{:02}:{:02}", total / 60, total % 60))
}

/// Owns the server side fleet and produces the live update stream.
///
/// Every update is applied to the fleet before it is handed out, so a
/// snapshot taken at any point agrees with the updates sent so far.
pub struct FleetSimulator {
  fleet: Vec<Transport>,
  rng: StdRng,
  batch_size_dist: Uniform<usize>,
  delay_drift_dist: Normal<f64>,
  progress_step_dist: Uniform<u8>,
  jitter_dist: Normal<f64>,
  move_dist: Bernoulli,
  rescore_dist: Bernoulli,
  emitted: u64
}

impl FleetSimulator {
  pub fn new() -> Result<Self, AppError> {
    Self::with_rng(StdRng::from_os_rng())
  }

  /// Deterministic stream, for tests and reproducible demos.
  pub fn seeded(seed: u64) -> Result<Self, AppError> {
    Self::with_rng(StdRng::seed_from_u64(seed))
  }

  fn with_rng(rng: StdRng) -> Result<Self, AppError> {
    let dist_err = |e: &dyn std::fmt::Display| AppError::InternalError(format!("invalid simulator distribution: {}", e));

    Ok(FleetSimulator {
      fleet: seed_fleet(),
      rng,
      batch_size_dist: Uniform::new_inclusive(1, 3).map_err(|e| dist_err(&e))?,
      delay_drift_dist: Normal::new(0.0, 4.0).map_err(|e| dist_err(&e))?,
      progress_step_dist: Uniform::new_inclusive(0, 2).map_err(|e| dist_err(&e))?,
      jitter_dist: Normal::new(0.0, 0.01).map_err(|e| dist_err(&e))?,
      move_dist: Bernoulli::new(0.7).map_err(|e| dist_err(&e))?,
      rescore_dist: Bernoulli::new(0.3).map_err(|e| dist_err(&e))?,
      emitted: 0
    })
  }

  pub fn snapshot(&self) -> Vec<Transport> {
    self.fleet.clone()
  }

  pub fn emitted(&self) -> u64 {
    self.emitted
  }

  /// One feed interval: one to three updates for distinct, not yet arrived
  /// transports. Empty once the whole fleet has arrived.
  pub fn next_updates(&mut self) -> Vec<TransportUpdate> {
    let active: Vec<usize> = self.fleet.iter()
      .enumerate()
      .filter(|(_, t)| t.status != TransportStatus::Arrived)
      .map(|(idx, _)| idx)
      .collect();
    if active.is_empty() {
      return Vec::new();
    }

    let amount = self.batch_size_dist.sample(&mut self.rng).min(active.len());
    let picks = index::sample(&mut self.rng, active.len(), amount);

    let mut updates = Vec::with_capacity(amount);
    for pick in picks.into_iter() {
      let idx = active[pick];
      let update = self.drift(idx);
      self.fleet[idx].apply(&update);
      updates.push(update);
    }
    self.emitted += updates.len() as u64;
    updates
  }

  fn drift(&mut self, idx: usize) -> TransportUpdate {
    let current = self.fleet[idx].clone();
    let mut update = TransportUpdate { id: current.id.clone(), ..Default::default() };

    let drift = self.delay_drift_dist.sample(&mut self.rng).round() as i32;
    let delay = (current.delay + drift).clamp(MIN_DELAY, MAX_DELAY);
    let step = self.progress_step_dist.sample(&mut self.rng);
    let progress = current.progress.saturating_add(step).min(100);

    if delay != current.delay {
      update.delay = Some(delay);
      update.eta = shift_clock(&current.plan_eta, delay);
    }
    if progress != current.progress {
      update.progress = Some(progress);
    }

    let status = derive_status(delay, progress);
    if status != current.status {
      update.status = Some(status);
    }

    if status != TransportStatus::Arrived && self.move_dist.sample(&mut self.rng) {
      update.position = Some(Position {
        lat: current.position.lat + self.jitter_dist.sample(&mut self.rng),
        lng: current.position.lng + self.jitter_dist.sample(&mut self.rng),
        address: current.position.address.clone()
      });
    }

    if update.delay.is_some() || self.rescore_dist.sample(&mut self.rng) {
      let risk = risk_from_delay(delay);
      if current.risk_score != Some(risk) {
        update.risk_score = Some(risk);
      }
    }

    // a frame always carries at least one field
    if update.is_empty() {
      update.delay = Some(delay);
    }
    update
  }
}
