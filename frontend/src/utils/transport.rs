use serde::{Deserialize, Deserializer, Serialize};

pub const MAX_PROGRESS: u8 = 100;
pub const MAX_RISK_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportStatus {
  #[serde(alias = "pünktlich")]
  OnTime,
  #[serde(alias = "verspätet")]
  Delayed,
  #[serde(alias = "kritisch")]
  Critical,
  #[serde(alias = "angekommen")]
  Arrived,
}

impl TransportStatus {
  pub fn label(&self) -> &'static str {
    match self {
      TransportStatus::OnTime => "on time",
      TransportStatus::Delayed => "delayed",
      TransportStatus::Critical => "critical",
      TransportStatus::Arrived => "arrived",
    }
  }

  /// css modifier used by status dots and badges
  pub fn css_class(&self) -> &'static str {
    match self {
      TransportStatus::OnTime => "status-excellent",
      TransportStatus::Delayed => "status-warning",
      TransportStatus::Critical => "status-critical",
      TransportStatus::Arrived => "status-good",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
  pub from: String,
  pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub lat: f64,
  pub lng: f64,
  pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
  pub id: String,
  #[serde(alias = "auftragsNr")]
  pub order_no: String,
  pub route: Route,
  pub status: TransportStatus,
  pub eta: String,
  pub plan_eta: String,
  /// minutes, negative means ahead of schedule
  pub delay: i32,
  pub position: Position,
  pub cargo: String,
  pub driver: String,
  #[serde(deserialize_with = "progress_from_number")]
  pub progress: u8,
  /// `None` until the risk model has scored the transport
  #[serde(default, deserialize_with = "risk_from_number", skip_serializing_if = "Option::is_none")]
  pub risk_score: Option<u8>,
}

/// Sparse change set for one transport. Only the fields present are merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportUpdate {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<TransportStatus>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub eta: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub plan_eta: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub delay: Option<i32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position: Option<Position>,
  // wide ints so out of range values survive parsing and get clamped on merge
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub progress: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub risk_score: Option<i64>,
}

impl TransportUpdate {
  pub fn new(id: impl Into<String>) -> Self {
    Self { id: id.into(), ..Default::default() }
  }

  pub fn is_empty(&self) -> bool {
    self.status.is_none()
      && self.eta.is_none()
      && self.plan_eta.is_none()
      && self.delay.is_none()
      && self.position.is_none()
      && self.progress.is_none()
      && self.risk_score.is_none()
  }
}

fn clamp_percent(value: i64, max: u8) -> u8 {
  value.clamp(0, max as i64) as u8
}

// snapshot numbers may be fractional or out of range; round, then clamp like a merge does
fn progress_from_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
  let raw = f64::deserialize(deserializer)?;
  Ok(clamp_percent(raw.round() as i64, MAX_PROGRESS))
}

fn risk_from_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
  let raw = Option::<f64>::deserialize(deserializer)?;
  Ok(raw.map(|score| clamp_percent(score.round() as i64, MAX_RISK_SCORE)))
}

impl Transport {
  /// Shallow merge of the fields present on `update`. Ids are never touched.
  pub fn apply(&mut self, update: &TransportUpdate) {
    if let Some(status) = update.status {
      self.status = status;
    }
    if let Some(eta) = &update.eta {
      self.eta = eta.clone();
    }
    if let Some(plan_eta) = &update.plan_eta {
      self.plan_eta = plan_eta.clone();
    }
    if let Some(delay) = update.delay {
      self.delay = delay;
    }
    if let Some(position) = &update.position {
      self.position = position.clone();
    }
    if let Some(progress) = update.progress {
      self.progress = clamp_percent(progress, MAX_PROGRESS);
    }
    if let Some(risk) = update.risk_score {
      self.risk_score = Some(clamp_percent(risk, MAX_RISK_SCORE));
    }
  }

  pub fn risk_level(&self) -> Option<RiskLevel> {
    self.risk_score.map(RiskLevel::from_score)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
  Low,
  Warning,
  Critical,
}

impl RiskLevel {
  pub fn from_score(score: u8) -> Self {
    if score >= 60 {
      RiskLevel::Critical
    } else if score >= 40 {
      RiskLevel::Warning
    } else {
      RiskLevel::Low
    }
  }

  pub fn css_class(&self) -> &'static str {
    match self {
      RiskLevel::Low => "status-excellent",
      RiskLevel::Warning => "status-warning",
      RiskLevel::Critical => "status-critical",
    }
  }
}

/// Aggregates shown on the overview tiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSummary {
  pub total: usize,
  pub on_time: usize,
  pub delayed: usize,
  pub critical: usize,
  pub arrived: usize,
  pub high_risk: usize,
  pub avg_risk: Option<f64>,
  pub avg_delay: f64,
}

impl FleetSummary {
  pub fn from_transports(transports: &[Transport]) -> Self {
    let mut summary = FleetSummary { total: transports.len(), ..Default::default() };
    let mut risk_sum = 0u32;
    let mut scored = 0u32;
    let mut delay_sum = 0i64;

    for t in transports {
      match t.status {
        TransportStatus::OnTime => summary.on_time += 1,
        TransportStatus::Delayed => summary.delayed += 1,
        TransportStatus::Critical => summary.critical += 1,
        TransportStatus::Arrived => summary.arrived += 1,
      }
      if let Some(score) = t.risk_score {
        risk_sum += score as u32;
        scored += 1;
        if RiskLevel::from_score(score) == RiskLevel::Critical {
          summary.high_risk += 1;
        }
      }
      delay_sum += t.delay as i64;
    }

    if scored > 0 {
      summary.avg_risk = Some(risk_sum as f64 / scored as f64);
    }
    if summary.total > 0 {
      summary.avg_delay = delay_sum as f64 / summary.total as f64;
    }
    summary
  }

  /// transports still on the road
  pub fn active(&self) -> usize {
    self.total - self.arrived
  }

  /// share of transports that are on time or already arrived, in percent
  pub fn on_time_rate(&self) -> f64 {
    if self.total == 0 {
      return 0.0;
    }
    (self.on_time + self.arrived) as f64 / self.total as f64 * 100.0
  }
}

fn seed(id: &str, order_no: &str, from: &str, to: &str, status: TransportStatus, eta: &str, plan_eta: &str, delay: i32,
  position: (f64, f64, &str), cargo: &str, driver: &str, progress: u8, risk_score: u8) -> Transport {
  Transport {
    id: id.to_string(),
    order_no: order_no.to_string(),
    route: Route { from: from.to_string(), to: to.to_string() },
    status,
    eta: eta.to_string(),
    plan_eta: plan_eta.to_string(),
    delay,
    position: Position { lat: position.0, lng: position.1, address: position.2.to_string() },
    cargo: cargo.to_string(),
    driver: driver.to_string(),
    progress,
    risk_score: Some(risk_score),
  }
}

/// Collection shown before the first snapshot lands and kept when it fails.
pub fn seed_transports() -> Vec<Transport> {
  vec![
    seed("T-001", "SO-8832", "München", "Hamburg", TransportStatus::Delayed, "14:45", "14:00", 45,
      (52.3, 9.8, "A7 bei Hannover"), "Elektronikteile (2.4t)", "M. Schmidt", 65, 72),
    seed("T-002", "SO-8833", "Berlin", "Stuttgart", TransportStatus::OnTime, "16:20", "16:30", -10,
      (50.8, 11.2, "A9 bei Erfurt"), "Maschinenbauteile (4.8t)", "A. Weber", 45, 25),
    seed("T-003", "SO-8834", "Köln", "Dresden", TransportStatus::Critical, "18:15", "17:00", 75,
      (50.9, 6.9, "A1 Stau bei Köln"), "Chemikalien (3.2t)", "P. Müller", 20, 89),
    seed("T-004", "SO-8835", "Frankfurt", "Nürnberg", TransportStatus::Arrived, "12:30", "12:45", -15,
      (49.5, 11.1, "Nürnberg Logistikzentrum"), "Automotive Teile (5.1t)", "S. Fischer", 100, 5),
    seed("T-005", "SO-8836", "Düsseldorf", "Leipzig", TransportStatus::OnTime, "15:30", "15:30", 0,
      (51.3, 7.5, "A44 bei Dortmund"), "Textilien (1.8t)", "L. Becker", 30, 35),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  fn by_id<'a>(transports: &'a [Transport], id: &str) -> &'a Transport {
    transports.iter().find(|t| t.id == id).expect("seed transport missing")
  }

  #[test]
  fn apply_only_touches_present_fields() {
    let mut t = by_id(&seed_transports(), "T-002").clone();
    let before = t.clone();

    let mut update = TransportUpdate::new("T-002");
    update.delay = Some(12);
    t.apply(&update);

    assert_eq!(t.delay, 12);
    assert_eq!(t.status, before.status);
    assert_eq!(t.position, before.position);
    assert_eq!(t.risk_score, before.risk_score);
    assert_eq!(t.cargo, before.cargo);
  }

  #[test]
  fn empty_update_is_noop() {
    let mut t = by_id(&seed_transports(), "T-005").clone();
    let before = t.clone();
    let update = TransportUpdate::new("T-005");
    assert!(update.is_empty());
    t.apply(&update);
    assert_eq!(t, before);
  }

  #[test]
  fn apply_clamps_progress_and_risk() {
    let mut t = by_id(&seed_transports(), "T-001").clone();

    let mut update = TransportUpdate::new("T-001");
    update.progress = Some(140);
    update.risk_score = Some(-3);
    t.apply(&update);
    assert_eq!(t.progress, 100);
    assert_eq!(t.risk_score, Some(0));

    update.progress = Some(-1);
    update.risk_score = Some(250);
    t.apply(&update);
    assert_eq!(t.progress, 0);
    assert_eq!(t.risk_score, Some(100));
  }

  #[test]
  fn update_parses_sparse_wire_payload() {
    let update: TransportUpdate = serde_json::from_str(
      r#"{"id":"T-002","status":"delayed","delay":30,"riskScore":65,"cargo":"ignored"}"#
    ).expect("payload should parse");

    assert_eq!(update.id, "T-002");
    assert_eq!(update.status, Some(TransportStatus::Delayed));
    assert_eq!(update.delay, Some(30));
    assert_eq!(update.risk_score, Some(65));
    assert!(update.position.is_none());
    assert!(update.progress.is_none());
  }

  #[test]
  fn legacy_status_names_are_accepted() {
    let status: TransportStatus = serde_json::from_str(r#""verspätet""#).expect("alias should parse");
    assert_eq!(status, TransportStatus::Delayed);
    let status: TransportStatus = serde_json::from_str(r#""on-time""#).expect("status should parse");
    assert_eq!(status, TransportStatus::OnTime);
  }

  #[test]
  fn missing_risk_score_stays_unscored() {
    let t: Transport = serde_json::from_value(serde_json::json!({
      "id": "T-100", "orderNo": "SO-1", "route": {"from": "A", "to": "B"}, "status": "on-time",
      "eta": "10:00", "planEta": "10:00", "delay": 0, "position": {"lat": 0.0, "lng": 0.0, "address": "depot"},
      "cargo": "pallets", "driver": "N. N.", "progress": 0
    })).expect("transport should parse");
    assert_eq!(t.risk_score, None);
    assert_eq!(t.risk_level(), None);
  }

  #[test]
  fn risk_level_thresholds() {
    assert_eq!(RiskLevel::from_score(75), RiskLevel::Critical);
    assert_eq!(RiskLevel::from_score(60), RiskLevel::Critical);
    assert_eq!(RiskLevel::from_score(59), RiskLevel::Warning);
    assert_eq!(RiskLevel::from_score(40), RiskLevel::Warning);
    assert_eq!(RiskLevel::from_score(39), RiskLevel::Low);
    assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
  }

  #[test]
  fn fleet_summary_over_seed() {
    let summary = FleetSummary::from_transports(&seed_transports());
    assert_eq!(summary.total, 5);
    assert_eq!(summary.on_time, 2);
    assert_eq!(summary.delayed, 1);
    assert_eq!(summary.critical, 1);
    assert_eq!(summary.arrived, 1);
    assert_eq!(summary.high_risk, 2);
    assert_eq!(summary.avg_risk, Some((72.0 + 25.0 + 89.0 + 5.0 + 35.0) / 5.0));
    assert_eq!(summary.avg_delay, (45.0 - 10.0 + 75.0 - 15.0 + 0.0) / 5.0);
    assert_eq!(summary.on_time_rate(), 60.0);
    assert_eq!(summary.active(), 4);
  }

  #[test]
  fn fleet_summary_ignores_unscored_in_average() {
    let mut transports = seed_transports();
    for t in transports.iter_mut() {
      t.risk_score = None;
    }
    transports[0].risk_score = Some(50);
    let summary = FleetSummary::from_transports(&transports);
    assert_eq!(summary.avg_risk, Some(50.0));
    assert_eq!(summary.high_risk, 0);

    let empty = FleetSummary::from_transports(&[]);
    assert_eq!(empty.avg_risk, None);
    assert_eq!(empty.on_time_rate(), 0.0);
  }

  #[test]
  fn snapshot_numbers_are_rounded_and_clamped() {
    let mut raw = serde_json::to_value(by_id(&seed_transports(), "T-005")).expect("transport serializes");
    raw["progress"] = serde_json::json!(45.5);
    raw["riskScore"] = serde_json::json!(-3);
    let t: Transport = serde_json::from_value(raw.clone()).expect("fractional progress parses");
    assert_eq!(t.progress, 46);
    assert_eq!(t.risk_score, Some(0));

    raw["riskScore"] = serde_json::Value::Null;
    let unscored: Transport = serde_json::from_value(raw).expect("null risk parses");
    assert_eq!(unscored.risk_score, None);
  }
}
