use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportStatus {
  OnTime,
  Delayed,
  Critical,
  Arrived
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
  pub from: String,
  pub to: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub lat: f64,
  pub lng: f64,
  pub address: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
  pub id: String,
  pub order_no: String,
  pub route: Route,
  pub status: TransportStatus,
  pub eta: String,
  pub plan_eta: String,
  pub delay: i32,
  pub position: Position,
  pub cargo: String,
  pub driver: String,
  pub progress: u8,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub risk_score: Option<u8>
}

/// Sparse update as pushed on the `transportUpdate` channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportUpdate {
  pub id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<TransportStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub eta: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub delay: Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub position: Option<Position>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub progress: Option<u8>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub risk_score: Option<u8>
}

impl TransportUpdate {
  pub fn is_empty(&self) -> bool {
    self.status.is_none()
      && self.eta.is_none()
      && self.delay.is_none()
      && self.position.is_none()
      && self.progress.is_none()
      && self.risk_score.is_none()
  }
}

impl Transport {
  pub fn apply(&mut self, update: &TransportUpdate) {
    if let Some(status) = update.status {
      self.status = status;
    }
    if let Some(eta) = &update.eta {
      self.eta = eta.clone();
    }
    if let Some(delay) = update.delay {
      self.delay = delay;
    }
    if let Some(position) = &update.position {
      self.position = position.clone();
    }
    if let Some(progress) = update.progress {
      self.progress = progress.min(100);
    }
    if let Some(risk) = update.risk_score {
      self.risk_score = Some(risk.min(100));
    }
  }
}

fn seed(id: &str, order_no: &str, route: (&str, &str), status: TransportStatus, eta: &str, plan_eta: &str, delay: i32,
  position: (f64, f64, &str), cargo: &str, driver: &str, progress: u8, risk_score: u8) -> Transport {
  Transport {
    id: id.to_string(),
    order_no: order_no.to_string(),
    route: Route { from: route.0.to_string(), to: route.1.to_string() },
    status,
    eta: eta.to_string(),
    plan_eta: plan_eta.to_string(),
    delay,
    position: Position { lat: position.0, lng: position.1, address: position.2.to_string() },
    cargo: cargo.to_string(),
    driver: driver.to_string(),
    progress,
    risk_score: Some(risk_score)
  }
}

/// Starting fleet, identical to the dashboard's placeholder collection.
pub fn seed_fleet() -> Vec<Transport> {
  vec![
    seed("T-001", "SO-8832", ("München", "Hamburg"), TransportStatus::Delayed, "14:45", "14:00", 45,
      (52.3, 9.8, "A7 bei Hannover"), "Elektronikteile (2.4t)", "M. Schmidt", 65, 72),
    seed("T-002", "SO-8833", ("Berlin", "Stuttgart"), TransportStatus::OnTime, "16:20", "16:30", -10,
      (50.8, 11.2, "A9 bei Erfurt"), "Maschinenbauteile (4.8t)", "A. Weber", 45, 25),
    seed("T-003", "SO-8834", ("Köln", "Dresden"), TransportStatus::Critical, "18:15", "17:00", 75,
      (50.9, 6.9, "A1 Stau bei Köln"), "Chemikalien (3.2t)", "P. Müller", 20, 89),
    seed("T-004", "SO-8835", ("Frankfurt", "Nürnberg"), TransportStatus::Arrived, "12:30", "12:45", -15,
      (49.5, 11.1, "Nürnberg Logistikzentrum"), "Automotive Teile (5.1t)", "S. Fischer", 100, 5),
    seed("T-005", "SO-8836", ("Düsseldorf", "Leipzig"), TransportStatus::OnTime, "15:30", "15:30", 0,
      (51.3, 7.5, "A44 bei Dortmund"), "Textilien (1.8t)", "L. Becker", 30, 35),
  ]
}
