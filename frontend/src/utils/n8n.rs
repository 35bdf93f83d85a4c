use std::collections::BTreeMap;
use dioxus::logger::tracing::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use web_sys::Storage;

use super::{server::AppError, transport::Transport};

const TOKEN_KEY: &str = "n8n:token";
const WEBHOOKS_KEY: &str = "n8n:webhooks";

/// Automation workflows a page can hand its data off to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowKey {
  TransportTracking,
  CostAnalysis,
  InventoryOptimization,
  AiRecommendations
}

impl WorkflowKey {
  pub const ALL: [WorkflowKey; 4] = [
    WorkflowKey::TransportTracking,
    WorkflowKey::CostAnalysis,
    WorkflowKey::InventoryOptimization,
    WorkflowKey::AiRecommendations
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      WorkflowKey::TransportTracking => "transportTracking",
      WorkflowKey::CostAnalysis => "costAnalysis",
      WorkflowKey::InventoryOptimization => "inventoryOptimization",
      WorkflowKey::AiRecommendations => "aiRecommendations"
    }
  }

  pub fn from_key(key: &str) -> Option<WorkflowKey> {
    WorkflowKey::ALL.into_iter().find(|k| k.as_str() == key)
  }

  pub fn label(&self) -> &'static str {
    match self {
      WorkflowKey::TransportTracking => "Transport tracking",
      WorkflowKey::CostAnalysis => "Cost analysis",
      WorkflowKey::InventoryOptimization => "Inventory optimization",
      WorkflowKey::AiRecommendations => "AI recommendations"
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrationConfig {
  pub token: Option<String>,
  pub webhooks: BTreeMap<WorkflowKey, String>
}

/// Partial settings from the form. Unset fields keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
  /// `Some("")` clears the stored token
  pub token: Option<String>,
  /// an empty url removes the webhook for that key
  pub webhooks: BTreeMap<WorkflowKey, String>
}

impl IntegrationConfig {
  pub fn merge(&self, patch: ConfigPatch) -> IntegrationConfig {
    let token = match patch.token {
      Some(t) if t.trim().is_empty() => None,
      Some(t) => Some(t.trim().to_string()),
      None => self.token.clone()
    };

    let mut webhooks = self.webhooks.clone();
    for (key, url) in patch.webhooks {
      let url = url.trim();
      if url.is_empty() {
        webhooks.remove(&key);
      } else {
        webhooks.insert(key, url.to_string());
      }
    }
    IntegrationConfig { token, webhooks }
  }
}

/// Corrupt or missing webhook json reads as "nothing configured". Keys this
/// build does not know are skipped one by one, the rest are kept.
pub fn parse_webhooks(raw: Option<&str>) -> BTreeMap<WorkflowKey, String> {
  let stored: BTreeMap<String, String> = raw.and_then(|s| serde_json::from_str(s).ok()).unwrap_or_default();
  stored.into_iter()
    .filter_map(|(key, url)| WorkflowKey::from_key(&key).map(|k| (k, url)))
    .collect()
}

/// Browser local storage backing for the integration settings.
pub struct ConfigStore {
  storage: Storage
}

impl ConfigStore {
  pub fn open() -> Result<Self, AppError> {
    let window = web_sys::window().ok_or_else(|| AppError::WasmError("global window should exist".to_string()))?;
    let storage = window.local_storage()
      .map_err(|e| AppError::StorageError(format!("{:?}", e)))?
      .ok_or_else(|| AppError::StorageError("local storage unavailable".to_string()))?;
    Ok(Self { storage })
  }

  pub fn load(&self) -> IntegrationConfig {
    let token = self.storage.get_item(TOKEN_KEY).ok().flatten();
    let raw_webhooks = self.storage.get_item(WEBHOOKS_KEY).ok().flatten();
    IntegrationConfig { token, webhooks: parse_webhooks(raw_webhooks.as_deref()) }
  }

  pub fn save(&self, config: &IntegrationConfig) -> Result<(), AppError> {
    let token_write = match &config.token {
      Some(token) => self.storage.set_item(TOKEN_KEY, token),
      None => self.storage.remove_item(TOKEN_KEY)
    };
    token_write.map_err(|e| AppError::StorageError(format!("{:?}", e)))?;

    let webhooks = serde_json::to_string(&config.webhooks).map_err(|e| AppError::SerializeError(e.to_string()))?;
    self.storage.set_item(WEBHOOKS_KEY, &webhooks).map_err(|e| AppError::StorageError(format!("{:?}", e)))?;
    info!("integration settings saved ({} webhooks)", config.webhooks.len());
    Ok(())
  }
}

/// `{_source, _sentAt, ..payload}`; payload keys win on collision.
pub fn build_envelope(source: &str, sent_at: &str, payload: Value) -> Value {
  let mut body = Map::new();
  body.insert("_source".to_string(), Value::String(source.to_string()));
  body.insert("_sentAt".to_string(), Value::String(sent_at.to_string()));
  match payload {
    Value::Object(fields) => body.extend(fields),
    Value::Null => {},
    other => {
      body.insert("payload".to_string(), other);
    }
  }
  Value::Object(body)
}

/// What the tracking page hands to its workflow.
pub fn tracking_payload(transports: &[Transport]) -> Value {
  let transports: Vec<Value> = transports.iter()
    .map(|t| json!({ "id": t.id, "status": t.status, "route": t.route }))
    .collect();
  json!({ "transports": transports })
}

/// Fire-and-forget POST to a configured webhook. Never retried.
pub struct WorkflowTrigger {
  client: reqwest::Client,
  config: IntegrationConfig
}

impl WorkflowTrigger {
  pub fn new(client: reqwest::Client, config: IntegrationConfig) -> Self {
    Self { client, config }
  }

  pub async fn trigger(&self, key: WorkflowKey, payload: Value) -> Result<(), AppError> {
    let url = self.config.webhooks.get(&key).ok_or_else(|| AppError::WebhookMissing(key.as_str().to_string()))?;

    let source = web_sys::window().and_then(|w| w.location().origin().ok()).unwrap_or_default();
    let sent_at: String = js_sys::Date::new_0().to_iso_string().into();
    let body = build_envelope(&source, &sent_at, payload);

    let mut req = self.client.post(url).json(&body);
    if let Some(token) = &self.config.token {
      req = req.header("Authorization", format!("Bearer {}", token));
    }

    let resp = req.send().await.map_err(|e| {
      error!("n8n trigger for {} failed: {}", key.as_str(), e);
      AppError::WebhookError(e.to_string())
    })?;
    if !resp.status().is_success() {
      return Err(AppError::WebhookError(format!("webhook answered with status {}", resp.status().as_u16())));
    }
    info!("n8n workflow {} triggered", key.as_str());
    Ok(())
  }
}
