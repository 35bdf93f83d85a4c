#![allow(non_snake_case)]

use std::collections::BTreeMap;
use dioxus::{logger::tracing::{error, warn}, prelude::*};
use serde_json::json;

use crate::{
  components::toast::{Toast, ToastMessage},
  utils::n8n::{ConfigPatch, ConfigStore, IntegrationConfig, WorkflowKey, WorkflowTrigger}
};

fn load_config() -> IntegrationConfig {
  match ConfigStore::open() {
    Ok(store) => store.load(),
    Err(e) => {
      warn!("integration settings unavailable: {}", e);
      IntegrationConfig::default()
    }
  }
}

#[component]
pub fn Integrations() -> Element {
  static CSS: Asset = asset!("assets/integrations.css");

  let mut stored = use_signal(load_config);
  let mut token = use_signal(|| stored.peek().token.clone().unwrap_or_default());
  let mut webhooks: Signal<BTreeMap<WorkflowKey, String>> = use_signal(|| stored.peek().webhooks.clone());
  let mut toast: Signal<Option<ToastMessage>> = use_signal(|| None);

  let save = move |evt: FormEvent| {
    evt.prevent_default();

    let mut patch = ConfigPatch { token: Some(token()), webhooks: BTreeMap::new() };
    for key in WorkflowKey::ALL {
      let url = webhooks.read().get(&key).cloned().unwrap_or_default();
      patch.webhooks.insert(key, url);
    }
    let merged = stored.peek().merge(patch);

    let saved = ConfigStore::open().and_then(|store| store.save(&merged));
    match saved {
      Ok(()) => {
        webhooks.set(merged.webhooks.clone());
        stored.set(merged);
        toast.set(Some(ToastMessage::success("Settings saved", "n8n integration settings were stored in this browser.")));
      },
      Err(e) => {
        error!("saving integration settings failed: {}", e);
        toast.set(Some(ToastMessage::error("Settings not saved", &e.to_string())));
      }
    }
  };

  let send_test = move |key: WorkflowKey| {
    let config = stored.peek().clone();
    spawn(async move {
      let result = WorkflowTrigger::new(reqwest::Client::new(), config)
        .trigger(key, json!({ "test": true, "workflow": key.as_str() }))
        .await;
      match result {
        Ok(()) => toast.set(Some(ToastMessage::success("Test sent", key.label()))),
        Err(e) => toast.set(Some(ToastMessage::error("Test failed", &e.to_string())))
      }
    });
  };

  rsx! {
    document::Stylesheet {href: CSS},
    div {
      class: "integrations-page",
      h1 { "n8n integration" },
      p { class: "muted", "Webhook urls and the API token are kept in this browser only." },
      form {
        class: "settings-form",
        onsubmit: save,
        div {
          class: "form-group",
          label { r#for: "n8n-token", "API token" },
          input {
            id: "n8n-token",
            r#type: "password",
            placeholder: "optional bearer token",
            value: "{token}",
            oninput: move |evt| token.set(evt.value())
          }
        },
        for key in WorkflowKey::ALL {
          div {
            key: "{key.as_str()}",
            class: "form-group",
            label { r#for: "{key.as_str()}", "{key.label()}" },
            div {
              class: "webhook-row",
              input {
                id: "{key.as_str()}",
                r#type: "url",
                placeholder: "https://n8n.example.com/webhook/...",
                value: webhooks.read().get(&key).cloned().unwrap_or_default(),
                oninput: move |evt| {
                  webhooks.write().insert(key, evt.value());
                }
              },
              button {
                class: "button button-mode",
                r#type: "button",
                disabled: !stored.read().webhooks.contains_key(&key),
                onclick: move |_| send_test(key),
                "Test"
              }
            }
          }
        }
        button { class: "button", r#type: "submit", "Save" }
      },
      Toast { message: toast }
    }
  }
}
