#![allow(non_snake_case)]

use dioxus::{logger::tracing::warn, prelude::*};

use crate::{
  components::{
    indicators::ConnectionIndicator,
    toast::{InlineError, Toast, ToastMessage},
    transport_tile::TransportTile
  },
  utils::{
    live::use_live_transports,
    n8n::{tracking_payload, ConfigStore, WorkflowKey, WorkflowTrigger}
  }
};

#[component]
pub fn Tracking() -> Element {
  static CSS: Asset = asset!("assets/tracking.css");

  let live = use_live_transports();
  let transports = live.transports();
  let loading = live.loading();
  let error = live.error();
  let mut toast: Signal<Option<ToastMessage>> = use_signal(|| None);
  let mut sending = use_signal(|| false);

  let send_to_n8n = move |_: MouseEvent| {
    if sending() {
      return;
    }
    let payload = tracking_payload(&transports.read());
    spawn(async move {
      sending.set(true);
      let result = match ConfigStore::open() {
        Ok(store) => WorkflowTrigger::new(reqwest::Client::new(), store.load())
          .trigger(WorkflowKey::TransportTracking, payload)
          .await,
        Err(e) => Err(e)
      };
      match result {
        Ok(()) => toast.set(Some(ToastMessage::success("Workflow triggered", "Transport data was sent to n8n."))),
        Err(e) => {
          warn!("tracking workflow not triggered: {}", e);
          toast.set(Some(ToastMessage::error("Could not reach n8n", &e.to_string())));
        }
      }
      sending.set(false);
    });
  };

  rsx! {
    document::Stylesheet {href: CSS},
    div {
      class: "tracking-page",
      div {
        class: "tracking-header",
        div {
          h1 { "Transport tracking" },
          ConnectionIndicator { connected: live.connected() }
        },
        div {
          class: "control-group",
          button {
            class: "button button-mode",
            disabled: loading(),
            onclick: move |_| live.refresh(),
            if loading() { "Refreshing..." } else { "Refresh" }
          },
          button {
            class: "button",
            disabled: sending(),
            onclick: send_to_n8n,
            "Send to n8n"
          }
        }
      },
      if let Some(message) = error() {
        InlineError {
          message,
          on_retry: move |_| live.refresh(),
          on_dismiss: move |_| live.dismiss_error()
        }
      }
      if loading() && transports.read().is_empty() {
        div { class: "loading", "Loading transports..." }
      } else if transports.read().is_empty() {
        div { class: "empty-state", "No transports to show." }
      } else {
        div {
          class: "tile-list",
          for transport in transports() {
            TransportTile { key: "{transport.id}", transport }
          }
        }
      }
      Toast { message: toast }
    }
  }
}
