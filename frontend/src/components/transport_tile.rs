#![allow(non_snake_case)]

use dioxus::prelude::*;

use crate::{components::indicators::{RiskBadge, StatusBadge}, utils::transport::Transport};

/// "+30 min" / "-10 min", nothing when on schedule
pub fn delay_label(delay: i32) -> Option<String> {
  match delay {
    0 => None,
    d if d > 0 => Some(format!("+{} min", d)),
    d => Some(format!("{} min", d))
  }
}

#[component]
pub fn TransportTile(transport: Transport) -> Element {
  let status_class = transport.status.css_class();
  let delay = delay_label(transport.delay);
  let delay_class = if transport.delay > 0 { "delay status-warning" } else { "delay status-excellent" };

  rsx! {
    div {
      class: "transport-tile",
      "data-testid": "transport-tile",
      div {
        class: "tile-header",
        div {
          class: "tile-title",
          span { class: "status-dot {status_class}" },
          div {
            h3 { "{transport.order_no}" },
            p { class: "muted", "{transport.route.from} → {transport.route.to}" }
          }
        },
        div {
          class: "tile-badges",
          if let Some(score) = transport.risk_score {
            RiskBadge { score }
          }
          StatusBadge { status: transport.status }
        }
      },
      div {
        class: "tile-body",
        div {
          p { class: "strong", "{transport.position.address}" },
          p { class: "muted small", "Current position" }
        },
        div {
          p {
            class: "strong",
            "ETA: {transport.eta}",
            if let Some(label) = delay {
              span { class: "{delay_class}", " ({label})" }
            }
          },
          p { class: "muted small", "Planned: {transport.plan_eta}" }
        },
        div {
          p { class: "strong", "{transport.driver}" },
          p { class: "muted small", "{transport.cargo}" }
        }
      },
      div {
        class: "tile-progress",
        div {
          class: "progress-labels",
          span { class: "muted small", "Progress" },
          span { class: "muted small", "{transport.progress}%" }
        },
        div {
          class: "progress-track",
          div { class: "progress-fill", width: "{transport.progress}%" }
        }
      }
    }
  }
}
