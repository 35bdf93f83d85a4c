#![allow(non_snake_case)]

use dioxus::prelude::*;

use crate::utils::transport::{RiskLevel, TransportStatus};

#[component]
pub fn StatusBadge(status: TransportStatus) -> Element {
  rsx! {
    span {
      class: "badge {status.css_class()}",
      "{status.label()}"
    }
  }
}

#[component]
pub fn RiskBadge(score: u8) -> Element {
  let level = RiskLevel::from_score(score);
  rsx! {
    span {
      class: "risk-badge {level.css_class()}",
      "data-testid": "risk-badge",
      "Risk {score}%"
    }
  }
}

#[component]
pub fn ConnectionIndicator(connected: ReadOnlySignal<bool>) -> Element {
  rsx! {
    if connected() {
      span { class: "connection live", span { class: "pulse" }, "Live" }
    } else {
      span { class: "connection offline", "Offline" }
    }
  }
}

#[component]
pub fn KpiCard(title: String, value: String, hint: String, tone: String) -> Element {
  rsx! {
    div {
      class: "kpi-card {tone}",
      p { class: "kpi-title", "{title}" },
      p { class: "kpi-value", "{value}" },
      p { class: "kpi-hint muted small", "{hint}" }
    }
  }
}
