#![allow(non_snake_case)]

use dioxus::prelude::*;

use crate::{
  components::{indicators::{ConnectionIndicator, KpiCard}, transport_tile::TransportTile},
  utils::{live::use_live_transports, transport::{FleetSummary, RiskLevel}},
  Route
};

#[component]
pub fn Home() -> Element {
  static CSS: Asset = asset!("assets/home.css");

  let live = use_live_transports();
  let transports = live.transports();
  let summary = use_memo(move || FleetSummary::from_transports(&transports.read()));

  let at_risk = use_memo(move || {
    transports.read()
      .iter()
      .filter(|t| t.risk_level() == Some(RiskLevel::Critical))
      .cloned()
      .collect::<Vec<_>>()
  });

  let s = summary();
  let avg_risk = s.avg_risk.map(|r| format!("{:.0}%", r)).unwrap_or_else(|| "n/a".to_string());

  rsx! {
    document::Stylesheet {href: CSS},
    div {
      class: "home-page",
      section {
        class: "hero",
        div {
          class: "hero-title",
          h1 { "Fleet overview" },
          ConnectionIndicator { connected: live.connected() }
        },
        p { "Live position, delay and risk of every transport on the road." },
        Link {
          class: "cta-button",
          to: Route::Tracking { },
          "Open tracking"
        }
      },
      section {
        class: "kpi-grid",
        KpiCard {
          title: "Active transports".to_string(),
          value: s.active().to_string(),
          hint: format!("{} in total, {} arrived", s.total, s.arrived),
          tone: "status-good".to_string()
        },
        KpiCard {
          title: "On-time rate".to_string(),
          value: format!("{:.1}%", s.on_time_rate()),
          hint: format!("{} delayed, {} critical", s.delayed, s.critical),
          tone: if s.critical > 0 { "status-warning".to_string() } else { "status-excellent".to_string() }
        },
        KpiCard {
          title: "Average delay".to_string(),
          value: format!("{:.0} min", s.avg_delay),
          hint: "across the whole fleet".to_string(),
          tone: if s.avg_delay > 15.0 { "status-warning".to_string() } else { "status-excellent".to_string() }
        },
        KpiCard {
          title: "Average risk".to_string(),
          value: avg_risk,
          hint: format!("{} high-risk transports", s.high_risk),
          tone: if s.high_risk > 0 { "status-critical".to_string() } else { "status-excellent".to_string() }
        }
      },
      section {
        class: "features",
        h2 { "Needs attention" },
        if at_risk.read().is_empty() {
          p { class: "muted", "No transport is above the critical risk threshold." }
        }
        for transport in at_risk() {
          TransportTile { key: "{transport.id}", transport }
        }
      }
    }
  }
}
