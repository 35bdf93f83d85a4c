use dioxus::prelude::*;
use crate::Route;

#[component]
pub fn Template() -> Element {
  static CSS: Asset = asset!("assets/template.css");

  rsx! {
    document::Stylesheet {href: CSS},
    Header { }
    main {
      class: "page-container",
      Outlet::<Route> {}
    }
    Footer { }
  }
}

#[component]
fn Header() -> Element {
  rsx!{
    nav {
      div {
        class: "nav-container",
        Link {
          class: "logo",
          to: Route::Home { },
          span { class: "logo-mark", "🚚" },
          "Logistics Control"
        }
        div {
          class: "nav-links",
          Link {
            active_class: "nav-active",
            to: Route::Home { },
            "Overview"
          },
          Link {
            active_class: "nav-active",
            to: Route::Tracking { },
            "Tracking"
          },
          Link {
            active_class: "nav-active",
            to: Route::Integrations { },
            "Integrations"
          },
        }
      }
    }
  }
}

#[component]
fn Footer() -> Element {
  rsx!{
    footer {
      div {
        class: "footer-container",
        div {
          class: "copyright",
          p { "Live fleet data refreshes every few hundred milliseconds" }
        },
        div {
          class: "footer-links",
          a {
            href: "https://docs.n8n.io/",
            target: "_blank",
            class: "social-link",
            title: "n8n documentation",
            "n8n docs"
          }
        }
      }
    }
  }
}
