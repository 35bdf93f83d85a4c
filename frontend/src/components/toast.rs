#![allow(non_snake_case)]

use std::time::Duration;
use dioxus::prelude::*;

const TOAST_VISIBLE: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, PartialEq)]
pub enum ToastKind {
  Success,
  Error
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToastMessage {
  pub kind: ToastKind,
  pub title: String,
  pub body: String
}

impl ToastMessage {
  pub fn success(title: &str, body: &str) -> Self {
    Self { kind: ToastKind::Success, title: title.to_string(), body: body.to_string() }
  }

  pub fn error(title: &str, body: &str) -> Self {
    Self { kind: ToastKind::Error, title: title.to_string(), body: body.to_string() }
  }
}

/// Shows the message for a moment, then clears it.
#[component]
pub fn Toast(message: Signal<Option<ToastMessage>>) -> Element {
  let mut message = message;
  use_effect(move || {
    if message.read().is_some() {
      spawn(async move {
        async_std::task::sleep(TOAST_VISIBLE).await;
        message.set(None);
      });
    }
  });

  rsx! {
    if let Some(toast) = message() {
      div {
        class: if toast.kind == ToastKind::Error { "toast show toast-error" } else { "toast show toast-success" },
        strong { "{toast.title}" },
        p { "{toast.body}" }
      }
    }
  }
}

#[component]
pub fn InlineError(message: String, on_retry: EventHandler<()>, on_dismiss: EventHandler<()>) -> Element {
  rsx! {
    div {
      class: "inline-error",
      role: "alert",
      p { "{message}" },
      div {
        class: "control-group",
        button { class: "button", onclick: move |_| on_retry.call(()), "Retry" },
        button { class: "button button-mode", onclick: move |_| on_dismiss.call(()), "Dismiss" }
      }
    }
  }
}
