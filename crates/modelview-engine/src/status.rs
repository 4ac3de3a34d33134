//! User-facing status reporting.
//!
//! The pipeline never touches presentation directly; it reports to a
//! `StatusSink` and the host decides how to show it.

use tracing::{error, info, warn};

use crate::error::Failure;

pub trait StatusSink {
    /// Short progress/status line (`Loading: 40%`).
    fn status(&self, message: &str);

    /// A load or action failure.
    fn error(&self, failure: &Failure);

    /// Blocking notice for failed destructive actions (upload, customize).
    fn alert(&self, message: &str);
}

/// Reports everything through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn status(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, failure: &Failure) {
        error!("{}", failure.message());
    }

    fn alert(&self, message: &str) {
        warn!("ALERT: {}", message);
    }
}

/// Writes status into the `debugInfo` element and alerts via `window.alert`.
#[cfg(target_arch = "wasm32")]
pub struct DomStatus {
    element_id: String,
}

#[cfg(target_arch = "wasm32")]
impl DomStatus {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
        }
    }

    fn element(&self) -> Option<web_sys::Element> {
        web_sys::window()?
            .document()?
            .get_element_by_id(&self.element_id)
    }
}

#[cfg(target_arch = "wasm32")]
impl StatusSink for DomStatus {
    fn status(&self, message: &str) {
        match self.element() {
            Some(el) => el.set_text_content(Some(message)),
            None => info!("{}", message),
        }
    }

    fn error(&self, failure: &Failure) {
        error!("{}", failure.message());
    }

    fn alert(&self, message: &str) {
        if let Some(win) = web_sys::window() {
            let _ = win.alert_with_message(message);
        }
    }
}
