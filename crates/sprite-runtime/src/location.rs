//! Location change events
//!
//! Routers tell the sprite that the base URL changed by dispatching a
//! custom window event whose detail is `{ "oldUrl": ..., "newUrl": ... }`.
//! For pages running the routing framework, [`install_emitter`] dispatches
//! that event on every client-side navigation.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use sprite_dom::{CustomEvent, ListenerGuard, Window};

/// Detail payload of the location change event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationChange {
    pub old_url: String,
    pub new_url: String,
}

impl LocationChange {
    pub fn new(old_url: impl Into<String>, new_url: impl Into<String>) -> Self {
        Self {
            old_url: old_url.into(),
            new_url: new_url.into(),
        }
    }

    pub fn from_event(event: &CustomEvent) -> Result<Self, serde_json::Error> {
        event.detail_as()
    }

    pub fn into_event(self, name: &str) -> CustomEvent {
        let detail = serde_json::json!({
            "oldUrl": self.old_url,
            "newUrl": self.new_url,
        });
        CustomEvent::new(name, detail)
    }
}

/// Dispatch `{old, new}` to the window as event `name`
pub fn dispatch(window: &Window, name: &str, old_url: &str, new_url: &str) -> usize {
    window.dispatch_event(&LocationChange::new(old_url, new_url).into_event(name))
}

/// Re-emit routing-framework navigations as `event_name` window events.
/// The hook stays installed until the guard drops.
pub fn install_emitter(window: &Rc<Window>, event_name: &str) -> ListenerGuard {
    let weak = Rc::downgrade(window);
    let name = event_name.to_string();
    tracing::debug!(event = event_name, "location change emitter installed");
    window.observe_history_scoped(move |old_url, new_url| {
        if let Some(window) = weak.upgrade() {
            dispatch(&window, &name, old_url, new_url);
        }
    })
}
