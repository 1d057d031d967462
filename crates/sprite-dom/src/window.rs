//! Window
//!
//! Single-threaded model of the browsing context that hosts a document:
//! custom events with JSON detail payloads, history observers notified on
//! `push_state`, the set of global names a page defines, and the user
//! agent string.
//!
//! Callbacks are invoked after every internal borrow is released, so a
//! listener may add or remove listeners or mutate the document.

use std::cell::{BorrowMutError, Cell, Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;

use crate::Document;

/// Identifies a registered listener or history observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A custom window event (`new CustomEvent(name, { detail })`)
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    pub name: String,
    pub detail: serde_json::Value,
}

impl CustomEvent {
    pub fn new(name: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            detail,
        }
    }

    /// Deserialize the detail payload
    pub fn detail_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.detail)
    }
}

type EventCallback = Rc<dyn Fn(&CustomEvent)>;
type HistoryCallback = Rc<dyn Fn(&str, &str)>;

struct EventListener {
    id: ListenerId,
    event: String,
    callback: EventCallback,
}

struct HistoryObserver {
    id: ListenerId,
    callback: HistoryCallback,
}

/// Browsing context hosting a [`Document`]
pub struct Window {
    document: RefCell<Document>,
    user_agent: String,
    location: RefCell<String>,
    globals: RefCell<HashSet<String>>,
    listeners: RefCell<Vec<EventListener>>,
    history_observers: RefCell<Vec<HistoryObserver>>,
    next_id: Cell<u64>,
}

impl Window {
    pub fn new(document: Document, user_agent: &str) -> Self {
        let location = document.url().to_string();
        Self {
            document: RefCell::new(document),
            user_agent: user_agent.to_string(),
            location: RefCell::new(location),
            globals: RefCell::new(HashSet::new()),
            listeners: RefCell::new(Vec::new()),
            history_observers: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.document.borrow_mut()
    }

    /// Like [`document_mut`](Self::document_mut), failing instead of
    /// panicking while the document is already borrowed
    pub fn try_document_mut(&self) -> Result<RefMut<'_, Document>, BorrowMutError> {
        self.document.try_borrow_mut()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Current location href
    pub fn location(&self) -> String {
        self.location.borrow().clone()
    }

    // ------------------------------------------------------------------
    // Globals
    // ------------------------------------------------------------------

    /// Define a global name (as a script would by assigning `window.name`)
    pub fn define_global(&self, name: &str) {
        self.globals.borrow_mut().insert(name.to_string());
    }

    pub fn remove_global(&self, name: &str) -> bool {
        self.globals.borrow_mut().remove(name)
    }

    /// `name in window`
    pub fn has_global(&self, name: &str) -> bool {
        self.globals.borrow().contains(name)
    }

    // ------------------------------------------------------------------
    // Custom events
    // ------------------------------------------------------------------

    fn next_listener_id(&self) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        ListenerId(id)
    }

    pub fn add_event_listener(
        &self,
        event: &str,
        callback: impl Fn(&CustomEvent) + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.listeners.borrow_mut().push(EventListener {
            id,
            event: event.to_string(),
            callback: Rc::new(callback),
        });
        tracing::trace!(event, ?id, "window listener added");
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn remove_event_listener(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| !(l.id == id && l.event == event));
        let removed = listeners.len() != before;
        if removed {
            tracing::trace!(event, ?id, "window listener removed");
        }
        removed
    }

    /// Number of listeners registered for an event name
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.event == event)
            .count()
    }

    /// Dispatch synchronously to every listener for `event.name`, in
    /// registration order. Returns how many listeners ran.
    pub fn dispatch_event(&self, event: &CustomEvent) -> usize {
        let callbacks: Vec<EventCallback> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.event == event.name)
            .map(|l| Rc::clone(&l.callback))
            .collect();

        tracing::debug!(event = %event.name, listeners = callbacks.len(), "dispatching window event");
        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }

    /// Register a listener that is removed when the guard drops
    pub fn listen(
        self: &Rc<Self>,
        event: &str,
        callback: impl Fn(&CustomEvent) + 'static,
    ) -> ListenerGuard {
        let id = self.add_event_listener(event, callback);
        ListenerGuard {
            window: Rc::downgrade(self),
            target: GuardTarget::Event(event.to_string()),
            id,
        }
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Observe client-side navigations; the callback receives `(old, new)`
    pub fn observe_history(&self, callback: impl Fn(&str, &str) + 'static) -> ListenerId {
        let id = self.next_listener_id();
        self.history_observers.borrow_mut().push(HistoryObserver {
            id,
            callback: Rc::new(callback),
        });
        id
    }

    pub fn unobserve_history(&self, id: ListenerId) -> bool {
        let mut observers = self.history_observers.borrow_mut();
        let before = observers.len();
        observers.retain(|o| o.id != id);
        observers.len() != before
    }

    pub fn history_observer_count(&self) -> usize {
        self.history_observers.borrow().len()
    }

    /// Observe history until the guard drops
    pub fn observe_history_scoped(
        self: &Rc<Self>,
        callback: impl Fn(&str, &str) + 'static,
    ) -> ListenerGuard {
        let id = self.observe_history(callback);
        ListenerGuard {
            window: Rc::downgrade(self),
            target: GuardTarget::History,
            id,
        }
    }

    /// Change the location without a navigation, notifying history observers
    pub fn push_state(&self, url: &str) {
        let old = self.location.replace(url.to_string());
        let callbacks: Vec<HistoryCallback> = self
            .history_observers
            .borrow()
            .iter()
            .map(|o| Rc::clone(&o.callback))
            .collect();

        tracing::debug!(old = %old, new = url, "history state pushed");
        for callback in &callbacks {
            callback(&old, url);
        }
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("user_agent", &self.user_agent)
            .field("location", &self.location.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .field("history_observers", &self.history_observers.borrow().len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum GuardTarget {
    Event(String),
    History,
}

/// RAII registration: unregisters its listener exactly once, on drop
#[derive(Debug)]
#[must_use = "dropping the guard unregisters the listener"]
pub struct ListenerGuard {
    window: Weak<Window>,
    target: GuardTarget,
    id: ListenerId,
}

impl ListenerGuard {
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let Some(window) = self.window.upgrade() else {
            return;
        };
        match &self.target {
            GuardTarget::Event(event) => {
                window.remove_event_listener(event, self.id);
            }
            GuardTarget::History => {
                window.unobserve_history(self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn window() -> Rc<Window> {
        Rc::new(Window::new(Document::default(), "test-agent"))
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let window = window();
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            window.add_event_listener("nav", move |_| log.borrow_mut().push(tag));
        }
        window.add_event_listener("other", |_| panic!("wrong event"));

        let ran = window.dispatch_event(&CustomEvent::new("nav", json!({})));
        assert_eq!(ran, 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_guard_unregisters_once() {
        let window = window();
        let guard = window.listen("nav", |_| {});
        let id = guard.id();
        assert_eq!(window.listener_count("nav"), 1);

        drop(guard);
        assert_eq!(window.listener_count("nav"), 0);
        assert!(!window.remove_event_listener("nav", id));
    }

    #[test]
    fn test_listener_can_remove_itself() {
        let window = window();
        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let weak = Rc::downgrade(&window);
        let slot_in = Rc::clone(&slot);
        let id = window.add_event_listener("once", move |_| {
            if let (Some(w), Some(id)) = (weak.upgrade(), slot_in.get()) {
                w.remove_event_listener("once", id);
            }
        });
        slot.set(Some(id));

        assert_eq!(window.dispatch_event(&CustomEvent::new("once", json!(null))), 1);
        assert_eq!(window.dispatch_event(&CustomEvent::new("once", json!(null))), 0);
    }

    #[test]
    fn test_push_state_notifies_observers() {
        let window = window();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in = Rc::clone(&seen);
        let guard = window.observe_history_scoped(move |old, new| {
            seen_in.borrow_mut().push((old.to_string(), new.to_string()));
        });

        window.push_state("/next");
        assert_eq!(window.location(), "/next");
        assert_eq!(
            *seen.borrow(),
            vec![("about:blank".to_string(), "/next".to_string())]
        );

        drop(guard);
        assert_eq!(window.history_observer_count(), 0);
    }

    #[test]
    fn test_try_document_mut_while_borrowed() {
        let window = window();
        {
            let _reader = window.document();
            assert!(window.try_document_mut().is_err());
        }
        assert!(window.try_document_mut().is_ok());
    }

    #[test]
    fn test_globals() {
        let window = window();
        assert!(!window.has_global("angular"));
        window.define_global("angular");
        assert!(window.has_global("angular"));
        assert!(window.remove_global("angular"));
    }

    #[test]
    fn test_detail_as() {
        #[derive(serde::Deserialize)]
        struct Detail {
            count: u32,
        }
        let event = CustomEvent::new("x", json!({ "count": 3 }));
        assert_eq!(event.detail_as::<Detail>().unwrap().count, 3);
    }
}
