//! Event hub
//!
//! Minimal publish/subscribe used to hang optional behavior (gradient
//! relocation, base-tag URL sync) off the sprite lifecycle. Handlers run
//! synchronously on the publisher's stack, in registration order, and
//! receive the document plus the node the event is about.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use sprite_dom::{Document, NodeId};

use crate::error::SpriteResult;

/// Lifecycle topics published by the sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteEvent {
    /// A fresh container node was rendered (not yet attached)
    Render,
    /// The container node was attached to the document
    Mount,
}

pub type Handler = Box<dyn FnMut(&mut Document, NodeId) -> SpriteResult<()>>;

/// Topic → ordered handler list
pub struct EventHub<T> {
    topics: HashMap<T, Vec<Handler>>,
}

impl<T: Eq + Hash + fmt::Debug> EventHub<T> {
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
        }
    }

    pub fn subscribe(
        &mut self,
        topic: T,
        handler: impl FnMut(&mut Document, NodeId) -> SpriteResult<()> + 'static,
    ) {
        self.topics.entry(topic).or_default().push(Box::new(handler));
    }

    /// Run every handler for `topic`. The first failing handler aborts
    /// the rest and its error is returned. Returns how many handlers ran.
    pub fn publish(&mut self, topic: &T, document: &mut Document, node: NodeId) -> SpriteResult<usize> {
        let Some(handlers) = self.topics.get_mut(topic) else {
            return Ok(0);
        };
        tracing::trace!(?topic, handlers = handlers.len(), "publishing");
        for handler in handlers.iter_mut() {
            handler(&mut *document, node)?;
        }
        Ok(handlers.len())
    }

    /// Drop every handler of every topic
    pub fn unsubscribe_all(&mut self) {
        self.topics.clear();
    }

    pub fn subscriber_count(&self, topic: &T) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.topics.values().all(Vec::is_empty)
    }
}

impl<T: Eq + Hash + fmt::Debug> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for EventHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.topics.iter().map(|(topic, handlers)| (topic, handlers.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpriteError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_handlers_run_in_order() {
        let mut hub = EventHub::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 1..=3 {
            let log = Rc::clone(&log);
            hub.subscribe(SpriteEvent::Mount, move |_, _| {
                log.borrow_mut().push(n);
                Ok(())
            });
        }

        let mut doc = Document::default();
        let body = doc.body();
        assert_eq!(hub.publish(&SpriteEvent::Mount, &mut doc, body).unwrap(), 3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_handler_can_mutate_node() {
        let mut hub = EventHub::new();
        hub.subscribe(SpriteEvent::Render, |doc: &mut Document, node| {
            doc.tree.set_attribute(node, "data-rendered", "1")?;
            Ok(())
        });

        let mut doc = Document::default();
        let node = doc.tree.create_element("svg");
        hub.publish(&SpriteEvent::Render, &mut doc, node).unwrap();
        assert_eq!(doc.tree.get_attribute(node, "data-rendered"), Some("1"));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let mut hub: EventHub<SpriteEvent> = EventHub::new();
        let mut doc = Document::default();
        let body = doc.body();
        assert_eq!(hub.publish(&SpriteEvent::Render, &mut doc, body).unwrap(), 0);
    }

    #[test]
    fn test_error_aborts_remaining_handlers() {
        let mut hub = EventHub::new();
        let ran_after = Rc::new(RefCell::new(false));
        hub.subscribe(SpriteEvent::Mount, |_, _| {
            Err(SpriteError::NotMounted { operation: "test" })
        });
        let flag = Rc::clone(&ran_after);
        hub.subscribe(SpriteEvent::Mount, move |_, _| {
            *flag.borrow_mut() = true;
            Ok(())
        });

        let mut doc = Document::default();
        let body = doc.body();
        assert!(hub.publish(&SpriteEvent::Mount, &mut doc, body).is_err());
        assert!(!*ran_after.borrow());
    }

    #[test]
    fn test_unsubscribe_all() {
        let mut hub = EventHub::new();
        hub.subscribe(SpriteEvent::Render, |_, _| panic!("handler survived"));
        hub.subscribe(SpriteEvent::Mount, |_, _| panic!("handler survived"));

        hub.unsubscribe_all();
        assert!(hub.is_empty());
        assert_eq!(hub.subscriber_count(&SpriteEvent::Render), 0);
        assert_eq!(hub.subscriber_count(&SpriteEvent::Mount), 0);

        let mut doc = Document::default();
        let body = doc.body();
        assert_eq!(hub.publish(&SpriteEvent::Render, &mut doc, body).unwrap(), 0);
        assert_eq!(hub.publish(&SpriteEvent::Mount, &mut doc, body).unwrap(), 0);
    }
}
