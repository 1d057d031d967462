//! fOS Sprite DOM - Document Object Model
//!
//! Arena-based DOM tree, simple selectors and a single-threaded window
//! model (custom events, history observers, globals).

mod interner;
mod node;
mod tree;
mod document;
mod selector;
mod operations;
mod window;

pub use interner::{InternedString, StringInterner};
pub use node::{Attribute, ElementData, Node, NodeData};
pub use tree::DomTree;
pub use document::Document;
pub use selector::{AttrMatch, AttrSelector, CompoundSelector, SelectorList};
pub use operations::{DomError, DomResult};
pub use window::{CustomEvent, ListenerGuard, ListenerId, Window};

use serde::{Deserialize, Serialize};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this ID refers to a node at all
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Wrap a sentinel-style link into an `Option`
    #[inline]
    pub(crate) fn some(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}
