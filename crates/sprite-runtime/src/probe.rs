//! Environment probe
//!
//! The auto-configurator asks the hosting page three questions: is there
//! a `<base>` element, is a routing framework loaded, and which engine is
//! rendering. [`EnvironmentProbe`] is the seam; [`Window`] answers from the
//! live page and [`StaticProbe`] from fixed values.

use sprite_dom::Window;

/// Global name whose presence marks an AngularJS page
pub const ROUTING_FRAMEWORK_MARKER: &str = "angular";

/// Rendering engine family, as detected from the user agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserEngine {
    /// Firefox
    Gecko,
    /// Legacy (pre-Chromium) Edge
    EdgeHtml,
    /// Internet Explorer
    Trident,
    /// Chrome and Chromium derivatives
    Blink,
    /// Safari
    WebKit,
    #[default]
    Unknown,
}

impl BrowserEngine {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("firefox") {
            Self::Gecko
        } else if ua.contains("edge/") {
            Self::EdgeHtml
        } else if ua.contains("msie") || ua.contains("trident") {
            Self::Trident
        } else if ua.contains("chrome") || ua.contains("chromium") {
            Self::Blink
        } else if ua.contains("applewebkit") {
            Self::WebKit
        } else {
            Self::Unknown
        }
    }

    /// Gecko resolves gradients defined inside `<symbol>` incorrectly
    pub fn is_firefox(self) -> bool {
        self == Self::Gecko
    }
}

/// Read-only view of the hosting page used for auto-configuration
pub trait EnvironmentProbe {
    /// Whether the document has a `<base>` element
    fn has_base_tag(&self) -> bool;

    /// `href` of the first `<base>` element
    fn base_href(&self) -> Option<String>;

    /// Whether the routing framework marker is defined globally
    fn has_routing_framework_marker(&self) -> bool;

    fn detected_engine(&self) -> BrowserEngine;
}

impl EnvironmentProbe for Window {
    fn has_base_tag(&self) -> bool {
        self.document().base_element().is_some()
    }

    fn base_href(&self) -> Option<String> {
        self.document().base_href().map(str::to_string)
    }

    fn has_routing_framework_marker(&self) -> bool {
        self.has_global(ROUTING_FRAMEWORK_MARKER)
    }

    fn detected_engine(&self) -> BrowserEngine {
        BrowserEngine::from_user_agent(self.user_agent())
    }
}

/// Probe with fixed answers, for tests and non-browser hosts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticProbe {
    pub base_href: Option<String>,
    pub routing_framework: bool,
    pub engine: BrowserEngine,
}

impl EnvironmentProbe for StaticProbe {
    fn has_base_tag(&self) -> bool {
        self.base_href.is_some()
    }

    fn base_href(&self) -> Option<String> {
        self.base_href.clone()
    }

    fn has_routing_framework_marker(&self) -> bool {
        self.routing_framework
    }

    fn detected_engine(&self) -> BrowserEngine {
        self.engine
    }
}
