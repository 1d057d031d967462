//! Sprite configuration
//!
//! Caller input ([`PartialConfig`]) is merged over the built-in defaults
//! key by key; the `attrs` map is merged per attribute rather than
//! replaced. When `autoConfigure` is on, the three environment-dependent
//! options the caller left unset are then filled from an
//! [`EnvironmentProbe`]. Explicit values always win over detection.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sprite_dom::NodeId;

use crate::error::ConfigError;
use crate::probe::EnvironmentProbe;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Where the sprite gets mounted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MountTarget {
    /// An element already in the document
    Node(NodeId),
    /// A selector resolved with `query_selector` at mount time
    Selector(String),
}

impl From<&str> for MountTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for MountTarget {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl From<NodeId> for MountTarget {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl fmt::Display for MountTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "node #{}", id.index()),
            Self::Selector(selector) => write!(f, "{selector:?}"),
        }
    }
}

/// Attributes put on the sprite's root `<svg>`
pub fn default_attrs() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("xmlns".to_string(), SVG_NS.to_string()),
        ("xmlns:xlink".to_string(), XLINK_NS.to_string()),
        (
            "style".to_string(),
            "position: absolute; width: 0; height: 0".to_string(),
        ),
        ("aria-hidden".to_string(), "true".to_string()),
    ])
}

/// Complete, resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteConfig {
    /// Fill unset environment-dependent options by detection
    pub auto_configure: bool,
    /// Rewrite bare `#id` references to the `<base href>` at mount
    pub sync_urls_with_base_tag: bool,
    /// Register a window listener for `location_change_event`
    pub listen_location_change_event: bool,
    /// Custom event name carrying `{ oldUrl, newUrl }`
    pub location_change_event: String,
    /// Dispatch `location_change_event` on routing-framework navigation
    pub location_change_angular_emitter: bool,
    /// Relocate gradients out of `<symbol>` at render (Gecko workaround)
    pub move_gradients_outside_symbol: bool,
    /// Default mount target
    pub mount_to: MountTarget,
    /// Selector for elements whose references are rewritten
    pub usages_to_update: String,
    /// Root `<svg>` attributes
    pub attrs: BTreeMap<String, String>,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            auto_configure: true,
            sync_urls_with_base_tag: false,
            listen_location_change_event: false,
            location_change_event: "locationChange".to_string(),
            location_change_angular_emitter: false,
            move_gradients_outside_symbol: false,
            mount_to: MountTarget::Selector("body".to_string()),
            usages_to_update: "use[*|href]".to_string(),
            attrs: default_attrs(),
        }
    }
}

impl SpriteConfig {
    /// Merge `options` over the defaults, then auto-configure the gaps
    pub fn resolve(options: &PartialConfig, probe: &dyn EnvironmentProbe) -> Self {
        let mut config = Self::default().merged(options);
        if config.auto_configure {
            config.fill_from_environment(options, probe);
        }
        config
    }

    fn merged(mut self, options: &PartialConfig) -> Self {
        macro_rules! take {
            ($config:ident, $options:ident; $($field:ident),* $(,)?) => {
                $(if let Some(value) = &$options.$field {
                    $config.$field = value.clone();
                })*
            };
        }
        take!(
            self, options;
            auto_configure,
            sync_urls_with_base_tag,
            listen_location_change_event,
            location_change_event,
            location_change_angular_emitter,
            move_gradients_outside_symbol,
            mount_to,
            usages_to_update,
        );
        if let Some(attrs) = &options.attrs {
            self.attrs
                .extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        self
    }

    fn fill_from_environment(&mut self, options: &PartialConfig, probe: &dyn EnvironmentProbe) {
        if options.sync_urls_with_base_tag.is_none() {
            // A `<base>` without `href` (e.g. only `target`) leaves nothing to sync
            let base_href = probe.base_href();
            if probe.has_base_tag() && base_href.is_none() {
                tracing::debug!("<base> element has no href; base tag sync stays off");
            }
            self.sync_urls_with_base_tag = probe.has_base_tag() && base_href.is_some();
        }
        if options.location_change_angular_emitter.is_none() {
            self.location_change_angular_emitter = probe.has_routing_framework_marker();
        }
        if options.move_gradients_outside_symbol.is_none() {
            self.move_gradients_outside_symbol = probe.detected_engine().is_firefox();
        }
        tracing::debug!(
            sync_urls_with_base_tag = self.sync_urls_with_base_tag,
            location_change_angular_emitter = self.location_change_angular_emitter,
            move_gradients_outside_symbol = self.move_gradients_outside_symbol,
            "sprite auto-configured"
        );
    }
}

/// Caller-supplied configuration; `None` means "not specified"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_configure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_urls_with_base_tag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_location_change_event: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_change_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_change_angular_emitter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_gradients_outside_symbol: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_to: Option<MountTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usages_to_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs: Option<BTreeMap<String, String>>,
}

impl PartialConfig {
    /// Parse camelCase JSON, e.g. `{"listenLocationChangeEvent": true}`
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
