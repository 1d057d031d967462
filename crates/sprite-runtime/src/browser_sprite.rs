//! Browser sprite
//!
//! Lifecycle controller that renders a [`SpriteSource`] into the window's
//! document and keeps the references to its symbols valid.
//!
//! ```text
//! unrendered ──render()──▶ rendered ──mount()──▶ mounted ──destroy()──▶ gone
//!                                                   │  ▲
//!                                          unmount()│  │mount()
//!                                                   ▼  │
//!                                                unmounted
//! ```
//!
//! Optional behavior hangs off the [`EventHub`]: base-tag URL sync runs on
//! `Mount`, gradient relocation on `Render`. The location change listener
//! and the routing-framework emitter are window registrations held as
//! [`ListenerGuard`]s and released exactly once.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use sprite_dom::{CustomEvent, Document, ListenerGuard, NodeId, Window};

use crate::config::{MountTarget, PartialConfig, SpriteConfig};
use crate::error::{SpriteError, SpriteResult};
use crate::gradients;
use crate::hub::{EventHub, SpriteEvent};
use crate::location::{self, LocationChange};
use crate::probe::EnvironmentProbe;
use crate::sprite::{wrap_in_svg, Sprite, SpriteSource, SpriteSymbol};
use crate::url_sync;

/// Mutable state shared with the window listener
struct SpriteState<S> {
    sprite: S,
    hub: EventHub<SpriteEvent>,
    /// Container node; `Some` exactly while mounted
    mounted: Option<NodeId>,
}

impl<S: SpriteSource> SpriteState<S> {
    fn render(&mut self, document: &mut Document) -> SpriteResult<NodeId> {
        let markup = self.sprite.stringify();
        let node = sprite_markup::parse(&mut document.tree, &markup)?;
        self.hub.publish(&SpriteEvent::Render, document, node)?;
        Ok(node)
    }

    fn update_urls(
        &self,
        config: &SpriteConfig,
        document: &mut Document,
        old_url: &str,
        new_url: &str,
    ) -> SpriteResult<usize> {
        let node = self.mounted.ok_or(SpriteError::NotMounted {
            operation: "updateUrls",
        })?;
        let usages = document.query_selector_all(&config.usages_to_update)?;
        Ok(url_sync::update_urls(
            &mut document.tree,
            node,
            &usages,
            old_url,
            new_url,
        ))
    }
}

/// Sprite rendered into and mounted on a [`Window`]'s document
pub struct BrowserSprite<S: SpriteSource = Sprite> {
    window: Rc<Window>,
    config: Rc<SpriteConfig>,
    inner: Rc<RefCell<SpriteState<S>>>,
    location_listener: Option<ListenerGuard>,
    router_hook: Option<ListenerGuard>,
}

impl BrowserSprite<Sprite> {
    /// Empty sprite configured from `options`, auto-configured against the window
    pub fn new(window: Rc<Window>, options: &PartialConfig) -> SpriteResult<Self> {
        let config = SpriteConfig::resolve(options, &*window);
        let base_href = window.base_href();
        let sprite = Sprite::with_attrs(config.attrs.clone());
        Self::assemble(window, sprite, config, base_href)
    }

    /// Add a symbol. A new symbol is also rendered into the mounted
    /// container, through the same `Render` hooks as [`render`](Self::render);
    /// a replacement only takes effect on the next render.
    pub fn add_symbol(&self, symbol: SpriteSymbol) -> SpriteResult<bool> {
        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        let markup = wrap_in_svg(symbol.stringify(), &BTreeMap::new());
        let is_new = state.sprite.add(symbol);

        if let (true, Some(container)) = (is_new, state.mounted) {
            let mut document = self.window.document_mut();
            let wrapper = sprite_markup::parse(&mut document.tree, &markup)?;
            state.hub.publish(&SpriteEvent::Render, &mut document, wrapper)?;
            // Relocated paint servers sit next to the symbol; move them all
            for child in document.tree.element_children(wrapper) {
                document.tree.append_child(container, child)?;
            }
            document.tree.discard(wrapper)?;
        }
        Ok(is_new)
    }

    /// Remove a symbol and, when mounted, its rendered element
    pub fn remove_symbol(&self, id: &str) -> SpriteResult<bool> {
        let mut state = self.inner.borrow_mut();
        if !state.sprite.remove(id) {
            return Ok(false);
        }

        if let Some(container) = state.mounted {
            let mut document = self.window.document_mut();
            let rendered: Vec<NodeId> = document
                .tree
                .element_children(container)
                .into_iter()
                .filter(|&child| {
                    document.tree.tag_name(child) == Some("symbol")
                        && document.tree.get_attribute(child, "id") == Some(id)
                })
                .collect();
            for node in rendered {
                document.tree.detach(node)?;
            }
        }
        Ok(true)
    }

    /// Snapshot of the symbol collection
    pub fn symbols(&self) -> Vec<SpriteSymbol> {
        self.inner.borrow().sprite.symbols().to_vec()
    }
}

impl<S: SpriteSource + 'static> BrowserSprite<S> {
    /// Wrap an existing source; `probe` answers the auto-configuration
    /// questions and supplies the base href
    pub fn with_parts(
        window: Rc<Window>,
        source: S,
        options: &PartialConfig,
        probe: &dyn EnvironmentProbe,
    ) -> SpriteResult<Self> {
        let config = SpriteConfig::resolve(options, probe);
        Self::assemble(window, source, config, probe.base_href())
    }

    fn assemble(
        window: Rc<Window>,
        source: S,
        config: SpriteConfig,
        base_href: Option<String>,
    ) -> SpriteResult<Self> {
        let mut hub = EventHub::new();

        if config.sync_urls_with_base_tag {
            let base_href = base_href.ok_or(SpriteError::MissingBaseTag)?;
            let usages_selector = config.usages_to_update.clone();
            hub.subscribe(SpriteEvent::Mount, move |document: &mut Document, node| {
                let usages = document.query_selector_all(&usages_selector)?;
                url_sync::update_urls(&mut document.tree, node, &usages, "#", &base_href);
                Ok(())
            });
        }

        if config.move_gradients_outside_symbol {
            hub.subscribe(SpriteEvent::Render, |document: &mut Document, node| {
                gradients::move_gradients_outside_symbol(&mut document.tree, node)?;
                Ok(())
            });
        }

        let config = Rc::new(config);
        let inner = Rc::new(RefCell::new(SpriteState {
            sprite: source,
            hub,
            mounted: None,
        }));

        let location_listener = config.listen_location_change_event.then(|| {
            let state = Rc::downgrade(&inner);
            let target = Rc::downgrade(&window);
            let config_in = Rc::clone(&config);
            window.listen(&config.location_change_event, move |event| {
                if let Err(err) = handle_location_change(&state, &target, &config_in, event) {
                    tracing::error!(event = %event.name, error = %err, "sprite url update failed");
                }
            })
        });

        let router_hook = config
            .location_change_angular_emitter
            .then(|| location::install_emitter(&window, &config.location_change_event));

        tracing::debug!(
            listen = location_listener.is_some(),
            emitter = router_hook.is_some(),
            "browser sprite created"
        );

        Ok(Self {
            window,
            config,
            inner,
            location_listener,
            router_hook,
        })
    }

    pub fn config(&self) -> &SpriteConfig {
        &self.config
    }

    pub fn window(&self) -> &Rc<Window> {
        &self.window
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.borrow().mounted.is_some()
    }

    /// The mounted container node
    pub fn node(&self) -> Option<NodeId> {
        self.inner.borrow().mounted
    }

    /// Number of hub handlers for a lifecycle topic
    pub fn subscriber_count(&self, topic: SpriteEvent) -> usize {
        self.inner.borrow().hub.subscriber_count(&topic)
    }

    /// Parse the current symbol set into a fresh, detached node.
    /// Does not touch mount state. The node is owned by the caller, who
    /// releases it with [`DomTree::discard`](sprite_dom::DomTree::discard)
    /// once it is no longer needed.
    pub fn render(&self) -> SpriteResult<NodeId> {
        let mut state = self.inner.borrow_mut();
        let mut document = self.window.document_mut();
        state.render(&mut document)
    }

    /// Mount to the configured target, appending
    pub fn mount(&self) -> SpriteResult<NodeId> {
        self.mount_at(None, false)
    }

    /// Mount to `target`, as its first child when `prepend` is set
    pub fn mount_to(&self, target: impl Into<MountTarget>, prepend: bool) -> SpriteResult<NodeId> {
        self.mount_at(Some(target.into()), prepend)
    }

    fn mount_at(&self, target: Option<MountTarget>, prepend: bool) -> SpriteResult<NodeId> {
        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        if let Some(node) = state.mounted {
            return Ok(node);
        }

        let target = target.unwrap_or_else(|| self.config.mount_to.clone());
        let mut document = self.window.document_mut();
        let parent = resolve_target(&document, &target)?;
        let node = state.render(&mut document)?;

        let reference = if prepend {
            document.tree.first_child(parent)
        } else {
            None
        };
        document.tree.insert_before(parent, node, reference)?;
        state.mounted = Some(node);
        tracing::debug!(mount_target = %target, prepend, "sprite mounted");

        state.hub.publish(&SpriteEvent::Mount, &mut document, node)?;
        Ok(node)
    }

    /// Rewrite `old_url#…` references to `new_url#…` in the sprite and the
    /// usage elements. Returns how many attributes changed.
    pub fn update_urls(&self, old_url: &str, new_url: &str) -> SpriteResult<usize> {
        let state = self.inner.borrow();
        let mut document = self.window.document_mut();
        state.update_urls(&self.config, &mut document, old_url, new_url)
    }

    /// Detach the container and release its nodes. A later
    /// [`mount`](Self::mount) renders anew; the old container id is stale.
    pub fn unmount(&self) -> SpriteResult<()> {
        let mut state = self.inner.borrow_mut();
        let node = state
            .mounted
            .ok_or(SpriteError::NotMounted { operation: "unmount" })?;
        let mut document = self.window.document_mut();
        document.tree.detach(node)?;
        document.tree.discard(node)?;
        state.mounted = None;
        tracing::debug!("sprite unmounted");
        Ok(())
    }

    /// Release symbols, hub handlers and window registrations, then unmount
    pub fn destroy(mut self) {
        self.release();
    }

    fn release(&mut self) {
        {
            let mut state = self.inner.borrow_mut();
            state.sprite.destroy();
            state.hub.unsubscribe_all();
        }
        self.location_listener = None;
        self.router_hook = None;

        if self.is_mounted() {
            if let Err(err) = self.unmount() {
                tracing::error!(error = %err, "failed to unmount destroyed sprite");
            }
        }
        tracing::debug!("browser sprite destroyed");
    }
}

impl<S: SpriteSource> fmt::Debug for BrowserSprite<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.try_borrow();
        f.debug_struct("BrowserSprite")
            .field("config", &self.config)
            .field("mounted", &state.as_ref().ok().and_then(|s| s.mounted))
            .field("location_listener", &self.location_listener.is_some())
            .field("router_hook", &self.router_hook.is_some())
            .finish_non_exhaustive()
    }
}

fn resolve_target(document: &Document, target: &MountTarget) -> SpriteResult<NodeId> {
    let found = match target {
        MountTarget::Node(id) => document
            .tree
            .get(*id)
            .filter(|node| node.is_element())
            .map(|_| *id),
        MountTarget::Selector(selector) => document.query_selector(selector)?,
    };
    found.ok_or_else(|| SpriteError::TargetNotFound(target.to_string()))
}

fn handle_location_change<S: SpriteSource>(
    state: &Weak<RefCell<SpriteState<S>>>,
    window: &Weak<Window>,
    config: &SpriteConfig,
    event: &CustomEvent,
) -> SpriteResult<()> {
    let (Some(state), Some(window)) = (state.upgrade(), window.upgrade()) else {
        return Ok(());
    };
    let change = LocationChange::from_event(event)?;
    let state = state.try_borrow().map_err(|_| SpriteError::Busy)?;
    let mut document = window.try_document_mut().map_err(|_| SpriteError::Busy)?;
    state.update_urls(config, &mut document, &change.old_url, &change.new_url)?;
    Ok(())
}
