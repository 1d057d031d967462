//! fOS Sprite Runtime
//!
//! Mounts an SVG sprite (a single `<svg>` holding every `<symbol>`) into a
//! page and keeps `<use>` references to it valid:
//!
//! - Configuration merged over defaults, with environment auto-detection
//! - Render/mount/unmount/destroy lifecycle driven through an event hub
//! - Fragment URL rewriting on `<base>` tags and location change events
//! - Gecko gradient relocation

pub mod browser_sprite;
pub mod config;
pub mod error;
pub mod gradients;
pub mod hub;
pub mod location;
pub mod probe;
pub mod sprite;
pub mod url_sync;

pub use browser_sprite::BrowserSprite;
pub use config::{MountTarget, PartialConfig, SpriteConfig};
pub use error::{ConfigError, SpriteError, SpriteResult};
pub use hub::{EventHub, SpriteEvent};
pub use location::LocationChange;
pub use probe::{BrowserEngine, EnvironmentProbe, StaticProbe};
pub use sprite::{Sprite, SpriteSource, SpriteSymbol};

/// Runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
