//! Error types for the sprite runtime

use sprite_dom::DomError;
use sprite_markup::ParseError;

/// Result type for sprite operations
pub type SpriteResult<T> = Result<T, SpriteError>;

/// Sprite lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum SpriteError {
    /// Operation needs a mounted sprite
    #[error("sprite should be mounted to apply {operation}")]
    NotMounted { operation: &'static str },

    /// Mount target selector or node could not be resolved
    #[error("mount target not found: {0}")]
    TargetNotFound(String),

    /// `syncUrlsWithBaseTag` is enabled but the document has no usable `<base href>`
    #[error("syncUrlsWithBaseTag is enabled but the document has no <base href>")]
    MissingBaseTag,

    /// A location change arrived while the sprite or its document was in use
    #[error("sprite is busy with another operation")]
    Busy,

    /// Location change event carried a malformed detail payload
    #[error("malformed location change detail: {0}")]
    LocationDetail(#[from] serde_json::Error),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Configuration input errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid sprite configuration: {0}")]
    Json(#[from] serde_json::Error),
}
