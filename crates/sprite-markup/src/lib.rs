//! fOS Sprite Markup
//!
//! Turns serialized sprite markup into DOM nodes (via html5ever) and
//! DOM nodes back into markup.

mod parser;
mod serializer;

pub use parser::SvgParser;
pub use serializer::MarkupSerializer;

use sprite_dom::{DomError, DomTree, NodeId};

/// Parse markup into `tree`, returning the new detached `<svg>` node
pub fn parse(tree: &mut DomTree, markup: &str) -> Result<NodeId, ParseError> {
    SvgParser::new().parse_into(tree, markup)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read markup: {0}")]
    Io(#[from] std::io::Error),

    #[error("markup has no <svg> root element")]
    NoRootElement,

    #[error(transparent)]
    Dom(#[from] DomError),
}
