//! Gradient relocation
//!
//! Gecko does not resolve paint servers defined inside `<symbol>` when the
//! symbol is referenced through `<use>`. Moving them out, right before
//! their symbol, keeps their ids resolvable.

use sprite_dom::{DomResult, DomTree, NodeId, SelectorList};

/// Paint servers and clip/mask definitions relocated by default
pub const DEFAULT_RELOCATED: &str = "linearGradient, radialGradient, pattern, mask, clipPath";

/// Move matching elements out of every `<symbol>` under `root`.
/// Returns how many elements moved.
pub fn move_gradients_outside_symbol(tree: &mut DomTree, root: NodeId) -> DomResult<usize> {
    move_outside_symbol(tree, root, DEFAULT_RELOCATED)
}

/// Like [`move_gradients_outside_symbol`] with a custom selector
pub fn move_outside_symbol(tree: &mut DomTree, root: NodeId, selector: &str) -> DomResult<usize> {
    let symbols = SelectorList::parse("symbol")?.select_all(tree, root);
    let relocated = SelectorList::parse(selector)?;

    let mut moved = 0;
    for symbol in symbols {
        let Some(parent) = tree.parent(symbol) else {
            continue;
        };
        // Collected up front: relocation below mutates the subtree
        for node in relocated.select_all(tree, symbol) {
            tree.insert_before(parent, node, Some(symbol))?;
            moved += 1;
        }
    }

    if moved > 0 {
        tracing::debug!(moved, "moved paint servers outside symbols");
    }
    Ok(moved)
}
