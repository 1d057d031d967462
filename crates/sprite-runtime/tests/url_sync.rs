//! URL rewriting against parsed sprite markup

use sprite_dom::{DomTree, NodeId};
use sprite_runtime::url_sync::{reference_prefix, update_urls};

const SPRITE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
  <symbol id="a" viewBox="0 0 10 10">
    <linearGradient id="g"><stop offset="0"/></linearGradient>
    <rect fill="url(/page#g)" stroke="url(&quot;/page#g&quot;)" width="10" height="10"/>
    <use xlink:href="/page#b"/>
    <use href="/page#b"/>
  </symbol>
  <symbol id="b" viewBox="0 0 10 10">
    <circle clip-path="url(/pages#clip)" mask="url( /page#m )" r="5"/>
  </symbol>
</svg>"##;

fn parsed() -> (DomTree, NodeId) {
    let mut tree = DomTree::new();
    let root = sprite_markup::parse(&mut tree, SPRITE).unwrap();
    (tree, root)
}

fn find(tree: &DomTree, root: NodeId, tag: &str) -> Vec<NodeId> {
    tree.descendants(root)
        .into_iter()
        .filter(|&id| tree.tag_name(id) == Some(tag))
        .collect()
}

#[test]
fn test_rewrites_every_reference_kind() {
    let (mut tree, root) = parsed();
    let changed = update_urls(&mut tree, root, &[], "/page", "/next?tab=1");

    let rect = find(&tree, root, "rect")[0];
    assert_eq!(tree.get_attribute(rect, "fill"), Some("url(/next?tab=1#g)"));
    assert_eq!(tree.get_attribute(rect, "stroke"), Some("url(\"/next?tab=1#g\")"));

    let uses = find(&tree, root, "use");
    assert_eq!(tree.get_attribute(uses[0], "xlink:href"), Some("/next?tab=1#b"));
    assert_eq!(tree.get_attribute(uses[1], "href"), Some("/next?tab=1#b"));

    let circle = find(&tree, root, "circle")[0];
    assert_eq!(tree.get_attribute(circle, "clip-path"), Some("url(/pages#clip)"));
    assert_eq!(tree.get_attribute(circle, "mask"), Some("url( /next?tab=1#m )"));

    assert_eq!(changed, 5);
}

#[test]
fn test_ids_are_never_rewritten() {
    let (mut tree, root) = parsed();
    update_urls(&mut tree, root, &[], "#", "/base/");

    let symbols = find(&tree, root, "symbol");
    assert_eq!(tree.get_attribute(symbols[0], "id"), Some("a"));
    assert_eq!(tree.get_attribute(symbols[1], "id"), Some("b"));
}

#[test]
fn test_special_characters_are_matched_encoded() {
    let mut tree = DomTree::new();
    let root = tree.create_element("svg");
    let usage = tree.create_element("use");
    tree.set_attribute(usage, "xlink:href", "/p/%5Bid%5D#icon").unwrap();

    assert_eq!(reference_prefix("/p/[id]"), "/p/%5Bid%5D#");
    let changed = update_urls(&mut tree, root, &[usage], "/p/[id]", "/p/[other]");
    assert_eq!(changed, 1);
    assert_eq!(tree.get_attribute(usage, "xlink:href"), Some("/p/%5Bother%5D#icon"));
}
