//! URL synchronization
//!
//! When the page's effective base URL changes, fragment references to
//! sprite symbols (`old#icon`) must be rewritten to `new#icon`. Matching
//! is prefix-exact on `<url-without-fragment>#`: `/a/b#icon` is rewritten
//! for old URL `/a/b`, while `/a/bx#icon` is left alone.
//!
//! Two kinds of attributes are touched:
//! - `href` and any prefixed `*:href` whose value starts with the prefix;
//! - presentation attributes that accept `url(...)`, where every
//!   `url(<prefix>...)` occurrence is rewritten.

use sprite_dom::{DomTree, NodeId};

/// Presentation attributes that may hold `url(#fragment)` references
pub const FRAGMENT_URI_ATTRS: &[&str] = &[
    "clip-path",
    "color-profile",
    "src",
    "cursor",
    "fill",
    "filter",
    "marker",
    "marker-start",
    "marker-mid",
    "marker-end",
    "mask",
    "stroke",
    "style",
];

/// Everything before the first `#`
pub fn url_without_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(head, _)| head)
}

/// Percent-encode the characters browsers escape in serialized URLs
pub fn encode_url_chars(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '{' | '}' | '|' | '\\' | '^' | '[' | ']' | '`' | '"' | '<' | '>' => {
                out.push_str(&format!("%{:X}", c as u32));
            }
            _ => out.push(c),
        }
    }
    out
}

/// The `<url-without-fragment>#` prefix references are matched against
pub fn reference_prefix(url: &str) -> String {
    format!("{}#", encode_url_chars(url_without_fragment(url)))
}

fn is_href(name: &str) -> bool {
    name == "href" || name.rsplit_once(':').is_some_and(|(_, local)| local == "href")
}

/// Rewrite `url(<from>...)` occurrences; `None` when nothing matched
fn rewrite_url_functions(value: &str, from: &str, to: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    let mut changed = false;

    while let Some(pos) = rest.find("url(") {
        let (before, after) = rest.split_at(pos + "url(".len());
        out.push_str(before);

        let quote_len = after
            .find(|c: char| !(c == '"' || c == '\'' || c.is_whitespace()))
            .unwrap_or(after.len());
        let (quote, target) = after.split_at(quote_len);
        out.push_str(quote);

        match target.strip_prefix(from) {
            Some(fragment) => {
                out.push_str(to);
                rest = fragment;
                changed = true;
            }
            None => rest = target,
        }
    }
    out.push_str(rest);

    changed.then_some(out)
}

/// New value for one attribute, if it references the old prefix
pub fn rewrite_attribute(name: &str, value: &str, from: &str, to: &str) -> Option<String> {
    if is_href(name) {
        return value
            .strip_prefix(from)
            .map(|fragment| format!("{to}{fragment}"));
    }
    if FRAGMENT_URI_ATTRS.contains(&name) {
        return rewrite_url_functions(value, from, to);
    }
    None
}

fn rewrite_element(tree: &mut DomTree, id: NodeId, from: &str, to: &str) -> usize {
    let updates: Vec<(String, String)> = tree
        .attributes(id)
        .filter_map(|(name, value)| {
            rewrite_attribute(name, value, from, to).map(|new| (name.to_string(), new))
        })
        .collect();

    let mut count = 0;
    for (name, value) in updates {
        if tree.set_attribute(id, &name, &value).is_ok() {
            count += 1;
        }
    }
    count
}

/// Rewrite references from `old_url` to `new_url` in the sprite subtree
/// and in each usage element. Returns the number of attributes changed.
pub fn update_urls(
    tree: &mut DomTree,
    sprite: NodeId,
    usages: &[NodeId],
    old_url: &str,
    new_url: &str,
) -> usize {
    let from = reference_prefix(old_url);
    let to = reference_prefix(new_url);
    if from == to {
        return 0;
    }

    let mut targets = vec![sprite];
    targets.extend(tree.descendants(sprite));
    let extra: Vec<NodeId> = usages
        .iter()
        .copied()
        .filter(|u| !targets.contains(u))
        .collect();
    targets.extend(extra);

    let count: usize = targets
        .into_iter()
        .map(|id| rewrite_element(tree, id, &from, &to))
        .sum();

    tracing::debug!(from = %from, to = %to, count, "sprite urls updated");
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_without_fragment() {
        assert_eq!(url_without_fragment("/a/b#icon"), "/a/b");
        assert_eq!(url_without_fragment("/a/b"), "/a/b");
        assert_eq!(url_without_fragment("#"), "");
        assert_eq!(url_without_fragment("a#b#c"), "a");
    }

    #[test]
    fn test_encode_url_chars() {
        assert_eq!(encode_url_chars("/p/[id]?q={x}"), "/p/%5Bid%5D?q=%7Bx%7D");
        assert_eq!(encode_url_chars("/plain/path"), "/plain/path");
    }

    #[test]
    fn test_href_prefix_exact() {
        let from = reference_prefix("/a/b");
        let to = reference_prefix("/a/c");
        assert_eq!(
            rewrite_attribute("xlink:href", "/a/b#icon", &from, &to).as_deref(),
            Some("/a/c#icon")
        );
        assert_eq!(rewrite_attribute("href", "/a/bx#icon", &from, &to), None);
        assert_eq!(rewrite_attribute("href", "/z/a/b#icon", &from, &to), None);
    }

    #[test]
    fn test_bare_fragment_to_base() {
        let from = reference_prefix("#");
        let to = reference_prefix("/v2/");
        assert_eq!(from, "#");
        assert_eq!(
            rewrite_attribute("href", "#icon", &from, &to).as_deref(),
            Some("/v2/#icon")
        );
        // Already absolute: untouched
        assert_eq!(rewrite_attribute("href", "/v2/#icon", &from, &to), None);
    }

    #[test]
    fn test_url_functions() {
        let from = reference_prefix("/x");
        let to = reference_prefix("/y");
        assert_eq!(
            rewrite_attribute("fill", "url(/x#grad)", &from, &to).as_deref(),
            Some("url(/y#grad)")
        );
        assert_eq!(
            rewrite_attribute("style", "fill: url('/x#a'); stroke: url(/xx#b)", &from, &to).as_deref(),
            Some("fill: url('/y#a'); stroke: url(/xx#b)")
        );
        assert_eq!(rewrite_attribute("fill", "red", &from, &to), None);
        // Not a fragment-URI attribute
        assert_eq!(rewrite_attribute("data-x", "url(/x#a)", &from, &to), None);
    }

    #[test]
    fn test_update_urls_counts_and_scope() {
        let mut tree = DomTree::new();
        let sprite = tree.create_element("svg");
        let symbol = tree.create_element("symbol");
        let path = tree.create_element("path");
        tree.append_child(sprite, symbol).unwrap();
        tree.append_child(symbol, path).unwrap();
        tree.set_attribute(path, "fill", "url(/x#g)").unwrap();

        let usage = tree.create_element("use");
        tree.set_attribute(usage, "xlink:href", "/x#icon").unwrap();
        let untracked = tree.create_element("use");
        tree.set_attribute(untracked, "xlink:href", "/x#icon").unwrap();

        let count = update_urls(&mut tree, sprite, &[usage], "/x", "/y#ignored");
        assert_eq!(count, 2);
        assert_eq!(tree.get_attribute(path, "fill"), Some("url(/y#g)"));
        assert_eq!(tree.get_attribute(usage, "xlink:href"), Some("/y#icon"));
        assert_eq!(tree.get_attribute(untracked, "xlink:href"), Some("/x#icon"));
    }

    #[test]
    fn test_same_prefix_is_noop() {
        let mut tree = DomTree::new();
        let sprite = tree.create_element("svg");
        tree.set_attribute(sprite, "href", "/x#a").unwrap();
        assert_eq!(update_urls(&mut tree, sprite, &[], "/x#one", "/x#two"), 0);
    }
}
