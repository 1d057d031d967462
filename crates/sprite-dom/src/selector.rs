//! Simple selectors
//!
//! Comma-separated lists of compound selectors: a tag (or `*`), `#id`,
//! `.class` and attribute tests. Namespaced attribute tests use the CSS
//! `ns|name` form, where `*|href` matches both `href` and `xlink:href`.
//! Combinators are not supported.

use crate::{DomError, DomResult, DomTree, NodeId};

/// How an attribute value is tested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatch {
    /// `[name]`
    Exists,
    /// `[name=value]`
    Equals(String),
    /// `[name^=value]`
    Prefix(String),
    /// `[name$=value]`
    Suffix(String),
    /// `[name*=value]`
    Contains(String),
}

impl AttrMatch {
    fn test(&self, value: &str) -> bool {
        match self {
            Self::Exists => true,
            Self::Equals(v) => value == v,
            Self::Prefix(v) => value.starts_with(v.as_str()),
            Self::Suffix(v) => value.ends_with(v.as_str()),
            Self::Contains(v) => value.contains(v.as_str()),
        }
    }
}

/// Attribute test inside `[...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    /// `None` = no namespace, `Some("*")` = any, `Some(prefix)` otherwise
    pub namespace: Option<String>,
    pub name: String,
    pub matcher: AttrMatch,
}

impl AttrSelector {
    fn name_matches(&self, qualified: &str) -> bool {
        match self.namespace.as_deref() {
            None => qualified == self.name,
            Some("*") => {
                qualified == self.name
                    || qualified
                        .rsplit_once(':')
                        .is_some_and(|(_, local)| local == self.name)
            }
            Some(prefix) => qualified
                .split_once(':')
                .is_some_and(|(p, local)| p == prefix && local == self.name),
        }
    }

    fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        tree.attributes(id)
            .any(|(name, value)| self.name_matches(name) && self.matcher.test(value))
    }
}

/// A compound selector such as `use[*|href]` or `div#sprites.hidden`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    /// `None` means universal
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrSelector>,
}

impl CompoundSelector {
    pub fn parse(input: &str) -> DomResult<Self> {
        let invalid = || DomError::InvalidSelector(input.to_string());
        let s = input.trim();
        if s.is_empty() {
            return Err(invalid());
        }

        let mut selector = Self::default();
        let mut rest = s;

        if let Some(after) = rest.strip_prefix('*') {
            rest = after;
        } else {
            let (tag, after) = split_ident(rest);
            if !tag.is_empty() {
                selector.tag = Some(tag.to_string());
            }
            rest = after;
        }

        while let Some(c) = rest.chars().next() {
            match c {
                '#' => {
                    let (id, after) = split_ident(&rest[1..]);
                    if id.is_empty() {
                        return Err(invalid());
                    }
                    selector.id = Some(id.to_string());
                    rest = after;
                }
                '.' => {
                    let (class, after) = split_ident(&rest[1..]);
                    if class.is_empty() {
                        return Err(invalid());
                    }
                    selector.classes.push(class.to_string());
                    rest = after;
                }
                '[' => {
                    let end = rest.find(']').ok_or_else(invalid)?;
                    selector.attrs.push(parse_attr(&rest[1..end]).ok_or_else(invalid)?);
                    rest = &rest[end + 1..];
                }
                // Whitespace here would be a descendant combinator
                _ => return Err(invalid()),
            }
        }

        Ok(selector)
    }

    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        let Some(tag) = tree.tag_name(id) else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if tree.get_attribute(id, "id") != Some(expected.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = tree.get_attribute(id, "class").unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|c| class_attr.split_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        self.attrs.iter().all(|a| a.matches(tree, id))
    }
}

/// A parsed `a, b, c` selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<CompoundSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> DomResult<Self> {
        let selectors = split_top_level(input)
            .into_iter()
            .map(CompoundSelector::parse)
            .collect::<DomResult<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// Whether any selector in the list matches the element
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, id))
    }

    /// Matching descendants of `root` (excluding `root`), in document order
    pub fn select_all(&self, tree: &DomTree, root: NodeId) -> Vec<NodeId> {
        tree.descendants(root)
            .into_iter()
            .filter(|&id| self.matches(tree, id))
            .collect()
    }

    /// First matching descendant of `root`
    pub fn select_first(&self, tree: &DomTree, root: NodeId) -> Option<NodeId> {
        tree.descendants(root)
            .into_iter()
            .find(|&id| self.matches(tree, id))
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn split_ident(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// Split on commas that are not inside brackets or quotes
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_attr(body: &str) -> Option<AttrSelector> {
    let body = body.trim();
    let (any_ns, rest) = match body.strip_prefix("*|") {
        Some(rest) => (true, rest),
        None => (false, body),
    };

    let name_end = rest
        .find(|c: char| !(is_ident_char(c) || c == ':' || c == '|'))
        .unwrap_or(rest.len());
    let (qualified, tail) = rest.split_at(name_end);

    let (namespace, name) = match (any_ns, qualified.split_once('|')) {
        (true, None) => (Some("*".to_string()), qualified),
        (false, Some((prefix, name))) if !prefix.is_empty() => (Some(prefix.to_string()), name),
        (false, None) => (None, qualified),
        _ => return None,
    };
    if name.is_empty() || name.contains('|') {
        return None;
    }

    let tail = tail.trim();
    let matcher = if tail.is_empty() {
        AttrMatch::Exists
    } else if let Some(v) = tail.strip_prefix("^=") {
        AttrMatch::Prefix(unquote(v.trim()).to_string())
    } else if let Some(v) = tail.strip_prefix("$=") {
        AttrMatch::Suffix(unquote(v.trim()).to_string())
    } else if let Some(v) = tail.strip_prefix("*=") {
        AttrMatch::Contains(unquote(v.trim()).to_string())
    } else if let Some(v) = tail.strip_prefix('=') {
        AttrMatch::Equals(unquote(v.trim()).to_string())
    } else {
        return None;
    };

    Some(AttrSelector {
        namespace,
        name: name.to_string(),
        matcher,
    })
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound() {
        let sel = CompoundSelector::parse("use[*|href]").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("use"));
        assert_eq!(sel.attrs.len(), 1);
        assert_eq!(sel.attrs[0].namespace.as_deref(), Some("*"));
        assert_eq!(sel.attrs[0].name, "href");
        assert_eq!(sel.attrs[0].matcher, AttrMatch::Exists);
    }

    #[test]
    fn test_parse_id_class() {
        let sel = CompoundSelector::parse("div#sprites.hidden.icons").unwrap();
        assert_eq!(sel.id.as_deref(), Some("sprites"));
        assert_eq!(sel.classes, vec!["hidden", "icons"]);
    }

    #[test]
    fn test_parse_attr_operators() {
        let sel = CompoundSelector::parse("[fill^=\"url(#\"]").unwrap();
        assert_eq!(sel.attrs[0].matcher, AttrMatch::Prefix("url(#".to_string()));

        let sel = CompoundSelector::parse("[*|href*='icon']").unwrap();
        assert_eq!(sel.attrs[0].namespace.as_deref(), Some("*"));
        assert_eq!(sel.attrs[0].matcher, AttrMatch::Contains("icon".to_string()));

        let sel = CompoundSelector::parse("[xlink|href]").unwrap();
        assert_eq!(sel.attrs[0].namespace.as_deref(), Some("xlink"));
    }

    #[test]
    fn test_list_split_respects_brackets() {
        let list = SelectorList::parse("use[href], [fill*=\"a,b\"], body").unwrap();
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_combinators_rejected() {
        assert!(matches!(
            SelectorList::parse("body use"),
            Err(DomError::InvalidSelector(_))
        ));
        assert!(SelectorList::parse("").is_err());
        assert!(SelectorList::parse("div,").is_err());
    }

    #[test]
    fn test_any_namespace_matching() {
        let mut tree = DomTree::new();
        let plain = tree.create_element("use");
        let xlink = tree.create_element("use");
        let other = tree.create_element("use");
        tree.set_attribute(plain, "href", "#a").unwrap();
        tree.set_attribute(xlink, "xlink:href", "#b").unwrap();
        tree.set_attribute(other, "data-href", "#c").unwrap();

        let sel = SelectorList::parse("use[*|href]").unwrap();
        assert!(sel.matches(&tree, plain));
        assert!(sel.matches(&tree, xlink));
        assert!(!sel.matches(&tree, other));

        let xlink_only = SelectorList::parse("use[xlink|href]").unwrap();
        assert!(!xlink_only.matches(&tree, plain));
        assert!(xlink_only.matches(&tree, xlink));
    }
}
