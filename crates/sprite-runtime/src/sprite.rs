//! Generic sprite
//!
//! An ordered set of symbols keyed by id that serializes to a single
//! `<svg>` document. It knows nothing about the page; [`BrowserSprite`]
//! drives it through [`SpriteSource`].
//!
//! [`BrowserSprite`]: crate::BrowserSprite

use std::collections::BTreeMap;

use crate::config::default_attrs;

/// What the lifecycle controller needs from the symbol collection
pub trait SpriteSource {
    /// Serialize the current symbol set to `<svg>` markup
    fn stringify(&self) -> String;

    /// Release every owned symbol
    fn destroy(&mut self);
}

/// A single `<symbol>` definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSymbol {
    pub id: String,
    pub view_box: String,
    /// Full `<symbol ...>...</symbol>` markup
    pub content: String,
}

impl SpriteSymbol {
    pub fn new(id: impl Into<String>, view_box: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            view_box: view_box.into(),
            content: content.into(),
        }
    }

    pub fn stringify(&self) -> &str {
        &self.content
    }

    /// Drop the symbol's data
    pub fn destroy(&mut self) {
        self.id.clear();
        self.view_box.clear();
        self.content.clear();
    }

    pub fn is_destroyed(&self) -> bool {
        self.id.is_empty() && self.content.is_empty()
    }
}

/// Symbol collection plus root attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    attrs: BTreeMap<String, String>,
    symbols: Vec<SpriteSymbol>,
}

impl Sprite {
    pub fn new() -> Self {
        Self::with_attrs(default_attrs())
    }

    pub fn with_attrs(attrs: BTreeMap<String, String>) -> Self {
        Self {
            attrs,
            symbols: Vec::new(),
        }
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn symbols(&self) -> &[SpriteSymbol] {
        &self.symbols
    }

    /// Add a symbol, replacing any symbol with the same id.
    /// Returns `true` if the id was new.
    pub fn add(&mut self, symbol: SpriteSymbol) -> bool {
        match self.symbols.iter_mut().find(|s| s.id == symbol.id) {
            Some(existing) => {
                *existing = symbol;
                false
            }
            None => {
                self.symbols.push(symbol);
                true
            }
        }
    }

    /// Remove and destroy a symbol; returns whether it existed
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(pos) = self.symbols.iter().position(|s| s.id == id) else {
            return false;
        };
        let mut symbol = self.symbols.remove(pos);
        symbol.destroy();
        true
    }

    pub fn find(&self, id: &str) -> Option<&SpriteSymbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::new()
    }
}

impl SpriteSource for Sprite {
    fn stringify(&self) -> String {
        let content: String = self.symbols.iter().map(SpriteSymbol::stringify).collect();
        wrap_in_svg(&content, &self.attrs)
    }

    fn destroy(&mut self) {
        for symbol in &mut self.symbols {
            symbol.destroy();
        }
        self.symbols.clear();
    }
}

/// `<svg a="..." b="...">content</svg>`, with `&` and `"` escaped in values
pub fn wrap_in_svg(content: &str, attrs: &BTreeMap<String, String>) -> String {
    let mut out = String::from("<svg");
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
        out.push('"');
    }
    out.push('>');
    out.push_str(content);
    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(id: &str) -> SpriteSymbol {
        SpriteSymbol::new(
            id,
            "0 0 24 24",
            format!(r#"<symbol id="{id}" viewBox="0 0 24 24"><path d="M0 0h24v24H0z"/></symbol>"#),
        )
    }

    #[test]
    fn test_add_replaces_by_id() {
        let mut sprite = Sprite::new();
        assert!(sprite.add(symbol("a")));
        assert!(sprite.add(symbol("b")));

        let mut replacement = symbol("a");
        replacement.view_box = "0 0 16 16".to_string();
        assert!(!sprite.add(replacement));

        assert_eq!(sprite.len(), 2);
        assert_eq!(sprite.find("a").unwrap().view_box, "0 0 16 16");
        assert_eq!(sprite.symbols()[0].id, "a");
    }

    #[test]
    fn test_remove() {
        let mut sprite = Sprite::new();
        sprite.add(symbol("a"));
        assert!(sprite.remove("a"));
        assert!(!sprite.has("a"));
        assert!(!sprite.remove("a"));
    }

    #[test]
    fn test_stringify_wraps_symbols() {
        let mut sprite = Sprite::with_attrs(BTreeMap::from([(
            "data-title".to_string(),
            "say \"hi\"".to_string(),
        )]));
        sprite.add(symbol("a"));
        let markup = sprite.stringify();
        assert!(markup.starts_with(r#"<svg data-title="say &quot;hi&quot;">"#));
        assert!(markup.contains(r#"<symbol id="a""#));
        assert!(markup.ends_with("</svg>"));
    }

    #[test]
    fn test_wrap_escapes_ampersands_first() {
        let attrs = BTreeMap::from([("data-x".to_string(), r#"a&amp;b "c""#.to_string())]);
        assert_eq!(
            wrap_in_svg("", &attrs),
            r#"<svg data-x="a&amp;amp;b &quot;c&quot;"></svg>"#
        );
    }

    #[test]
    fn test_destroy_releases_symbols() {
        let mut sprite = Sprite::new();
        sprite.add(symbol("a"));
        sprite.add(symbol("b"));
        SpriteSource::destroy(&mut sprite);
        assert!(sprite.is_empty());
    }

    #[test]
    fn test_symbol_destroy() {
        let mut s = symbol("a");
        s.destroy();
        assert!(s.is_destroyed());
        assert_eq!(s.stringify(), "");
    }
}
