//! Example: mount a sprite behind a `<base>` tag and follow a navigation

use std::rc::Rc;

use sprite_dom::{Document, Window};
use sprite_markup::MarkupSerializer;
use sprite_runtime::{BrowserSprite, LocationChange, PartialConfig, SpriteSymbol};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut document = Document::new("https://example.test/app/");
    let head = document.head();
    let body = document.body();
    let base = document.tree.create_element("base");
    document.tree.set_attribute(base, "href", "/app/")?;
    document.tree.append_child(head, base)?;

    let icon = document.tree.create_element("use");
    document.tree.set_attribute(icon, "xlink:href", "#logo")?;
    document.tree.append_child(body, icon)?;

    let window = Rc::new(Window::new(document, "Mozilla/5.0 Firefox/128.0"));
    let options = PartialConfig::from_json(r#"{"listenLocationChangeEvent": true}"#)?;
    let sprite = BrowserSprite::new(Rc::clone(&window), &options)?;
    sprite.add_symbol(SpriteSymbol::new(
        "logo",
        "0 0 32 32",
        r#"<symbol id="logo" viewBox="0 0 32 32"><circle cx="16" cy="16" r="16"/></symbol>"#,
    ))?;

    let node = sprite.mount()?;
    println!("fOS sprite runtime v{}", sprite_runtime::VERSION);
    println!("{}", MarkupSerializer::pretty().serialize_outer(&window.document().tree, node));
    println!("after mount:      {:?}", window.document().tree.get_attribute(icon, "xlink:href"));

    window.dispatch_event(&LocationChange::new("/app/", "/app/settings").into_event("locationChange"));
    println!("after navigation: {:?}", window.document().tree.get_attribute(icon, "xlink:href"));

    sprite.destroy();
    Ok(())
}
