//! HTML parsing into the arena [`Document`].
//!
//! `scraper` does the actual HTML5 parsing; its read-only tree is then copied
//! into our own arena so the rewriter can edit it freely. Comments, doctype
//! and processing instructions are dropped on the way in. Attributes are
//! stored sorted by name so serialization never depends on how the parser
//! happens to order them.

use super::{Document, NodeId};
use scraper::{ElementRef, Html};

impl Document {
    /// Parse a full HTML page.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document::new();
        let root = doc.root();
        copy_element(&mut doc, root, parsed.root_element());
        doc
    }

    /// Parse raw page bytes, replacing invalid UTF-8 sequences.
    pub fn parse_bytes(bytes: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(bytes))
    }
}

fn copy_element(doc: &mut Document, parent: NodeId, source: ElementRef<'_>) {
    let el = source.value();
    let mut attrs: Vec<(String, String)> = el
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    attrs.sort_by(|a, b| a.0.cmp(&b.0));
    let id = doc.create_element(el.name(), attrs);
    doc.append(parent, id);

    for child in source.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            copy_element(doc, id, child_el);
        } else if let Some(text) = child.value().as_text() {
            let node = doc.create_text(&**text);
            doc.append(id, node);
        }
    }
}
