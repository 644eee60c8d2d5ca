//! Deterministic, indented HTML serialization.
//!
//! Every tag and every non-blank text run goes on its own line, indented by
//! one space per nesting level. Text is trimmed at both ends. Preformatted
//! elements are emitted verbatim on a single line so their whitespace
//! survives.

use super::{Document, NodeData, NodeId};
use html_escape::{encode_double_quoted_attribute, encode_text};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const PREFORMATTED: &[&str] = &["pre", "textarea"];

const RAW_TEXT: &[&str] = &["script", "style"];

/// Serialize `id` and its subtree in the indented form.
pub fn prettify(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_pretty(doc, id, 0, false, &mut out);
    out
}

/// Serialize `id` and its subtree without any added whitespace.
#[cfg(test)]
pub fn to_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_compact(doc, id, false, &mut out);
    out
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn write_open_tag(name: &str, attrs: &[(String, String)], out: &mut String) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');
}

fn write_pretty(doc: &Document, id: NodeId, depth: usize, raw: bool, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Document => {
            for &child in &node.children {
                write_pretty(doc, child, depth, false, out);
            }
        }
        NodeData::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return;
            }
            push_indent(depth, out);
            if raw {
                out.push_str(trimmed);
            } else {
                out.push_str(&encode_text(trimmed));
            }
            out.push('\n');
        }
        NodeData::Element(el) => {
            push_indent(depth, out);
            if PREFORMATTED.contains(&el.name.as_str()) {
                write_compact(doc, id, false, out);
                out.push('\n');
                return;
            }
            write_open_tag(&el.name, &el.attrs, out);
            out.push('\n');
            if is_void(&el.name) {
                return;
            }
            let raw_children = RAW_TEXT.contains(&el.name.as_str());
            for &child in &node.children {
                write_pretty(doc, child, depth + 1, raw_children, out);
            }
            push_indent(depth, out);
            out.push_str("</");
            out.push_str(&el.name);
            out.push_str(">\n");
        }
    }
}

fn write_compact(doc: &Document, id: NodeId, raw: bool, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Document => {
            for &child in &node.children {
                write_compact(doc, child, false, out);
            }
        }
        NodeData::Text(text) => {
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&encode_text(text));
            }
        }
        NodeData::Element(el) => {
            write_open_tag(&el.name, &el.attrs, out);
            if is_void(&el.name) {
                return;
            }
            let raw_children = RAW_TEXT.contains(&el.name.as_str());
            for &child in &node.children {
                write_compact(doc, child, raw_children, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

fn push_indent(depth: usize, out: &mut String) {
    out.extend(std::iter::repeat_n(' ', depth));
}
