//! Markup serialization

use super::tree::{is_void, Document, NodeData, NodeId};

/// Serialize a node and its subtree. Fragments serialize as their children.
pub fn serialize(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

/// Serialize only the children of a node
pub fn serialize_children(doc: &Document, id: NodeId) -> String {
    serialize_nodes(doc, doc.children(id))
}

/// Serialize a list of sibling nodes in order
pub fn serialize_nodes(doc: &Document, nodes: &[NodeId]) -> String {
    let mut out = String::new();
    for &node in nodes {
        write_node(doc, node, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Fragment => {
            for &child in doc.children(id) {
                write_node(doc, child, out);
            }
        }
        NodeData::Text(text) => out.push_str(text),
        NodeData::Comment(body) => {
            out.push_str("<!--");
            out.push_str(body);
            out.push_str("-->");
        }
        NodeData::Doctype(decl) => out.push_str(decl),
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                if !attr.value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(&attr.value));
                    out.push('"');
                }
            }
            out.push('>');

            let children = doc.children(id);
            if is_void(&el.name) && children.is_empty() {
                return;
            }
            for &child in children {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

/// Escape a value for a double-quoted attribute
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape data inserted as text content
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
