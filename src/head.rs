//! Head-level assets lifted from imported components
//!
//! Stylesheet links, scripts and inline styles found in a component's output
//! are collected as [`HeadAsset`]s and placed once in the root document's
//! head. Identity rules:
//!
//! - `<link>`: equal `href`
//! - `<script>`: equal `id`, or equal `src` when there is no id
//! - `<style>`: equal text content
//!
//! Anything else (metas, inline scripts without id or src) is always kept.

use crate::error::MarkupError;
use crate::markup::{self, Document, Element, NodeData, NodeId};

/// Elements that belong in a document head when found at the top level of a
/// component template
const HEAD_LEVEL: &[&str] = &["link", "style", "script", "meta", "title", "base"];

/// Identity used to deduplicate head assets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    Link(String),
    Script(String),
    Style(String),
    /// No identity; never deduplicated
    Unkeyed,
}

impl AssetKey {
    /// Identity of a head node in a document
    pub fn of(doc: &Document, id: NodeId) -> AssetKey {
        let Some(el) = doc.element(id) else {
            return AssetKey::Unkeyed;
        };
        if el.is("link") {
            return el
                .attr("href")
                .map_or(AssetKey::Unkeyed, |href| AssetKey::Link(href.to_string()));
        }
        if el.is("script") {
            return el
                .attr("id")
                .or_else(|| el.attr("src"))
                .map_or(AssetKey::Unkeyed, |key| AssetKey::Script(key.to_string()));
        }
        if el.is("style") {
            return AssetKey::Style(doc.text_content(id));
        }
        AssetKey::Unkeyed
    }
}

/// A serialized head node with its identity
#[derive(Debug, Clone, PartialEq)]
pub struct HeadAsset {
    pub key: AssetKey,
    pub markup: String,
}

impl HeadAsset {
    pub fn new(key: AssetKey, markup: impl Into<String>) -> Self {
        Self {
            key,
            markup: markup.into(),
        }
    }

    pub fn from_node(doc: &Document, id: NodeId) -> Self {
        Self {
            key: AssetKey::of(doc, id),
            markup: markup::serialize(doc, id),
        }
    }
}

/// Ordered, deduplicated list of head assets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadAssets {
    assets: Vec<HeadAsset>,
}

impl HeadAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset unless one with the same key is present. Returns whether
    /// it was added.
    pub fn push(&mut self, asset: HeadAsset) -> bool {
        if asset.key != AssetKey::Unkeyed && self.contains(&asset.key) {
            return false;
        }
        self.assets.push(asset);
        true
    }

    pub fn extend(&mut self, other: &HeadAssets) {
        for asset in &other.assets {
            self.push(asset.clone());
        }
    }

    pub fn contains(&self, key: &AssetKey) -> bool {
        self.assets.iter().any(|a| &a.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeadAsset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn is_head_level(doc: &Document, id: NodeId) -> bool {
    doc.element(id)
        .is_some_and(|el| HEAD_LEVEL.iter().any(|tag| el.is(tag)))
}

/// Split a component's rendered document into head assets and body nodes
///
/// Head assets are the children of an explicit `<head>` plus top-level
/// head-level elements. Body nodes are the children of `<body>` (or `<html>`,
/// or the fragment root) minus those. Doctypes are dropped.
pub fn split_fragment(doc: &Document) -> (HeadAssets, Vec<NodeId>) {
    let mut head = HeadAssets::new();

    if let Some(head_el) = doc.find_element(doc.root(), "head") {
        for &child in doc.children(head_el) {
            if doc.element(child).is_some() {
                head.push(HeadAsset::from_node(doc, child));
            }
        }
    }

    let container = doc
        .find_element(doc.root(), "body")
        .or_else(|| doc.find_element(doc.root(), "html"))
        .unwrap_or(doc.root());

    let mut body = Vec::new();
    for &child in doc.children(container) {
        match doc.data(child) {
            NodeData::Doctype(_) => {}
            NodeData::Element(el) if el.is("head") => {}
            _ if is_head_level(doc, child) => {
                head.push(HeadAsset::from_node(doc, child));
            }
            _ => body.push(child),
        }
    }

    (head, body)
}

/// Place assets in a document's head, skipping ones already present
///
/// A document without a `<head>` gets one: inside `<html>` when there is an
/// `<html>` element, otherwise the whole fragment is promoted to a full
/// document and its top-level head-level elements move into the new head.
/// Nothing changes when `assets` is empty.
pub fn merge_into_document(doc: &mut Document, assets: &HeadAssets) -> Result<(), MarkupError> {
    if assets.is_empty() {
        return Ok(());
    }
    let head = ensure_head(doc);

    let mut present: Vec<AssetKey> = doc
        .children(head)
        .iter()
        .map(|&child| AssetKey::of(doc, child))
        .filter(|key| *key != AssetKey::Unkeyed)
        .collect();

    for asset in assets.iter() {
        if asset.key != AssetKey::Unkeyed && present.contains(&asset.key) {
            continue;
        }
        let fragment = markup::parse(&asset.markup)?;
        for &node in fragment.children(fragment.root()) {
            let copy = doc.adopt(&fragment, node);
            doc.append_child(head, copy);
        }
        present.push(asset.key.clone());
    }
    Ok(())
}

/// Find or create the document's `<head>`
pub fn ensure_head(doc: &mut Document) -> NodeId {
    let root = doc.root();
    if let Some(head) = doc.find_element(root, "head") {
        return head;
    }
    if let Some(html) = doc.find_element(root, "html") {
        let head = doc.create_element(Element::new("head"));
        doc.prepend_child(html, head);
        return head;
    }

    let top_level = doc.children(root).to_vec();
    let has_doctype = top_level
        .iter()
        .any(|&n| matches!(doc.data(n), NodeData::Doctype(_)));
    if !has_doctype {
        let doctype = doc.create_doctype("<!DOCTYPE html>");
        doc.prepend_child(root, doctype);
    }

    let html = doc.create_element(Element::new("html"));
    let head = doc.create_element(Element::new("head"));
    let body = doc.create_element(Element::new("body"));
    doc.append_child(html, head);
    doc.append_child(html, body);

    for node in top_level {
        match doc.data(node) {
            NodeData::Doctype(_) => {}
            _ if is_head_level(doc, node) => doc.append_child(head, node),
            _ => doc.append_child(body, node),
        }
    }
    doc.append_child(root, html);
    head
}
