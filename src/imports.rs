//! Import resolution
//!
//! Replaces every element whose tag names an imported component with that
//! component's rendered output. Caller content is projected into the child's
//! slots:
//!
//! - `<slot>` or `<slot name="children">` receives all caller child nodes
//! - `<slot name="x">` receives the first caller child with `slot="x"`
//! - a slot nothing matches is replaced by its own default content
//!
//! Projected caller content is resolved against the caller's imports after
//! splicing. Head assets of every rendered child are collected for the root,
//! along with the import chains each child reached.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::debug;

use crate::directives::SLOT_TAG;
use crate::fingerprint::RenderMode;
use crate::head::HeadAssets;
use crate::manifest::ImportTable;
use crate::markup::{self, Document, NodeId};
use crate::renderer::{RenderSession, Renderer};
use crate::value::DataMap;
use crate::RenderError;

const CHILDREN_SLOT: &str = "children";

/// Expands import instances in one component's document
pub struct ImportResolver<'r> {
    renderer: &'r Renderer,
    imports: &'r ImportTable,
    component: &'r str,
    lifted: HeadAssets,
    import_paths: Vec<Vec<String>>,
}

impl<'r> ImportResolver<'r> {
    pub fn new(renderer: &'r Renderer, imports: &'r ImportTable, component: &'r str) -> Self {
        Self {
            renderer,
            imports,
            component,
            lifted: HeadAssets::new(),
            import_paths: Vec::new(),
        }
    }

    /// Head assets collected from every child rendered so far, and the
    /// import chains below this component in render order
    pub fn into_parts(self) -> (HeadAssets, Vec<Vec<String>>) {
        (self.lifted, self.import_paths)
    }

    /// Resolve imports among the children of `parent`
    pub fn resolve_children<'s>(
        &'s mut self,
        doc: &'s mut Document,
        parent: NodeId,
        session: &'s mut RenderSession,
    ) -> BoxFuture<'s, Result<(), RenderError>>
    where
        'r: 's,
    {
        let nodes = doc.children(parent).to_vec();
        self.resolve_nodes(doc, nodes, session)
    }

    fn resolve_nodes<'s>(
        &'s mut self,
        doc: &'s mut Document,
        nodes: Vec<NodeId>,
        session: &'s mut RenderSession,
    ) -> BoxFuture<'s, Result<(), RenderError>>
    where
        'r: 's,
    {
        async move {
            if self.imports.is_empty() {
                return Ok(());
            }
            for node in nodes {
                let Some(tag) = doc.tag(node) else {
                    continue;
                };
                match self.imports.get(tag).map(str::to_string) {
                    Some(uri) => self.expand(doc, node, &uri, session).await?,
                    None => self.resolve_children(doc, node, session).await?,
                }
            }
            Ok(())
        }
        .boxed()
    }

    /// Replace one import instance with its rendered component
    async fn expand(
        &mut self,
        doc: &mut Document,
        instance: NodeId,
        uri: &str,
        session: &mut RenderSession,
    ) -> Result<(), RenderError> {
        let payload = self.payload(doc, instance)?;
        debug!(component = self.component, child = uri, "expanding import");

        let rendered = self
            .renderer
            .render_component(uri, Some(payload), session, RenderMode::Descendant)
            .await?;
        self.lifted.extend(&rendered.head);
        self.import_paths.push(vec![uri.to_string()]);
        for path in &rendered.import_paths {
            let mut chain = Vec::with_capacity(path.len() + 1);
            chain.push(uri.to_string());
            chain.extend(path.iter().cloned());
            self.import_paths.push(chain);
        }

        let fragment = markup::parse(&rendered.markup).map_err(|source| RenderError::Markup {
            component: uri.to_string(),
            source,
        })?;
        let holder = doc.create_fragment();
        for &node in fragment.children(fragment.root()) {
            let copy = doc.adopt(&fragment, node);
            doc.append_child(holder, copy);
        }

        let projected = project_slots(doc, holder, instance);
        self.resolve_nodes(doc, projected, session).await?;

        let replacement = doc.children(holder).to_vec();
        doc.replace_with(instance, &replacement);
        Ok(())
    }

    /// Instance attributes as the child's custom data. Attributes written by
    /// a bound-attribute directive hold JSON and are decoded; plain
    /// attributes pass through as strings.
    fn payload(&self, doc: &Document, instance: NodeId) -> Result<DataMap, RenderError> {
        let mut payload = DataMap::new();
        let Some(el) = doc.element(instance) else {
            return Ok(payload);
        };
        for attr in &el.attrs {
            let value = if attr.encoded {
                serde_json::from_str(&attr.value).map_err(|e| RenderError::InvalidPayload {
                    component: self.component.to_string(),
                    attribute: attr.name.clone(),
                    message: e.to_string(),
                })?
            } else {
                Value::String(attr.value.clone())
            };
            payload.insert(attr.name.clone(), value);
        }
        Ok(payload)
    }
}

/// Move the instance's child nodes into the slots under `holder`, returning
/// the caller nodes that were projected
fn project_slots(doc: &mut Document, holder: NodeId, instance: NodeId) -> Vec<NodeId> {
    let mut projected = Vec::new();

    for slot in doc.find_elements(holder, SLOT_TAG) {
        // An earlier projection may have replaced an enclosing slot
        if !doc.is_within(slot, holder) {
            continue;
        }
        let name = doc
            .element(slot)
            .and_then(|el| el.attr("name"))
            .map(str::to_string);

        let content: Vec<NodeId> = match name.as_deref() {
            None | Some(CHILDREN_SLOT) => doc.children(instance).to_vec(),
            Some(name) => doc
                .children(instance)
                .iter()
                .copied()
                .find(|&child| {
                    doc.element(child)
                        .and_then(|el| el.attr(SLOT_TAG))
                        .is_some_and(|target| target == name)
                })
                .into_iter()
                .collect(),
        };

        if content.is_empty() {
            let defaults = doc.children(slot).to_vec();
            doc.replace_with(slot, &defaults);
        } else {
            doc.replace_with(slot, &content);
            projected.extend(content);
        }
    }

    projected
}
