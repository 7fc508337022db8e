//! Directive evaluation
//!
//! Rewrites a parsed template in place against a data context, removing all
//! directive markup:
//!
//! - `use-for="item in items"` repeats the element once per list item
//! - `use-if="path"` / `use-if="!path"` keeps or removes the element
//! - `<slot name="path">` is replaced by the value at `path` when present
//! - `:attr="path"` / `:attr="!path"` binds an attribute to data
//!
//! On a single element the directives run in that order. Repeat clones are
//! evaluated as complete, independent subtrees with the loop variable in scope.
//!
//! Text and plain attribute values are also rendered as handlebars templates,
//! so `{{path}}` placeholders are filled before the element's condition is
//! checked. Missing and null values insert nothing. Text is escaped unless
//! the placeholder is written `{{{path}}}`.

use handlebars::Handlebars;
use serde_json::Value;
use tracing::trace;

use crate::manifest::ImportTable;
use crate::markup::{escape_text, Document, NodeId};
use crate::value::{self, DataMap};

pub const REPEAT_ATTR: &str = "use-for";
pub const CONDITION_ATTR: &str = "use-if";
pub const SLOT_TAG: &str = "slot";
pub const BIND_PREFIX: char = ':';

const PLACEHOLDER_OPEN: &str = "{{";

/// Applies directives to a template
pub struct DirectiveEvaluator<'a> {
    imports: &'a ImportTable,
    text_placeholders: Handlebars<'static>,
    attr_placeholders: Handlebars<'static>,
}

impl<'a> DirectiveEvaluator<'a> {
    /// `imports` decides which elements are component instances; bound
    /// attributes on those are written as JSON so the child can read
    /// structured data back.
    pub fn new(imports: &'a ImportTable) -> Self {
        let mut attr_placeholders = Handlebars::new();
        // Serialization escapes attribute values
        attr_placeholders.register_escape_fn(handlebars::no_escape);
        Self {
            imports,
            text_placeholders: Handlebars::new(),
            attr_placeholders,
        }
    }

    /// Evaluate every directive in the document
    pub fn evaluate(&self, doc: &mut Document, data: &DataMap) {
        let root = doc.root();
        self.evaluate_children(doc, root, data);
    }

    fn evaluate_children(&self, doc: &mut Document, parent: NodeId, data: &DataMap) {
        for child in doc.children(parent).to_vec() {
            self.evaluate_node(doc, child, data);
        }
    }

    fn evaluate_node(&self, doc: &mut Document, id: NodeId, data: &DataMap) {
        let Some(el) = doc.element(id) else {
            if let Some(text) = doc.text_mut(id) {
                if let Some(filled) = interpolate(&self.text_placeholders, text, data) {
                    *text = filled;
                }
            }
            return;
        };

        if let Some(expr) = el.attr(REPEAT_ATTR).map(str::to_string) {
            self.expand_repeat(doc, id, &expr, data);
            return;
        }

        if let Some(el) = doc.element_mut(id) {
            for attr in el.attrs.iter_mut().filter(|a| !a.encoded) {
                if let Some(filled) = interpolate(&self.attr_placeholders, &attr.value, data) {
                    attr.value = filled;
                }
            }
        }

        if let Some(condition) = doc
            .element(id)
            .and_then(|el| el.attr(CONDITION_ATTR))
            .map(str::to_string)
        {
            if !value::condition_holds(data, &condition) {
                doc.detach(id);
                return;
            }
            if let Some(el) = doc.element_mut(id) {
                el.remove_attr(CONDITION_ATTR);
            }
        }

        if self.fill_data_slot(doc, id, data) {
            return;
        }

        self.evaluate_children(doc, id, data);
        self.bind_attributes(doc, id, data);
    }

    /// Clone `id` once per item of the collection, inserting clones before
    /// the original, then drop the original
    fn expand_repeat(&self, doc: &mut Document, id: NodeId, expr: &str, data: &DataMap) {
        if let Some(el) = doc.element_mut(id) {
            el.remove_attr(REPEAT_ATTR);
        }

        let items = match parse_repeat(expr) {
            Some((item_name, path)) => match value::lookup(data, path) {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| (item_name, item.clone()))
                    .collect::<Vec<_>>(),
                // Missing or non-list collections repeat zero times
                _ => Vec::new(),
            },
            None => {
                trace!(expr, "malformed repeat expression");
                Vec::new()
            }
        };

        for (item_name, item) in items {
            let clone = doc.clone_subtree(id);
            doc.insert_before(id, clone);
            let mut scope = data.clone();
            scope.insert(item_name.to_string(), item);
            self.evaluate_node(doc, clone, &scope);
        }
        doc.detach(id);
    }

    /// Replace `<slot name="path">` with the data value at `path`. Presence
    /// is an explicit check: any non-null value fills the slot, even `""`.
    fn fill_data_slot(&self, doc: &mut Document, id: NodeId, data: &DataMap) -> bool {
        let Some(el) = doc.element(id) else {
            return false;
        };
        if !el.is(SLOT_TAG) {
            return false;
        }
        let Some(name) = el.attr("name") else {
            return false;
        };
        match value::lookup(data, name) {
            Some(found) if !found.is_null() => {
                let text = doc.create_text(escape_text(&value::to_text(found)));
                doc.replace_with(id, &[text]);
                true
            }
            _ => false,
        }
    }

    fn bind_attributes(&self, doc: &mut Document, id: NodeId, data: &DataMap) {
        let Some(el) = doc.element_mut(id) else {
            return;
        };
        let is_instance = self.imports.contains(&el.name);

        let bound: Vec<(String, String)> = el
            .attrs
            .iter()
            .filter(|a| a.name.len() > 1 && a.name.starts_with(BIND_PREFIX))
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect();

        for (directive, expr) in bound {
            el.remove_attr(&directive);
            let target = &directive[BIND_PREFIX.len_utf8()..];
            let expr = expr.trim();

            let resolved = match expr.strip_prefix('!') {
                Some(path) => Some(Value::Bool(!value::is_truthy(value::lookup(data, path)))),
                None => value::lookup(data, expr).cloned(),
            };

            if !value::is_truthy(resolved.as_ref()) {
                el.remove_attr(target);
                continue;
            }
            let Some(resolved) = resolved else {
                continue;
            };

            if is_instance {
                el.set_encoded_attr(target, resolved.to_string());
            } else {
                el.set_attr(target, value::to_text(&resolved));
            }
        }
    }
}

/// Render `{{path}}` placeholders in `text`, or `None` when there are none.
/// Text that does not parse as a template is kept as written.
fn interpolate(engine: &Handlebars<'static>, text: &str, data: &DataMap) -> Option<String> {
    if !text.contains(PLACEHOLDER_OPEN) {
        return None;
    }
    match engine.render_template(text, data) {
        Ok(filled) => Some(filled),
        Err(e) => {
            trace!(error = %e, "keeping placeholder text as written");
            None
        }
    }
}

/// Split `item in collection` into its two names
fn parse_repeat(expr: &str) -> Option<(&str, &str)> {
    let (item, collection) = expr.trim().split_once(" in ")?;
    let item = item.trim();
    let collection = collection.trim();
    if item.is_empty() || collection.is_empty() {
        return None;
    }
    Some((item, collection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{parse, serialize};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn eval_with(template: &str, data: Value, imports: &ImportTable) -> String {
        let mut doc = parse(template).unwrap();
        let data = data.as_object().cloned().unwrap_or_default();
        DirectiveEvaluator::new(imports).evaluate(&mut doc, &data);
        serialize(&doc, doc.root())
    }

    fn eval(template: &str, data: Value) -> String {
        eval_with(template, data, &ImportTable::new())
    }

    #[test]
    fn test_no_directives_is_identity() {
        let template = r#"<div class="a"><p>text</p><!--c--><br></div>"#;
        assert_eq!(eval(template, json!({"anything": 1})), template);
    }

    #[test]
    fn test_repeat_produces_clones_in_order() {
        let out = eval(
            r#"<ul><li use-for="item in items"><slot name="item"></slot></li></ul>"#,
            json!({"items": ["a", "b", "c"]}),
        );
        assert_eq!(out, "<ul><li>a</li><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn test_repeat_over_empty_list_removes_element() {
        let out = eval(
            r#"<ul><li use-for="item in items">x</li></ul>"#,
            json!({"items": []}),
        );
        assert_eq!(out, "<ul></ul>");
    }

    #[test]
    fn test_repeat_over_missing_or_scalar_is_empty() {
        assert_eq!(eval(r#"<p use-for="x in nope">x</p>"#, json!({})), "");
        assert_eq!(eval(r#"<p use-for="x in n">x</p>"#, json!({"n": 5})), "");
        assert_eq!(eval(r#"<p use-for="garbage">x</p>"#, json!({})), "");
    }

    #[test]
    fn test_nested_repeat_uses_outer_item() {
        let out = eval(
            r#"<div use-for="row in rows"><span use-for="cell in row.cells"><slot name="cell"></slot></span>;</div>"#,
            json!({"rows": [{"cells": [1, 2]}, {"cells": [3]}]}),
        );
        assert_eq!(
            out,
            "<div><span>1</span><span>2</span>;</div><div><span>3</span>;</div>"
        );
    }

    #[test]
    fn test_repeat_with_condition_on_item() {
        let out = eval(
            r#"<i use-for="t in todos" use-if="t.done"><slot name="t.title"></slot></i>"#,
            json!({"todos": [{"title": "a", "done": true}, {"title": "b", "done": false}]}),
        );
        assert_eq!(out, "<i>a</i>");
    }

    #[test]
    fn test_condition_removes_falsy() {
        assert_eq!(eval(r#"<p use-if="show">x</p>"#, json!({"show": 0})), "");
        assert_eq!(eval(r#"<p use-if="show">x</p>"#, json!({"show": "yes"})), "<p>x</p>");
    }

    #[test]
    fn test_negated_condition() {
        assert_eq!(
            eval(r#"<p use-if="!hidden">visible</p>"#, json!({"hidden": true})),
            ""
        );
        assert_eq!(
            eval(r#"<p use-if="!hidden">visible</p>"#, json!({"hidden": false})),
            "<p>visible</p>"
        );
    }

    #[test]
    fn test_removed_subtree_is_not_evaluated() {
        let out = eval(
            r#"<div use-if="no"><p use-for="x in xs">x</p></div><span></span>"#,
            json!({"xs": [1]}),
        );
        assert_eq!(out, "<span></span>");
    }

    #[test]
    fn test_data_slot_presence_not_truthiness() {
        assert_eq!(
            eval(r#"<h1><slot name="title">Default</slot></h1>"#, json!({"title": ""})),
            "<h1></h1>"
        );
        assert_eq!(
            eval(r#"<h1><slot name="title">Default</slot></h1>"#, json!({"title": null})),
            r#"<h1><slot name="title">Default</slot></h1>"#
        );
    }

    #[test]
    fn test_data_slot_escapes_text() {
        assert_eq!(
            eval(r#"<p><slot name="v"></slot></p>"#, json!({"v": "<b>&"})),
            "<p>&lt;b&gt;&amp;</p>"
        );
    }

    #[test]
    fn test_bound_attribute_plain() {
        let out = eval(
            r#"<a :href="link.url" :title="missing" title="old" :hidden="!visible">x</a>"#,
            json!({"link": {"url": "/home"}, "visible": false}),
        );
        assert_eq!(out, r#"<a href="/home" hidden="true">x</a>"#);
    }

    #[test]
    fn test_bound_attribute_on_component_instance_is_json() {
        let mut imports = ImportTable::new();
        imports.insert("user-card", "components/user");
        let template = r#"<user-card :user="user" :count="n"></user-card>"#;
        let mut doc = parse(template).unwrap();
        let data = json!({"user": {"name": "Ada"}, "n": 2});
        DirectiveEvaluator::new(&imports).evaluate(&mut doc, data.as_object().unwrap());

        let card = doc.children(doc.root())[0];
        let el = doc.element(card).unwrap();
        assert_eq!(el.attr("user"), Some(r#"{"name":"Ada"}"#));
        assert_eq!(el.attr("count"), Some("2"));
        assert!(el.attrs.iter().all(|a| a.encoded));
    }

    #[test]
    fn test_bound_attributes_inside_repeat() {
        let out = eval(
            r#"<a use-for="l in links" :href="l">go</a>"#,
            json!({"links": ["/a", "/b"]}),
        );
        assert_eq!(out, r#"<a href="/a">go</a><a href="/b">go</a>"#);
    }

    #[test]
    fn test_text_interpolation() {
        assert_eq!(
            eval(
                "<p>Hi {{ user.name }}, {{missing}}you have {{count}} items</p>",
                json!({"user": {"name": "Ada"}, "count": 3})
            ),
            "<p>Hi Ada, you have 3 items</p>"
        );
    }

    #[test]
    fn test_text_interpolation_escapes_unless_triple_braced() {
        assert_eq!(
            eval("<p>{{v}}|{{{v}}}</p>", json!({"v": "<b>&</b>"})),
            "<p>&lt;b&gt;&amp;&lt;/b&gt;|<b>&</b></p>"
        );
    }

    #[test]
    fn test_attribute_interpolation() {
        assert_eq!(
            eval(
                r#"<a href="/users/{{id}}" title="{{name}}">x</a>"#,
                json!({"id": 7, "name": "\"Ada\" & co"})
            ),
            r#"<a href="/users/7" title="&quot;Ada&quot; &amp; co">x</a>"#
        );
    }

    #[test]
    fn test_interpolation_sees_repeat_item() {
        assert_eq!(
            eval(
                r#"<li use-for="t in tags" class="tag-{{t}}">{{t}}</li>"#,
                json!({"tags": ["a", "b"]})
            ),
            r#"<li class="tag-a">a</li><li class="tag-b">b</li>"#
        );
    }

    #[test]
    fn test_interpolated_condition() {
        assert_eq!(eval(r#"<p use-if="{{flag}}">x</p>"#, json!({"flag": "show"})), "");
        assert_eq!(eval(r#"<p use-if="{{flag}}">x</p>"#, json!({"flag": "show", "show": 1})), "<p>x</p>");
    }

    #[test]
    fn test_unparseable_placeholder_text_is_literal() {
        assert_eq!(eval("<p>{{a}} {{b</p>", json!({"a": 1})), "<p>{{a}} {{b</p>");
    }
}
