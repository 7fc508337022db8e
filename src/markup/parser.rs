//! Markup parser building a [`Document`] from lexer tokens
//!
//! The parser is forgiving the way browsers are: stray `<` characters are
//! text, unmatched closing tags are ignored and unclosed elements end at the
//! end of input. Only comments and raw-text bodies (`<script>`, `<style>`)
//! that never terminate are reported, because everything after them would
//! otherwise be swallowed silently.

use logos::Logos;

use crate::error::MarkupError;

use super::lexer::{parse_open_tag, Token};
use super::tree::{is_raw_text, is_void, Attribute, Document, Element, NodeId};

/// Parse markup into a document
pub fn parse(source: &str) -> Result<Document, MarkupError> {
    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = vec![doc.root()];
    let mut lexer = Token::lexer(source);

    while let Some(token) = lexer.next() {
        let current = *stack.last().unwrap_or(&doc.root());
        match token {
            Ok(Token::Text(text)) => append_text(&mut doc, current, &text),
            Ok(Token::Comment(body)) => {
                let node = doc.create_comment(body);
                doc.append_child(current, node);
            }
            Ok(Token::Doctype(decl)) => {
                let node = doc.create_doctype(decl);
                doc.append_child(current, node);
            }
            Ok(Token::CloseTag(name)) => {
                let open = stack
                    .iter()
                    .rposition(|&id| doc.element(id).is_some_and(|el| el.is(&name)));
                if let Some(index) = open {
                    stack.truncate(index);
                }
            }
            Ok(Token::OpenTag(raw)) => {
                let tag = parse_open_tag(&raw);
                let mut element = Element::new(&tag.name);
                element.attrs = tag
                    .attrs
                    .into_iter()
                    .map(|(name, value)| Attribute::new(name, value))
                    .collect();
                let node = doc.create_element(element);
                doc.append_child(current, node);

                if is_void(&tag.name) || tag.self_closing {
                    continue;
                }

                if is_raw_text(&tag.name) {
                    let closing = format!("</{}", tag.name.to_ascii_lowercase());
                    let rest = lexer.remainder();
                    let Some(end) = rest.to_ascii_lowercase().find(&closing) else {
                        return Err(MarkupError::UnterminatedRawText {
                            tag: tag.name,
                            span: lexer.span().start..source.len(),
                        });
                    };
                    if end > 0 {
                        let body = doc.create_text(&rest[..end]);
                        doc.append_child(node, body);
                    }
                    lexer.bump(end);
                }

                stack.push(node);
            }
            Err(()) => {
                let slice = lexer.slice();
                if slice.starts_with("<!--") {
                    return Err(MarkupError::UnterminatedComment {
                        span: lexer.span().start..source.len(),
                    });
                }
                append_text(&mut doc, current, slice);
            }
        }
    }

    Ok(doc)
}

/// Append text, merging with a preceding text node
fn append_text(doc: &mut Document, parent: NodeId, text: &str) {
    if let Some(&last) = doc.children(parent).last() {
        if let Some(existing) = doc.text_mut(last) {
            existing.push_str(text);
            return;
        }
    }
    let node = doc.create_text(text);
    doc.append_child(parent, node);
}
