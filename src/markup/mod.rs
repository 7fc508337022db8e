//! Markup model for component templates
//!
//! Templates are parsed into an arena [`Document`]; the directive evaluator
//! and import resolver rewrite it in place and [`serialize`] turns it back
//! into text.

pub mod lexer;
mod parser;
mod serialize;
mod tree;

pub use parser::parse;
pub use serialize::{escape_attribute, escape_text, serialize, serialize_children, serialize_nodes};
pub use tree::{is_raw_text, is_void, Attribute, Document, Element, NodeData, NodeId};
