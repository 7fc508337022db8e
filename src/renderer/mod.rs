//! Component renderer
//!
//! [`Renderer`] turns a component URI and optional caller data into HTML,
//! recursively rendering imported components and memoizing every render by
//! a fingerprint of its inputs.

mod context;
mod engine;

pub use context::merge_data;
pub use engine::{RenderSession, Rendered, Renderer};
