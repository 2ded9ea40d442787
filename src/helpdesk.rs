//! Helpdesk decision tree
//!
//! The immutable tree every session walks, the interpreter that turns a
//! user's reply into the next node, and the renderer for node prompts.

mod interpret;
mod node;
mod render;
mod tree;

#[cfg(test)]
mod proptests;

pub use interpret::{interpret, Choice};
pub use node::{Node, NodeId};
pub use render::render_node;
pub use tree::DialogueTree;
