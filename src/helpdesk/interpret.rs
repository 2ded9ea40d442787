//! Reply interpretation
//!
//! Turns the raw text of a user's reply into a move through the tree.

use super::node::{Node, NodeId};

/// Where a reply leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// Not a number, or not one of the offered options
    Reprompt,
    /// The extra "go back to the start" option
    GoToRoot,
    /// Follow the branch with this target
    GoTo(NodeId),
}

/// Interpret `raw` against the node the user is answering.
///
/// Options are `0..n` for the node's `n` branches plus `n` for going back to
/// the start. The text must be a base-10 integer as typed, without
/// surrounding whitespace.
pub fn interpret(raw: &str, node: &Node) -> Choice {
    let Ok(picked) = raw.parse::<i64>() else {
        return Choice::Reprompt;
    };
    let Ok(picked) = usize::try_from(picked) else {
        return Choice::Reprompt;
    };

    let branch_count = node.branches.len();
    match picked.cmp(&branch_count) {
        std::cmp::Ordering::Greater => Choice::Reprompt,
        std::cmp::Ordering::Equal => Choice::GoToRoot,
        std::cmp::Ordering::Less => Choice::GoTo(node.branches[picked].target.clone()),
    }
}
