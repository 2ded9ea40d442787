//! Prompt rendering for helpdesk nodes

use super::node::Node;
use std::fmt::Write;

/// Glyph for each decimal digit, indexed by the digit's value
pub const DIGIT_GLYPHS: [&str; 10] = [
    "0\u{fe0f}\u{20e3}",
    "1\u{fe0f}\u{20e3}",
    "2\u{fe0f}\u{20e3}",
    "3\u{fe0f}\u{20e3}",
    "4\u{fe0f}\u{20e3}",
    "5\u{fe0f}\u{20e3}",
    "6\u{fe0f}\u{20e3}",
    "7\u{fe0f}\u{20e3}",
    "8\u{fe0f}\u{20e3}",
    "9\u{fe0f}\u{20e3}",
];

/// Label of the extra option offered on every node but the root
pub const BACK_TO_START: &str = "Go back to the start.";

/// Render `number` one glyph per decimal digit, most significant first
pub fn number_as_glyphs(number: usize) -> String {
    number
        .to_string()
        .bytes()
        .map(|digit| DIGIT_GLYPHS[usize::from(digit - b'0')])
        .collect()
}

/// Render a node as the message sent to the user:
/// bold title, blank line, one numbered line per branch, and, except at the
/// root, a numbered "back to the start" line.
pub fn render_node(node: &Node) -> String {
    let mut out = String::new();
    let _ = write!(out, "**{}**\n\n", node.title);

    for (index, branch) in node.branches.iter().enumerate() {
        let _ = writeln!(out, "{} {}", number_as_glyphs(index), branch.label);
    }
    if !node.is_root() {
        let _ = writeln!(
            out,
            "{} {}",
            number_as_glyphs(node.branches.len()),
            BACK_TO_START
        );
    }
    out
}
