//! Property-based tests for interpretation and rendering

use super::render::{number_as_glyphs, DIGIT_GLYPHS};
use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_node_id() -> impl Strategy<Value = NodeId> {
    prop_oneof![Just(NodeId::root()), "[a-z]{1,8}".prop_map(NodeId::new)]
}

fn arb_node() -> impl Strategy<Value = Node> {
    (
        arb_node_id(),
        "[A-Za-z ?]{1,30}",
        proptest::collection::vec(("[a-z]{1,8}", "[A-Za-z ]{1,20}"), 0..15),
    )
        .prop_map(|(id, title, branches)| {
            branches
                .into_iter()
                .fold(Node::new(id, title), |node, (target, label)| {
                    node.with_branch(target.as_str(), label)
                })
        })
}

/// Option numbers the rendered prompt offers, parsed back from its lines
fn offered_options(rendered: &str) -> usize {
    rendered.lines().skip(2).count()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_rendered_options_are_all_valid(node in arb_node()) {
        let offered = offered_options(&render_node(&node));
        let k = node.branches.len();
        prop_assert_eq!(offered, if node.is_root() { k } else { k + 1 });

        for index in 0..offered {
            prop_assert_ne!(interpret(&index.to_string(), &node), Choice::Reprompt);
        }
    }

    #[test]
    fn prop_branch_count_routes_to_root(node in arb_node()) {
        let k = node.branches.len();
        prop_assert_eq!(interpret(&k.to_string(), &node), Choice::GoToRoot);
    }

    #[test]
    fn prop_indices_past_back_option_reprompt(node in arb_node(), extra in 1usize..1000) {
        let k = node.branches.len();
        prop_assert_eq!(interpret(&(k + extra).to_string(), &node), Choice::Reprompt);
    }

    #[test]
    fn prop_negative_numbers_reprompt(node in arb_node(), n in 1i64..i64::MAX) {
        prop_assert_eq!(interpret(&(-n).to_string(), &node), Choice::Reprompt);
    }

    #[test]
    fn prop_non_numeric_reprompts(node in arb_node(), raw in "[^0-9+-]*[a-zA-Z ][^0-9]*") {
        prop_assert_eq!(interpret(&raw, &node), Choice::Reprompt);
    }

    #[test]
    fn prop_valid_index_follows_that_branch(node in arb_node(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!node.branches.is_empty());
        let index = pick.index(node.branches.len());
        prop_assert_eq!(
            interpret(&index.to_string(), &node),
            Choice::GoTo(node.branches[index].target.clone())
        );
    }

    #[test]
    fn prop_glyphs_have_one_glyph_per_digit(n in any::<u32>()) {
        let n = n as usize;
        let glyphs = number_as_glyphs(n);
        let expected: String = n
            .to_string()
            .chars()
            .map(|c| DIGIT_GLYPHS[c.to_digit(10).unwrap() as usize])
            .collect();
        prop_assert_eq!(glyphs, expected);
    }
}
