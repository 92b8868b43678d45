//! Property-based tests for the code builder.

use proptest::prelude::*;

use super::builder::{CodeBuilder, StepSelection};
use super::error::CoaError;
use super::tree::{RuleTree, Segment, StepDefinition, StepKind, TreeKey, TreeStep};

/// Strategy for catalog values: short uppercase codes without separators.
fn value_strategy() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,6}"
}

/// Strategy for a tree with `n` SELECT steps, each with 1..4 values.
fn tree_strategy() -> impl Strategy<Value = RuleTree> {
    prop::collection::vec(prop::collection::vec(value_strategy(), 1..4), 0..5).prop_map(
        |step_values| {
            let steps = step_values
                .into_iter()
                .enumerate()
                .map(|(i, values)| TreeStep {
                    definition: StepDefinition {
                        step_order: i32::try_from(i).unwrap_or(i32::MAX),
                        kind: StepKind::Select {
                            category: format!("CAT{i}"),
                        },
                        separator: ".".to_string(),
                    },
                    values,
                })
                .collect();

            RuleTree::new(
                TreeKey::resolve("ASSET", true, Some("BANK")).unwrap(),
                vec![
                    Segment {
                        code: "ASSET".to_string(),
                        separator: ":".to_string(),
                    },
                    Segment {
                        code: "BANK".to_string(),
                        separator: ":".to_string(),
                    },
                ],
                steps,
            )
        },
    )
}

/// Picks the first value of every step.
fn first_values(tree: &RuleTree) -> Vec<StepSelection> {
    tree.steps
        .iter()
        .map(|s| StepSelection::select(s.definition.kind.name(), s.values[0].clone()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: building twice over the same tree and selections yields the same code.
    #[test]
    fn prop_build_is_deterministic(tree in tree_strategy()) {
        let selections = first_values(&tree);
        let first = CodeBuilder::build(&tree, &selections);
        let second = CodeBuilder::build(&tree.clone(), &selections.clone());
        prop_assert_eq!(first, second);
    }

    /// Property: the code starts with the root segments and never ends with a separator.
    #[test]
    fn prop_code_has_prefix_and_no_trailing_separator(tree in tree_strategy()) {
        let code = CodeBuilder::build(&tree, &first_values(&tree)).unwrap();
        prop_assert!(code.starts_with("ASSET:BANK"));
        prop_assert!(!code.ends_with('.'));
        prop_assert!(!code.ends_with(':'));
    }

    /// Property: the code carries one value per step.
    #[test]
    fn prop_code_has_one_part_per_step(tree in tree_strategy()) {
        let code = CodeBuilder::build(&tree, &first_values(&tree)).unwrap();
        let tail = code.strip_prefix("ASSET:BANK").unwrap_or_default();
        let parts = tail.trim_start_matches(':').split('.').filter(|p| !p.is_empty()).count();
        prop_assert_eq!(parts, tree.steps.len());
    }

    /// Property: a value outside the category is always rejected.
    #[test]
    fn prop_unknown_value_rejected(tree in tree_strategy(), bogus in "[a-z]{1,6}") {
        prop_assume!(!tree.steps.is_empty());
        let mut selections = first_values(&tree);
        selections[0] = StepSelection::select(tree.steps[0].definition.kind.name(), bogus);
        let result = CodeBuilder::build(&tree, &selections);
        prop_assert!(
            matches!(result, Err(CoaError::UnknownValue { .. })),
            "expected UnknownValue, got {:?}",
            result
        );
    }

    /// Property: extra selections are always rejected.
    #[test]
    fn prop_too_many_selections_rejected(tree in tree_strategy()) {
        let mut selections = first_values(&tree);
        selections.push(StepSelection::Positional { value: None });
        let result = CodeBuilder::build(&tree, &selections);
        prop_assert!(
            matches!(result, Err(CoaError::TooManySelections { .. })),
            "expected TooManySelections, got {:?}",
            result
        );
    }
}
