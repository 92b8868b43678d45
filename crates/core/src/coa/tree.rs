//! Rule tree model.
//!
//! One tree shape serves every root: a type code, optionally narrowed by a
//! group code, followed by an ordered list of SELECT/TEXT steps.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coa::error::CoaError;

/// Root of a rule tree: a type code and, for types with a group dimension,
/// a group code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeKey {
    /// Type code (e.g. `ASSET`).
    pub type_code: String,
    /// Group code (e.g. `BANK`), only for types with a group dimension.
    pub group_code: Option<String>,
}

impl TreeKey {
    /// Resolves the root for a type, checking the group dimension rule.
    ///
    /// A blank group code counts as absent.
    ///
    /// # Errors
    ///
    /// - `GroupRequired` if the type has a group dimension and no group was supplied
    /// - `UnexpectedGroup` if the type has no group dimension and a group was supplied
    pub fn resolve(
        type_code: &str,
        has_group_dimension: bool,
        group_code: Option<&str>,
    ) -> Result<Self, CoaError> {
        let group_code = group_code.map(str::trim).filter(|g| !g.is_empty());

        match (has_group_dimension, group_code) {
            (true, None) => Err(CoaError::GroupRequired(type_code.to_string())),
            (false, Some(group)) => Err(CoaError::UnexpectedGroup {
                type_code: type_code.to_string(),
                group_code: group.to_string(),
            }),
            (_, group) => Ok(Self {
                type_code: type_code.to_string(),
                group_code: group.map(ToString::to_string),
            }),
        }
    }
}

impl fmt::Display for TreeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group_code {
            Some(group) => write!(f, "{}/{group}", self.type_code),
            None => f.write_str(&self.type_code),
        }
    }
}

/// What a step consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
    /// Pick one active value of a rule category.
    Select {
        /// Category code.
        category: String,
    },
    /// Free text, trimmed and uppercased.
    Text {
        /// Optional label callers may name the step by.
        label: Option<String>,
        /// Whether a value must be supplied.
        required: bool,
    },
}

impl StepKind {
    /// Returns the category code or label used to name this step.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Select { category } => category,
            Self::Text { label, .. } => label.as_deref().unwrap_or("TEXT"),
        }
    }
}

/// Step definition as stored under a tree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Position of the step, unique within the root.
    pub step_order: i32,
    /// Step kind.
    #[serde(flatten)]
    pub kind: StepKind,
    /// Separator appended after the step's value.
    pub separator: String,
}

/// A loaded step together with the active values of its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeStep {
    /// The step definition.
    pub definition: StepDefinition,
    /// Active category values (empty for TEXT steps).
    pub values: Vec<String>,
}

/// Leading code segment (the type, then the group).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment code.
    pub code: String,
    /// Separator appended after the code.
    pub separator: String,
}

/// A fully loaded rule tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTree {
    /// Tree root.
    pub root: TreeKey,
    /// Type segment, then the group segment when a group is in play.
    pub segments: Vec<Segment>,
    /// Steps ordered by `step_order`.
    pub steps: Vec<TreeStep>,
}

impl RuleTree {
    /// Creates a tree, ordering the steps by `step_order`.
    #[must_use]
    pub fn new(root: TreeKey, segments: Vec<Segment>, mut steps: Vec<TreeStep>) -> Self {
        steps.sort_by_key(|s| s.definition.step_order);
        Self {
            root,
            segments,
            steps,
        }
    }

    /// Returns every non-empty separator token used by the tree.
    pub fn separators(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .map(|s| s.separator.as_str())
            .chain(self.steps.iter().map(|s| s.definition.separator.as_str()))
            .filter(|s| !s.is_empty())
    }
}

/// Validates a replacement step list before it is written.
///
/// # Errors
///
/// - `DuplicateStepOrder` if two steps share an order
/// - `UnknownCategory` if a SELECT step names a category not in `known_categories`
pub fn validate_step_definitions(
    steps: &[StepDefinition],
    known_categories: &HashSet<String>,
) -> Result<(), CoaError> {
    let mut seen = HashSet::with_capacity(steps.len());

    for step in steps {
        if !seen.insert(step.step_order) {
            return Err(CoaError::DuplicateStepOrder(step.step_order));
        }

        if let StepKind::Select { category } = &step.kind
            && !known_categories.contains(category)
        {
            return Err(CoaError::UnknownCategory(category.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn select(order: i32, category: &str) -> StepDefinition {
        StepDefinition {
            step_order: order,
            kind: StepKind::Select {
                category: category.to_string(),
            },
            separator: ".".to_string(),
        }
    }

    #[rstest]
    #[case(true, Some("BANK"), Ok(Some("BANK")))]
    #[case(true, Some("  "), Err("GROUP_REQUIRED"))]
    #[case(true, None, Err("GROUP_REQUIRED"))]
    #[case(false, Some("BANK"), Err("UNEXPECTED_GROUP"))]
    #[case(false, None, Ok(None))]
    fn test_resolve_group_dimension(
        #[case] has_group: bool,
        #[case] group: Option<&str>,
        #[case] expected: Result<Option<&str>, &str>,
    ) {
        let result = TreeKey::resolve("ASSET", has_group, group);
        match expected {
            Ok(group_code) => {
                let key = result.unwrap();
                assert_eq!(key.type_code, "ASSET");
                assert_eq!(key.group_code.as_deref(), group_code);
            }
            Err(code) => assert_eq!(result.unwrap_err().error_code(), code),
        }
    }

    #[test]
    fn test_tree_key_display() {
        let key = TreeKey::resolve("ASSET", true, Some("BANK")).unwrap();
        assert_eq!(key.to_string(), "ASSET/BANK");
    }

    #[test]
    fn test_validate_rejects_duplicate_order() {
        let known = HashSet::from(["CURRENCY".to_string()]);
        let steps = vec![select(1, "CURRENCY"), select(1, "CURRENCY")];
        assert_eq!(
            validate_step_definitions(&steps, &known),
            Err(CoaError::DuplicateStepOrder(1))
        );
    }

    #[test]
    fn test_validate_rejects_unknown_category() {
        let known = HashSet::from(["CURRENCY".to_string()]);
        let steps = vec![select(1, "CURRENCY"), select(2, "BANK_NAME")];
        assert_eq!(
            validate_step_definitions(&steps, &known),
            Err(CoaError::UnknownCategory("BANK_NAME".to_string()))
        );
    }

    #[test]
    fn test_validate_accepts_text_steps_without_category() {
        let steps = vec![StepDefinition {
            step_order: 1,
            kind: StepKind::Text {
                label: None,
                required: false,
            },
            separator: String::new(),
        }];
        assert!(validate_step_definitions(&steps, &HashSet::new()).is_ok());
    }

    #[test]
    fn test_new_orders_steps_and_lists_separators() {
        let step = |order| TreeStep {
            definition: select(order, "CURRENCY"),
            values: vec![],
        };
        let tree = RuleTree::new(
            TreeKey::resolve("EXP", false, None).unwrap(),
            vec![Segment {
                code: "EXP".to_string(),
                separator: ":".to_string(),
            }],
            vec![step(3), step(1), step(2)],
        );

        let orders: Vec<i32> = tree.steps.iter().map(|s| s.definition.step_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(tree.separators().collect::<Vec<_>>(), vec![":", ".", ".", "."]);
    }

    #[test]
    fn test_step_kind_serde_shape() {
        let json = serde_json::to_value(select(1, "CURRENCY")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "step_order": 1,
                "kind": "SELECT",
                "category": "CURRENCY",
                "separator": "."
            })
        );
    }
}
