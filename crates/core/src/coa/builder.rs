//! Account code builder.
//!
//! Walks a loaded [`RuleTree`] with the caller's selections and assembles the
//! canonical code: `TYPE<sep>GROUP<sep>value<sep>value...` with the final
//! trailing separator trimmed.

use serde::{Deserialize, Serialize};

use crate::coa::error::CoaError;
use crate::coa::tree::{RuleTree, StepKind, TreeStep};

/// One caller selection, matched to a step by position.
///
/// A selection may name the step it targets (the category of a SELECT step
/// or the label of a TEXT step). Positional selections only carry a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepSelection {
    /// A value of the named category.
    Select {
        /// Category code the caller expects at this position.
        category: String,
        /// Selected value.
        value: String,
    },
    /// Free text for the labelled step.
    Text {
        /// Label the caller expects at this position.
        text: String,
        /// Text value, absent to skip an optional step.
        #[serde(default)]
        value: Option<String>,
    },
    /// Bare value for whatever step sits at this position.
    Positional {
        /// Value, absent to skip an optional step.
        #[serde(default)]
        value: Option<String>,
    },
}

impl StepSelection {
    /// Creates a SELECT selection.
    #[must_use]
    pub fn select(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Select {
            category: category.into(),
            value: value.into(),
        }
    }

    /// Creates a TEXT selection.
    #[must_use]
    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            text: label.into(),
            value: Some(value.into()),
        }
    }
}

/// Stateless code builder.
pub struct CodeBuilder;

impl CodeBuilder {
    /// Builds the account code for `tree` from `selections`.
    ///
    /// Identical trees and selections always produce the identical code.
    ///
    /// # Errors
    ///
    /// - `TooManySelections` if there are more selections than steps
    /// - `StepMismatch` if a selection names another category or label
    /// - `MissingValue` if a SELECT step or a required TEXT step has no value
    /// - `UnknownValue` if a SELECT value is not an active category value
    /// - `InvalidText` if free text contains a separator of the tree
    pub fn build(tree: &RuleTree, selections: &[StepSelection]) -> Result<String, CoaError> {
        if selections.len() > tree.steps.len() {
            return Err(CoaError::TooManySelections {
                expected: tree.steps.len(),
                actual: selections.len(),
            });
        }

        let mut code = String::new();
        let mut trailing = 0;

        for segment in &tree.segments {
            code.push_str(&segment.code);
            code.push_str(&segment.separator);
            trailing = segment.separator.len();
        }

        for (index, step) in tree.steps.iter().enumerate() {
            let position = index + 1;
            let part = match &step.definition.kind {
                StepKind::Select { category } => Some(Self::resolve_select(
                    step,
                    category,
                    position,
                    selections.get(index),
                )?),
                StepKind::Text { label, required } => Self::resolve_text(
                    tree,
                    label.as_deref(),
                    *required,
                    position,
                    selections.get(index),
                )?,
            };

            if let Some(part) = part {
                code.push_str(&part);
                code.push_str(&step.definition.separator);
                trailing = step.definition.separator.len();
            }
        }

        code.truncate(code.len() - trailing);
        Ok(code)
    }

    fn resolve_select(
        step: &TreeStep,
        category: &str,
        position: usize,
        selection: Option<&StepSelection>,
    ) -> Result<String, CoaError> {
        let missing = || CoaError::MissingValue {
            position,
            step: category.to_string(),
        };

        let value = match selection {
            None | Some(StepSelection::Positional { value: None }) => return Err(missing()),
            Some(StepSelection::Select {
                category: named,
                value,
            }) => {
                if !named.trim().eq_ignore_ascii_case(category) {
                    return Err(CoaError::StepMismatch {
                        position,
                        expected: category.to_string(),
                        actual: named.clone(),
                    });
                }
                value
            }
            Some(StepSelection::Positional { value: Some(value) }) => value,
            Some(StepSelection::Text { text, .. }) => {
                return Err(CoaError::StepMismatch {
                    position,
                    expected: category.to_string(),
                    actual: text.clone(),
                });
            }
        };

        let value = value.trim();
        if value.is_empty() {
            return Err(missing());
        }

        step.values
            .iter()
            .find(|v| v.as_str() == value)
            .cloned()
            .ok_or_else(|| CoaError::UnknownValue {
                category: category.to_string(),
                value: value.to_string(),
            })
    }

    fn resolve_text(
        tree: &RuleTree,
        label: Option<&str>,
        required: bool,
        position: usize,
        selection: Option<&StepSelection>,
    ) -> Result<Option<String>, CoaError> {
        let step_name = label.unwrap_or("TEXT");

        let raw = match selection {
            None => None,
            Some(StepSelection::Text { text, value }) => {
                if let Some(label) = label
                    && !text.trim().eq_ignore_ascii_case(label)
                {
                    return Err(CoaError::StepMismatch {
                        position,
                        expected: label.to_string(),
                        actual: text.clone(),
                    });
                }
                value.as_deref()
            }
            Some(StepSelection::Positional { value }) => value.as_deref(),
            Some(StepSelection::Select { category, .. }) => {
                return Err(CoaError::StepMismatch {
                    position,
                    expected: step_name.to_string(),
                    actual: category.clone(),
                });
            }
        };

        let text = raw
            .map(|v| v.trim().to_uppercase())
            .filter(|v| !v.is_empty());

        match text {
            None if required => Err(CoaError::MissingValue {
                position,
                step: step_name.to_string(),
            }),
            None => Ok(None),
            Some(text) => {
                if tree.separators().any(|sep| text.contains(sep)) {
                    return Err(CoaError::InvalidText { position, text });
                }
                Ok(Some(text))
            }
        }
    }
}
