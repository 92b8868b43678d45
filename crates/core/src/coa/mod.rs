//! Chart-of-accounts rule engine.
//!
//! A rule tree is rooted at a type (and optionally a group under that type)
//! and holds an ordered list of steps. Walking the steps with a caller's
//! selections yields the canonical account code.
//!
//! # Modules
//!
//! - `tree` - Rule tree model and step-list validation
//! - `builder` - Code assembly from a selection walk
//! - `error` - Rule engine error types

pub mod builder;
pub mod error;
pub mod tree;

#[cfg(test)]
mod builder_props;

pub use builder::{CodeBuilder, StepSelection};
pub use error::CoaError;
pub use tree::{
    RuleTree, Segment, StepDefinition, StepKind, TreeKey, TreeStep, validate_step_definitions,
};
