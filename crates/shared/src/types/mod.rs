//! Common types used across the application.

pub mod holder;

pub use holder::{Holder, HolderParseError};
