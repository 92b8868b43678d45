//! Maker-checker workflow for chart-of-accounts changes.
//!
//! Accounts are never written directly: a maker submits a CREATE or EDIT
//! request and a different checker approves or rejects it.
//!
//! # Modules
//!
//! - `types` - Request kinds, statuses and workflow actions
//! - `payload` - Request payload documents
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic

pub mod error;
pub mod payload;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use payload::{AccountFields, CreateAccountPayload, EditAccountPayload, decode_stored};
pub use service::WorkflowService;
pub use types::{AccountStatus, RequestStatus, RequestType, WorkflowAction};
