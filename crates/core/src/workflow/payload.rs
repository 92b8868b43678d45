//! Request payloads.
//!
//! Payloads arrive as opaque JSON documents and are stored as text on the
//! request row. They are decoded at submit time (to reject malformed input
//! early) and again at approval time.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::coa::StepSelection;
use crate::ledger::AccountType;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::AccountStatus;

/// Proposed new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountPayload {
    /// Rule type code (e.g. `ASSET`).
    pub type_code: String,
    /// Rule group code, for types with a group dimension.
    #[serde(default)]
    pub group_code: Option<String>,
    /// Step selections for the code builder.
    #[serde(default)]
    pub selections: Vec<StepSelection>,
    /// Account currency.
    pub currency: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Account type, derived from the type code when absent.
    #[serde(default)]
    pub account_type: Option<AccountType>,
    /// Parent account.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// External account number.
    #[serde(default)]
    pub account_no: Option<String>,
    /// Free description.
    #[serde(default)]
    pub description: Option<String>,
    /// Account code, filled in by the code builder at submit time.
    #[serde(default)]
    pub code: Option<String>,
}

impl CreateAccountPayload {
    /// Decodes a submitted payload.
    ///
    /// # Errors
    ///
    /// `DecodeError` if the document does not match or the currency is blank.
    pub fn decode(value: &serde_json::Value) -> Result<Self, WorkflowError> {
        let mut payload: Self = decode_value(value)?;
        payload.currency = payload.currency.trim().to_uppercase();
        if payload.currency.is_empty() {
            return Err(WorkflowError::DecodeError("currency must not be blank".to_string()));
        }
        Ok(payload)
    }

    /// Returns the explicit account type or the one named by the type code.
    ///
    /// # Errors
    ///
    /// `UnknownAccountType` if neither is usable.
    pub fn resolved_account_type(&self) -> Result<AccountType, WorkflowError> {
        match self.account_type {
            Some(account_type) => Ok(account_type),
            None => AccountType::from_code(&self.type_code)
                .ok_or_else(|| WorkflowError::UnknownAccountType(self.type_code.clone())),
        }
    }
}

/// Editable account fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFields {
    /// External account number.
    pub account_no: Option<String>,
    /// Account status.
    pub status: AccountStatus,
    /// Free description.
    pub description: Option<String>,
}

/// Proposed change to an existing account.
///
/// Only `account_no`, `status` and `description` can change; any other
/// field in the document is ignored. A missing field keeps its value, an
/// explicit `null` clears `account_no` or `description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditAccountPayload {
    /// New account number; `Some(None)` clears it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub account_no: Option<Option<String>>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
    /// New description; `Some(None)` clears it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

impl EditAccountPayload {
    /// Decodes a submitted payload.
    ///
    /// # Errors
    ///
    /// - `DecodeError` if the document does not match
    /// - `EmptyEdit` if no editable field is present
    pub fn decode(value: &serde_json::Value) -> Result<Self, WorkflowError> {
        let payload: Self = decode_value(value)?;
        if payload.is_empty() {
            return Err(WorkflowError::EmptyEdit);
        }
        Ok(payload)
    }

    /// Returns true if the payload changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.account_no.is_none() && self.status.is_none() && self.description.is_none()
    }

    /// Applies the change to the current fields.
    #[must_use]
    pub fn apply(&self, current: AccountFields) -> AccountFields {
        AccountFields {
            account_no: self.account_no.clone().unwrap_or(current.account_no),
            status: self.status.unwrap_or(current.status),
            description: self.description.clone().unwrap_or(current.description),
        }
    }
}

// Tells a present `null` apart from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Decodes a payload stored on a request row.
///
/// # Errors
///
/// `CorruptPayload` if the stored text no longer decodes.
pub fn decode_stored<T: DeserializeOwned>(text: &str) -> Result<T, WorkflowError> {
    serde_json::from_str(text).map_err(|e| WorkflowError::CorruptPayload(e.to_string()))
}

fn decode_value<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, WorkflowError> {
    T::deserialize(value).map_err(|e| WorkflowError::DecodeError(e.to_string()))
}
