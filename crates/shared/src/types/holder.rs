//! Caller identity.
//!
//! A holder is either a user or a role. It replaces the "model type string +
//! id" pair with a tagged variant, and is persisted in its text form
//! (`user:<uuid>` / `role:<uuid>`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Resolved identity acting on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Holder {
    /// An individual user.
    User(Uuid),
    /// A role acting on behalf of the system (scheduled jobs, integrations).
    Role(Uuid),
}

impl Holder {
    /// Returns the holder's id regardless of its kind.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::User(id) | Self::Role(id) => *id,
        }
    }

    /// Returns the kind tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Role(_) => "role",
        }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Error returned when a holder string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HolderParseError {
    /// Missing `kind:id` separator.
    #[error("Holder must look like 'kind:id', got '{0}'")]
    Malformed(String),

    /// Unknown kind tag.
    #[error("Unknown holder kind '{0}'")]
    UnknownKind(String),

    /// Id is not a UUID.
    #[error("Invalid holder id: {0}")]
    InvalidId(String),
}

impl FromStr for Holder {
    type Err = HolderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| HolderParseError::Malformed(s.to_string()))?;
        let id = Uuid::parse_str(id).map_err(|e| HolderParseError::InvalidId(e.to_string()))?;

        match kind {
            "user" => Ok(Self::User(id)),
            "role" => Ok(Self::Role(id)),
            other => Err(HolderParseError::UnknownKind(other.to_string())),
        }
    }
}
