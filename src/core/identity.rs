use super::{ControlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identity of a server node (the "consistent ID").
///
/// Survives restarts and reconnects. Two identities are equal when their
/// printable forms are equal; connection handles never take part in it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    /// Parses the printable form of a consistent ID.
    ///
    /// Surrounding whitespace is ignored. Empty text and text containing a
    /// comma are rejected because the command grammar uses commas as the
    /// list separator.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ControlError::Validation(
                "consistent ID must not be empty".to_string(),
            ));
        }
        if trimmed.contains(',') {
            return Err(ControlError::Validation(format!(
                "consistent ID '{}' must not contain ','",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generates a fresh identity for a node that has none configured.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeIdentity {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
