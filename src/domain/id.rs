//! Short hash identifiers for events, roster entries and artifacts
//!
//! ID Format:
//! - Event IDs: `e-{7-char-hash}` (e.g., `e-7f2b4c1`)
//! - Roster member IDs: `m-{7-char-hash}` (membership, not the person)
//! - Contractor IDs: `c-{7-char-hash}`
//! - Document IDs: `d-{7-char-hash}`
//! - Task IDs: `t-{7-char-hash}`
//!
//! Hash is derived from a seed (usually the title or name), the creation
//! timestamp and a process-local counter, so repeated seeds still produce
//! distinct IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid {kind} ID format: expected '{prefix}-{{7-char-hash}}', got '{value}'")]
    InvalidFormat {
        kind: &'static str,
        prefix: &'static str,
        value: String,
    },

    #[error("Invalid artifact ID: expected a 'd-' or 't-' prefix, got '{0}'")]
    UnknownArtifact(String),

    #[error("Person reference must not be empty")]
    EmptyPerson,
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a 7-character hash from seed and timestamp
fn generate_hash(seed: &str, timestamp: DateTime<Utc>) -> String {
    let bump = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let input = format!(
        "{}{}{}",
        seed,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        bump
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

fn parse_hash(s: &str, prefix: &'static str, kind: &'static str) -> Result<String, IdError> {
    let s = s.trim();
    let invalid = || IdError::InvalidFormat {
        kind,
        prefix,
        value: s.to_string(),
    };

    let hash = s
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(invalid)?;

    if hash.len() != 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    Ok(hash.to_ascii_lowercase())
}

macro_rules! hash_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            hash: String,
        }

        impl $name {
            /// Creates a new ID from a seed and timestamp
            pub fn new(seed: &str, timestamp: DateTime<Utc>) -> Self {
                Self {
                    hash: generate_hash(seed, timestamp),
                }
            }

            /// Returns the hash portion of the ID
            pub fn hash(&self) -> &str {
                &self.hash
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.hash)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self {
                    hash: parse_hash(s, $prefix, $kind)?,
                })
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

hash_id!(
    /// Event ID in the format `e-{7-char-hash}`
    EventId,
    "e",
    "event"
);

hash_id!(
    /// Roster membership ID in the format `m-{7-char-hash}`
    ///
    /// Identifies the membership row, not the person behind it.
    MemberId,
    "m",
    "member"
);

hash_id!(
    /// Contractor ID in the format `c-{7-char-hash}`
    ContractorId,
    "c",
    "contractor"
);

hash_id!(
    /// Document ID in the format `d-{7-char-hash}`
    DocumentId,
    "d",
    "document"
);

hash_id!(
    /// Task ID in the format `t-{7-char-hash}`
    TaskId,
    "t",
    "task"
);

/// Reference to a user/person managed by the external auth layer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonId(String);

impl PersonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PersonId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::EmptyPerson);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for PersonId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PersonId> for String {
    fn from(id: PersonId) -> Self {
        id.0
    }
}
