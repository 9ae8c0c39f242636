//! Stored-secret normalization.
//!
//! Database drivers disagree on how an empty secret column comes back: SQL
//! NULL, empty string, or a non-null empty blob object (serialized as
//! `{"type":"Buffer","data":[]}` by some stacks). Downstream logic must never
//! re-derive those nullness rules, so the boundary coerces everything into a
//! tagged union: a credential string is either present or absent, nothing
//! in between.
//!
//! # Design Decisions
//! - Normalization never fails; unrecognized shapes degrade to `Absent`
//! - Idempotent: normalizing twice equals normalizing once
//! - Only the normalizer knows the driver artifacts; consumers pattern-match

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::record::HostRecord;

/// A stored credential field after boundary normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoredSecret {
    /// A non-empty credential string as stored.
    Present(String),
    /// No secret. Covers NULL, empty string, and driver blob artifacts.
    #[default]
    Absent,
}

impl StoredSecret {
    /// Build from whatever JSON shape the storage layer produced.
    pub fn from_stored_value(value: &Value) -> Self {
        match value {
            Value::String(s) if !s.trim().is_empty() => StoredSecret::Present(s.clone()),
            Value::Null | Value::String(_) => StoredSecret::Absent,
            other => {
                // Blob artifacts arrive as objects; anything else is garbage.
                tracing::warn!(shape = %value_kind(other), "coercing unrecognized secret shape to absent");
                StoredSecret::Absent
            }
        }
    }

    /// Re-apply the presence rules to an already-typed value. Used by the
    /// host-set normalization pass; `Present("")` collapses to `Absent`.
    pub fn normalized(&self) -> Self {
        match self {
            StoredSecret::Present(s) if s.trim().is_empty() => StoredSecret::Absent,
            other => other.clone(),
        }
    }

    /// True when this secret is a hash the document builder may emit as a
    /// basic-auth account: non-empty and carrying a bcrypt format tag.
    pub fn is_usable_hash(&self) -> bool {
        match self {
            StoredSecret::Present(s) => is_bcrypt_hash(s),
            StoredSecret::Absent => false,
        }
    }

    /// The credential string, when present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredSecret::Present(s) => Some(s),
            StoredSecret::Absent => None,
        }
    }
}

/// Recognize a bcrypt-tagged hash string (`$2a$`, `$2b$`, `$2y$`).
pub fn is_bcrypt_hash(s: &str) -> bool {
    s.starts_with("$2a$") || s.starts_with("$2b$") || s.starts_with("$2y$")
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for StoredSecret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StoredSecret::Present(s) => serializer.serialize_str(s),
            StoredSecret::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for StoredSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(StoredSecret::from_stored_value(&value))
    }
}

/// Normalize the secret fields of a full host set. Never fails.
pub fn normalize_hosts(hosts: Vec<HostRecord>) -> Vec<HostRecord> {
    hosts
        .into_iter()
        .map(|mut host| {
            host.basic_auth_password = host.basic_auth_password.normalized();
            host
        })
        .collect()
}
