//! Resource protocol payloads read from stdin and written to stdout.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `source` block shared by every verb.
#[derive(Clone, Deserialize)]
pub struct Source {
    pub project: String,
    pub instance: String,
    /// Service-account JSON key, as a string.
    pub private_key: String,
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("project", &self.project)
            .field("instance", &self.instance)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Version identity: a backup run id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRef {
    pub backup_id: String,
}

impl VersionRef {
    pub fn new(backup_id: impl Into<String>) -> Self {
        Self {
            backup_id: backup_id.into(),
        }
    }
}

/// Name/value pair shown next to a version; order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub name: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    pub source: Source,
    #[serde(default)]
    pub version: Option<VersionRef>,
}

impl CheckRequest {
    /// The last seen version; an empty id counts as none.
    pub fn last_version(&self) -> Option<&VersionRef> {
        self.version.as_ref().filter(|v| !v.backup_id.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetRequest {
    pub source: Source,
    pub version: VersionRef,
}

/// `out` takes no parameters; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PutParams {}

#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    pub source: Source,
    #[serde(default)]
    pub params: Option<PutParams>,
}

/// Output of `in` and `out`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: VersionRef,
    pub metadata: Vec<MetadataEntry>,
}

impl VersionResponse {
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value.as_str())
    }
}
