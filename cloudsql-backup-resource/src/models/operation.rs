//! Acknowledgement returned when a backup run is created.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// The `sql#operation` returned by `backupRuns.insert`.
///
/// This is not the backup itself: the run it will produce is named by
/// `backup_context.backup_id`, which can be empty until the service assigns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupOperation {
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub target_link: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub insert_time: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub operation_type: String,

    /// Operation id; the API calls it `name`.
    #[serde(rename = "name", default)]
    pub operation_id: String,

    /// Instance the operation targets.
    #[serde(default)]
    pub target_id: String,

    #[serde(default)]
    pub self_link: String,

    #[serde(default)]
    pub target_project: String,

    #[serde(default)]
    pub backup_context: BackupContext,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupContext {
    #[serde(default)]
    pub backup_id: String,

    #[serde(default)]
    pub kind: String,
}

impl BackupOperation {
    pub fn backup_id(&self) -> &str {
        &self.backup_context.backup_id
    }
}
