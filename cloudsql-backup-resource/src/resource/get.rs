//! `in`: wait for one backup run to succeed and materialize it.

use super::OUTPUT_FILE;
use crate::models::timezone::format_rfc3339;
use crate::models::BackupRun;
use crate::poller::BackupPoller;
use crate::protocol::{GetRequest, MetadataEntry, VersionRef, VersionResponse};
use crate::utils::{ResourceError, Result};
use chrono::FixedOffset;
use std::path::Path;
use tracing::info;

/// Poll the requested run to success, write it to `<dest>/output.json`, and
/// describe it. Nothing is written unless the run succeeded.
pub async fn get(
    poller: &BackupPoller<'_>,
    request: &GetRequest,
    dest: &Path,
    offset: &FixedOffset,
) -> Result<VersionResponse> {
    let source = &request.source;
    if request.version.backup_id.trim().is_empty() {
        return Err(ResourceError::InvalidInput(
            "version.backup_id must not be empty".into(),
        ));
    }

    let mut run = poller
        .wait_for_success(&source.project, &source.instance, &request.version.backup_id)
        .await?;
    run.normalize_times(offset);

    tokio::fs::create_dir_all(dest).await?;
    let path = dest.join(OUTPUT_FILE);
    tokio::fs::write(&path, serde_json::to_string_pretty(&run)?).await?;
    info!("Wrote backup run {} to {}", run.id, path.display());

    Ok(describe(&run))
}

fn describe(run: &BackupRun) -> VersionResponse {
    VersionResponse {
        version: VersionRef::new(run.id.clone()),
        metadata: vec![
            MetadataEntry::new("kind", run.category()),
            MetadataEntry::new("status", run.status.clone()),
            MetadataEntry::new("end-time", format_rfc3339(run.completed_at())),
            MetadataEntry::new("instance", run.instance.clone()),
        ],
    }
}
