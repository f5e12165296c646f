//! `out`: trigger a new backup run without waiting for it.

use crate::client::BackupService;
use crate::models::timezone::{format_rfc3339, normalize};
use crate::protocol::{MetadataEntry, PutRequest, VersionRef, VersionResponse};
use crate::utils::Result;
use chrono::FixedOffset;
use tracing::{info, warn};

pub async fn put(
    service: &dyn BackupService,
    request: &PutRequest,
    offset: &FixedOffset,
) -> Result<VersionResponse> {
    let source = &request.source;
    let operation = service
        .create_backup_run(&source.project, &source.instance)
        .await?;

    if operation.backup_id().is_empty() {
        warn!(
            "Operation {} has no backup id assigned yet",
            operation.operation_id
        );
    }
    info!(
        "Requested backup {} of {}/{} (operation {}, {})",
        operation.backup_id(),
        source.project,
        source.instance,
        operation.operation_id,
        operation.status
    );

    let insert_time = operation.insert_time.map(|t| normalize(t, offset));
    Ok(VersionResponse {
        version: VersionRef::new(operation.backup_id()),
        metadata: vec![
            MetadataEntry::new("status", operation.status.clone()),
            MetadataEntry::new("insert-time", format_rfc3339(insert_time.as_ref())),
            MetadataEntry::new("operation-id", operation.operation_id.clone()),
            MetadataEntry::new("operation-type", operation.operation_type.clone()),
            MetadataEntry::new("target-instance", operation.target_id.clone()),
        ],
    })
}
