//! `check`: discover backup versions, oldest first.

use crate::client::BackupService;
use crate::config::CheckMode;
use crate::models::sort_by_recency;
use crate::protocol::{CheckRequest, VersionRef};
use crate::utils::Result;
use tracing::{debug, info};

/// Ordered versions for the source's instance; the last element is the newest.
pub async fn check(
    service: &dyn BackupService,
    request: &CheckRequest,
    mode: CheckMode,
) -> Result<Vec<VersionRef>> {
    let source = &request.source;

    if let (Some(last), CheckMode::All) = (request.last_version(), mode) {
        // Confirms the version still exists; the listing below is what gets reported.
        let run = service
            .get_backup_run(&source.project, &source.instance, &last.backup_id)
            .await?;
        debug!("Last seen backup {} is {}", run.id, run.status);
    }

    let mut runs = service
        .list_backup_runs(&source.project, &source.instance)
        .await?;
    sort_by_recency(&mut runs);
    let ordered: Vec<VersionRef> = runs.into_iter().map(|r| VersionRef::new(r.id)).collect();

    let versions = match (request.last_version(), mode) {
        (Some(last), CheckMode::Since) => since(ordered, last),
        _ => ordered,
    };

    info!(
        "Found {} version(s) for {}/{}",
        versions.len(),
        source.project,
        source.instance
    );
    Ok(versions)
}

/// `last` and everything after it; just the newest when `last` is gone.
fn since(mut ordered: Vec<VersionRef>, last: &VersionRef) -> Vec<VersionRef> {
    match ordered.iter().position(|v| v == last) {
        Some(index) => ordered.split_off(index),
        None => {
            debug!("Version {} no longer listed, reporting newest only", last.backup_id);
            ordered.pop().into_iter().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::backup_run::tests::run;
    use crate::protocol::Source;
    use crate::testutil::FakeBackupService;

    fn request(version: Option<&str>) -> CheckRequest {
        CheckRequest {
            source: Source {
                project: "p".into(),
                instance: "db".into(),
                private_key: "{}".into(),
            },
            version: version.map(VersionRef::new),
        }
    }

    fn service() -> FakeBackupService {
        FakeBackupService::with_runs(vec![
            run("c", "SUCCESSFUL", Some("2024-01-03T00:00:00Z")),
            run("a", "SUCCESSFUL", Some("2024-01-01T00:00:00Z")),
            run("live", "RUNNING", None),
            run("b", "SUCCESSFUL", Some("2024-01-02T00:00:00Z")),
        ])
    }

    fn ids(versions: &[VersionRef]) -> Vec<&str> {
        versions.iter().map(|v| v.backup_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_without_version_lists_all_ordered() {
        let service = service();
        let versions = check(&service, &request(None), CheckMode::Since).await.unwrap();
        assert_eq!(ids(&versions), ["live", "a", "b", "c"]);
        assert_eq!(service.gets(), 0);
    }

    #[tokio::test]
    async fn test_repeatable() {
        let service = service();
        let first = check(&service, &request(None), CheckMode::Since).await.unwrap();
        let second = check(&service, &request(None), CheckMode::Since).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_version_id_counts_as_none() {
        let service = service();
        let versions = check(&service, &request(Some("")), CheckMode::All).await.unwrap();
        assert_eq!(versions.len(), 4);
        assert_eq!(service.gets(), 0);
    }

    #[tokio::test]
    async fn test_since_returns_given_and_newer() {
        let service = service();
        let versions = check(&service, &request(Some("b")), CheckMode::Since).await.unwrap();
        assert_eq!(ids(&versions), ["b", "c"]);
    }

    #[tokio::test]
    async fn test_since_latest_is_stable() {
        let service = service();
        let versions = check(&service, &request(Some("c")), CheckMode::Since).await.unwrap();
        assert_eq!(ids(&versions), ["c"]);
    }

    #[tokio::test]
    async fn test_since_unknown_version_reports_newest() {
        let service = service();
        let versions = check(&service, &request(Some("expired")), CheckMode::Since)
            .await
            .unwrap();
        assert_eq!(ids(&versions), ["c"]);
    }

    #[tokio::test]
    async fn test_since_empty_listing() {
        let service = FakeBackupService::default();
        let versions = check(&service, &request(Some("x")), CheckMode::Since).await.unwrap();
        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn test_all_mode_fetches_then_lists_everything() {
        let service = service();
        let versions = check(&service, &request(Some("b")), CheckMode::All).await.unwrap();
        assert_eq!(ids(&versions), ["live", "a", "b", "c"]);
        assert_eq!(service.gets(), 1);
        assert_eq!(service.lists(), 1);
    }

    #[tokio::test]
    async fn test_default_mode_reports_full_list() {
        let service = service();
        let mode = crate::config::Config::default().check.mode;

        let versions = check(&service, &request(Some("b")), mode).await.unwrap();

        assert_eq!(ids(&versions), ["live", "a", "b", "c"]);
        assert_eq!(service.gets(), 1);
    }

    #[tokio::test]
    async fn test_all_mode_missing_version_fails() {
        let service = service();
        let result = check(&service, &request(Some("expired")), CheckMode::All).await;
        assert!(result.is_err());
        assert_eq!(service.lists(), 0);
    }
}
