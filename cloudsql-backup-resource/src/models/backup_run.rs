//! Backup run model and recency ordering.

use crate::models::timezone::normalize;
use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Statuses that resolve on their own; the poller waits on these.
pub const TRANSIENT_STATUSES: &[&str] = &["ENQUEUED", "RUNNING", "PENDING"];

pub const SUCCESS_STATUS: &str = "SUCCESSFUL";

/// Where a run stands from the poller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Transient,
    Succeeded,
    /// Failed, cancelled, deleted or a status this resource does not know.
    Fatal,
}

impl RunPhase {
    pub fn classify(status: &str) -> Self {
        if status == SUCCESS_STATUS {
            RunPhase::Succeeded
        } else if TRANSIENT_STATUSES.contains(&status) {
            RunPhase::Transient
        } else {
            RunPhase::Fatal
        }
    }
}

/// One backup execution as reported by the Cloud SQL Admin API.
///
/// Fields the resource does not interpret are kept in `extra` so the record
/// persisted by `in` is the complete API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRun {
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enqueued_time: Option<DateTime<FixedOffset>>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub run_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start_time: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub instance: String,

    #[serde(default)]
    pub self_link: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub backup_kind: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BackupRun {
    pub fn phase(&self) -> RunPhase {
        RunPhase::classify(&self.status)
    }

    /// Completion instant, treating the zero instant (year 1) as absent.
    pub fn completed_at(&self) -> Option<&DateTime<FixedOffset>> {
        self.end_time.as_ref().filter(|t| t.year() > 1)
    }

    /// Category label reported as `kind` metadata.
    pub fn category(&self) -> &str {
        if !self.backup_kind.is_empty() {
            &self.backup_kind
        } else {
            &self.run_type
        }
    }

    /// Re-express every instant of the run in `offset`.
    pub fn normalize_times(&mut self, offset: &FixedOffset) {
        for time in [
            &mut self.enqueued_time,
            &mut self.start_time,
            &mut self.end_time,
            &mut self.window_start_time,
        ] {
            if let Some(t) = time.take() {
                *time = Some(normalize(t, offset));
            }
        }
    }
}

/// One page of `backupRuns.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRunList {
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub items: Vec<BackupRun>,

    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Order runs oldest first by completion time.
///
/// Runs that have not completed sort before every completed run, so the last
/// element is always the newest finished backup. The sort is stable: runs with
/// equal keys keep their input order.
pub fn sort_by_recency(runs: &mut [BackupRun]) {
    runs.sort_by(|a, b| a.completed_at().cmp(&b.completed_at()));
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn run(id: &str, status: &str, end_time: Option<&str>) -> BackupRun {
        let mut value = json!({
            "kind": "sql#backupRun",
            "status": status,
            "id": id,
            "instance": "main-db",
            "selfLink": format!("https://sqladmin.googleapis.com/v1/projects/p/instances/main-db/backupRuns/{}", id),
            "backupKind": "SNAPSHOT",
            "type": "ON_DEMAND",
        });
        if let Some(end) = end_time {
            value["endTime"] = json!(end);
        }
        serde_json::from_value(value).unwrap()
    }

    fn ids(runs: &[BackupRun]) -> Vec<&str> {
        runs.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_classify() {
        assert_eq!(RunPhase::classify("ENQUEUED"), RunPhase::Transient);
        assert_eq!(RunPhase::classify("RUNNING"), RunPhase::Transient);
        assert_eq!(RunPhase::classify("PENDING"), RunPhase::Transient);
        assert_eq!(RunPhase::classify("SUCCESSFUL"), RunPhase::Succeeded);
        assert_eq!(RunPhase::classify("FAILED"), RunPhase::Fatal);
        assert_eq!(RunPhase::classify("CANCELLED"), RunPhase::Fatal);
        assert_eq!(RunPhase::classify("successful"), RunPhase::Fatal);
        assert_eq!(RunPhase::classify(""), RunPhase::Fatal);
    }

    #[test]
    fn test_sort_oldest_first() {
        let mut runs = vec![
            run("3", "SUCCESSFUL", Some("2024-01-03T00:00:00Z")),
            run("1", "SUCCESSFUL", Some("2024-01-01T00:00:00Z")),
            run("2", "SUCCESSFUL", Some("2024-01-02T00:00:00+08:00")),
        ];
        sort_by_recency(&mut runs);
        assert_eq!(ids(&runs), ["1", "2", "3"]);
    }

    #[test]
    fn test_sort_compares_instants_across_offsets() {
        // 2024-01-01T10:00+08:00 is 02:00Z, earlier than 03:00Z
        let mut runs = vec![
            run("later", "SUCCESSFUL", Some("2024-01-01T03:00:00Z")),
            run("earlier", "SUCCESSFUL", Some("2024-01-01T10:00:00+08:00")),
        ];
        sort_by_recency(&mut runs);
        assert_eq!(ids(&runs), ["earlier", "later"]);
    }

    #[test]
    fn test_unfinished_runs_sort_first() {
        let mut runs = vec![
            run("done", "SUCCESSFUL", Some("2024-01-01T00:00:00Z")),
            run("running", "RUNNING", None),
            run("zero", "ENQUEUED", Some("0001-01-01T00:00:00Z")),
        ];
        sort_by_recency(&mut runs);
        assert_eq!(ids(&runs), ["running", "zero", "done"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let same = Some("2024-02-01T00:00:00Z");
        let mut runs = vec![
            run("b", "SUCCESSFUL", same),
            run("a", "SUCCESSFUL", same),
            run("x", "RUNNING", None),
            run("c", "SUCCESSFUL", same),
            run("y", "RUNNING", None),
        ];
        sort_by_recency(&mut runs);
        assert_eq!(ids(&runs), ["x", "y", "b", "a", "c"]);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "id": "42",
            "status": "FAILED",
            "error": { "kind": "sql#operationError", "code": "BACKUP_FAILED" },
            "diskEncryptionStatus": { "kmsKeyVersionName": "v1" }
        });
        let parsed: BackupRun = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed.extra["error"]["code"], "BACKUP_FAILED");

        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["error"], raw["error"]);
        assert_eq!(back["diskEncryptionStatus"], raw["diskEncryptionStatus"]);
    }

    #[test]
    fn test_normalize_times() {
        let mut r = run("1", "SUCCESSFUL", Some("2024-01-01T04:00:00Z"));
        r.start_time = Some(DateTime::parse_from_rfc3339("2024-01-01T03:55:00Z").unwrap());
        r.normalize_times(&FixedOffset::east_opt(8 * 3600).unwrap());

        let end = r.end_time.unwrap();
        assert_eq!(end.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(end.to_rfc3339(), "2024-01-01T12:00:00+08:00");
        assert_eq!(r.start_time.unwrap().to_rfc3339(), "2024-01-01T11:55:00+08:00");
        assert!(r.enqueued_time.is_none());
    }

    #[test]
    fn test_category_falls_back_to_type() {
        let mut r = run("1", "SUCCESSFUL", None);
        assert_eq!(r.category(), "SNAPSHOT");
        r.backup_kind.clear();
        assert_eq!(r.category(), "ON_DEMAND");
    }
}
