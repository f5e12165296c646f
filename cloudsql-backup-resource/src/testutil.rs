//! Helpers shared by the unit tests.

use crate::client::BackupService;
use crate::models::{BackupOperation, BackupRun};
use crate::utils::{ResourceError, Result};
use async_trait::async_trait;
use axum::Router;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// In-memory [`BackupService`] with a scripted status sequence for `get`.
#[derive(Default)]
pub struct FakeBackupService {
    pub runs: Vec<BackupRun>,
    pub statuses: Mutex<VecDeque<String>>,
    pub end_time: Option<String>,
    pub operation: BackupOperation,
    pub gets: AtomicUsize,
    pub lists: AtomicUsize,
    pub creates: AtomicUsize,
}

impl FakeBackupService {
    pub fn with_runs(runs: Vec<BackupRun>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    pub fn with_statuses(statuses: &[&str]) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackupService for FakeBackupService {
    async fn list_backup_runs(&self, _project: &str, _instance: &str) -> Result<Vec<BackupRun>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self.runs.clone())
    }

    async fn get_backup_run(&self, _project: &str, instance: &str, id: &str) -> Result<BackupRun> {
        self.gets.fetch_add(1, Ordering::SeqCst);

        if let Some(run) = self.runs.iter().find(|r| r.id == id) {
            return Ok(run.clone());
        }

        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ResourceError::NotFound(id.to_string()))?;
        let mut value = serde_json::json!({
            "kind": "sql#backupRun",
            "id": id,
            "status": status,
            "instance": instance,
            "backupKind": "SNAPSHOT",
        });
        if let Some(end) = &self.end_time {
            value["endTime"] = serde_json::json!(end);
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn create_backup_run(&self, _project: &str, _instance: &str) -> Result<BackupOperation> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(self.operation.clone())
    }
}
