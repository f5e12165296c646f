//! Cloud SQL Admin API client for the `backupRuns` collection.

use crate::auth::Authenticator;
use crate::models::{BackupOperation, BackupRun, BackupRunList};
use crate::utils::{ResourceError, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The three backup-run calls the resource verbs depend on.
#[async_trait]
pub trait BackupService: Send + Sync {
    /// Every backup run of the instance, in the order the service returns them.
    async fn list_backup_runs(&self, project: &str, instance: &str) -> Result<Vec<BackupRun>>;

    /// Exactly the run with `id`; `NotFound` when the service has no such run.
    async fn get_backup_run(&self, project: &str, instance: &str, id: &str) -> Result<BackupRun>;

    /// Start an on-demand backup and return the operation acknowledging it.
    async fn create_backup_run(&self, project: &str, instance: &str) -> Result<BackupOperation>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// reqwest-backed [`BackupService`]. Each request fetches a fresh bearer token.
pub struct SqlAdminClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<dyn Authenticator>,
}

impl SqlAdminClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        auth: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// Build the shared HTTP client used for API and token requests.
    pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cloudsql-backup-resource/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }

    /// `{base}/projects/{project}/instances/{instance}/backupRuns[/{id}]`.
    ///
    /// Each value is one percent-encoded path segment, so `/`, `?` or `#` in an
    /// id cannot address another endpoint.
    fn runs_url(&self, project: &str, instance: &str, id: Option<&str>) -> Result<Url> {
        let parts = [
            ("project", Some(project)),
            ("instance", Some(instance)),
            ("backup id", id),
        ];
        for (name, value) in parts {
            if let Some(value) = value {
                if matches!(value.trim(), "" | "." | "..") {
                    return Err(ResourceError::InvalidInput(format!(
                        "{} '{}' is not a valid path segment",
                        name, value
                    )));
                }
            }
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ResourceError::Config(format!("invalid API base URL '{}': {}", self.base_url, e))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ResourceError::Config(format!("API base URL '{}' cannot carry a path", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(["projects", project, "instances", instance, "backupRuns"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Authorize, send and decode one request.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let token = self.auth.bearer_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("{} -> HTTP {}", what, status.as_u16());

        if status == StatusCode::NOT_FOUND {
            return Err(ResourceError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ResourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl BackupService for SqlAdminClient {
    async fn list_backup_runs(&self, project: &str, instance: &str) -> Result<Vec<BackupRun>> {
        let url = self.runs_url(project, instance, None)?;
        let mut runs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(url.clone());
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: BackupRunList = self
                .execute(request, &format!("list backup runs of {}/{}", project, instance))
                .await?;
            runs.extend(page.items);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    warn!("Backup run listing repeated page token {}, stopping", next);
                    break;
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!("Listed {} backup runs for {}/{}", runs.len(), project, instance);
        Ok(runs)
    }

    async fn get_backup_run(&self, project: &str, instance: &str, id: &str) -> Result<BackupRun> {
        let url = self.runs_url(project, instance, Some(id))?;
        self.execute(
            self.http.get(url),
            &format!("backup run {} of {}/{}", id, project, instance),
        )
        .await
    }

    async fn create_backup_run(&self, project: &str, instance: &str) -> Result<BackupOperation> {
        let url = self.runs_url(project, instance, None)?;
        self.execute(
            self.http.post(url).json(&serde_json::json!({})),
            &format!("create backup run for {}/{}", project, instance),
        )
        .await
    }
}
