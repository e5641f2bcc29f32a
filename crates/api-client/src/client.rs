use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use trainerdeck_api::*;

use crate::error::{ApiError, Result};

/// Typed HTTP client for the training backend.
///
/// Command requests use the configured timeout. The log stream is opened on
/// a separate client without one, since a tail stays open indefinitely.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    stream_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let stream_client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            stream_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            stream_client: client.clone(),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(path, "GET");
        let resp = self.client.get(self.url(path)).send().await?;
        parse_response(resp).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        debug!(path, "GET");
        let resp = self.client.get(self.url(path)).query(query).send().await?;
        parse_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        debug!(path, "POST");
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        parse_response(resp).await
    }

    // ── Jobs ──────────────────────────────────────────────────────────────

    pub async fn get_tasks(&self) -> Result<TaskListResponse> {
        self.get("/get_tasks").await
    }

    pub async fn create_task(&self, req: &CloneTaskRequest) -> Result<CloneTaskResponse> {
        self.post("/create_task", req).await
    }

    pub async fn delete_task(&self, req: &DeleteTaskRequest) -> Result<CommandResponse> {
        self.post("/delete_task", req).await
    }

    pub async fn task_status(&self) -> Result<TaskStatusResponse> {
        self.get("/task_status").await
    }

    pub async fn execute_task(&self, task: &str, action: ExecuteAction) -> Result<CommandResponse> {
        let query = ExecuteQuery {
            task: task.to_string(),
            action,
        };
        self.get_with_query("/execute_task", &query).await
    }

    pub async fn stop_task(&self) -> Result<CommandResponse> {
        debug!(path = "/stop_task", "POST");
        let resp = self.client.post(self.url("/stop_task")).send().await?;
        parse_response(resp).await
    }

    pub async fn console_input(&self, req: &ConsoleInputRequest) -> Result<CommandResponse> {
        self.post("/console_input", req).await
    }

    /// Open `GET /stream_logs`. A non-2xx answer counts as a failed open.
    pub async fn stream_logs(&self) -> Result<LogResponse> {
        debug!(path = "/stream_logs", "GET (stream)");
        let resp = self.stream_client.get(self.url("/stream_logs")).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Http { status, body });
        }
        Ok(LogResponse { inner: resp })
    }

    // ── Editor ────────────────────────────────────────────────────────────

    pub async fn load_task(&self, task: &str) -> Result<LoadTaskResponse> {
        let query = TaskQuery {
            task: task.to_string(),
        };
        self.get_with_query("/load_task", &query).await
    }

    pub async fn get_json_config(&self, task: &str) -> Result<JsonConfigResponse> {
        let query = TaskQuery {
            task: task.to_string(),
        };
        self.get_with_query("/get_json_config", &query).await
    }

    pub async fn save(&self, req: &SaveRequest) -> Result<SaveResponse> {
        self.post("/save", req).await
    }

    pub async fn select_path(&self, req: &SelectPathRequest) -> Result<SelectPathResponse> {
        self.post("/select_path", req).await
    }
}

/// An open, unframed log byte stream.
pub struct LogResponse {
    inner: reqwest::Response,
}

impl LogResponse {
    /// Next raw chunk, or `None` at end of stream.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.chunk().await?.map(|bytes| bytes.to_vec()))
    }
}

/// Parse an HTTP response body as the JSON envelope.
///
/// The backend reports failures with a JSON body and a non-2xx status, so the
/// body is decoded whatever the status. Only a non-JSON error body becomes
/// [`ApiError::Http`].
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;
    match serde_json::from_str(&body) {
        Ok(parsed) => Ok(parsed),
        Err(err) if status.is_success() => Err(ApiError::Decode(err)),
        Err(_) => Err(ApiError::Http { status, body }),
    }
}
