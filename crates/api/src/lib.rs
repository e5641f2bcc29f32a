//! Request/response types for the training backend HTTP contract.
//!
//! Every JSON response carries a `status` envelope (`"success"` or an error
//! string) plus an optional `message`. The envelope is authoritative even
//! when the HTTP status is not 2xx.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use trainerdeck_core::settings::{PathKind, SettingValue};

/// Task id the editor uses for a configuration that does not exist yet.
pub const NEW_TASK_ID: &str = "__NEW__";

pub const STATUS_SUCCESS: &str = "success";

// ─── Envelope ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Text to surface for a backend-reported failure.
    pub fn failure_message(&self) -> String {
        match (&self.message, self.status.as_str()) {
            (Some(message), _) if !message.is_empty() => message.clone(),
            (_, "") => "unknown error".to_string(),
            (_, status) => status.to_string(),
        }
    }
}

/// Plain command acknowledgement (`stop_task`, `execute_task`, ...).
pub type CommandResponse = Envelope;

// ─── Jobs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecuteAction {
    Cache,
    Train,
}

impl ExecuteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Train => "train",
        }
    }
}

impl std::fmt::Display for ExecuteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecuteAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cache" => Ok(Self::Cache),
            "train" => Ok(Self::Train),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

/// Query of `GET /execute_task`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteQuery {
    pub task: String,
    pub action: ExecuteAction,
}

/// Query of the per-task `GET` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskQuery {
    pub task: String,
}

/// Returned by `GET /task_status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub is_running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskListResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// `POST /create_task`: clone an existing task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneTaskRequest {
    pub source_task_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloneTaskResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTaskRequest {
    pub task_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleInputRequest {
    pub cmd: String,
}

// ─── Editor ──────────────────────────────────────────────────────────────────

/// Returned by `GET /load_task`: flat dotted settings of one task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadTaskResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Returned by `GET /get_json_config`: the persisted nested document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonConfigResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `POST /save`: flat settings plus the full nested document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub task_name: String,
    pub yaml_updates: BTreeMap<String, SettingValue>,
    pub json_data: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(flatten)]
    pub envelope: Envelope,
    /// Set when the save renamed or created the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_task_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectPathRequest {
    #[serde(rename = "type")]
    pub kind: PathKind,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectPathResponse {
    #[serde(default)]
    pub path: Option<String>,
}

impl SelectPathResponse {
    /// The chosen path; an empty path means the dialog was cancelled.
    pub fn picked(&self) -> Option<&str> {
        self.path.as_deref().filter(|path| !path.is_empty())
    }
}
