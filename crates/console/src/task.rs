use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use trainerdeck_api::{ConsoleInputRequest, ExecuteAction};
use trainerdeck_api_client::ApiClient;
use trainerdeck_core::console::ConsoleSink;

use crate::stream::{GenerationToken, LogSource, StreamSession};

/// Interactive yes/no confirmation for destructive actions.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything; for `--yes` style flags.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

pub const STOP_PROMPT: &str = "STOP TASK?";

#[derive(Debug)]
pub enum ExecuteOutcome {
    /// The backend started the job and a new tail generation is running.
    Started(GenerationToken),
    /// The backend refused; the message was written to the console.
    Rejected(String),
    /// The request never got an answer; the error was written to the console.
    Unreachable(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Cancelled,
    Stopped,
    Failed(String),
}

/// Start/stop/status commands for one named job.
///
/// Command results and echoes go to the same console the stream session
/// appends to. Stopping a job does not end the tail; the backend simply
/// stops producing output.
pub struct TaskController<S> {
    api: ApiClient,
    job: String,
    session: Arc<StreamSession<S>>,
    console: Arc<dyn ConsoleSink>,
    stop_visible: AtomicBool,
}

impl<S: LogSource> TaskController<S> {
    pub fn new(
        api: ApiClient,
        job: impl Into<String>,
        session: Arc<StreamSession<S>>,
        console: Arc<dyn ConsoleSink>,
    ) -> Self {
        Self {
            api,
            job: job.into(),
            session,
            console,
            stop_visible: AtomicBool::new(false),
        }
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// Whether the stop affordance should be offered.
    pub fn stop_visible(&self) -> bool {
        self.stop_visible.load(Ordering::SeqCst)
    }

    fn surface(&self, text: &str) {
        self.console.append(text);
        self.console.scroll_to_end();
    }

    /// Poll whether a job is running. Failures are ignored and leave the
    /// stop affordance as it was.
    pub async fn status(&self) -> Option<bool> {
        match self.api.task_status().await {
            Ok(status) => {
                self.stop_visible.store(status.is_running, Ordering::SeqCst);
                Some(status.is_running)
            }
            Err(err) => {
                debug!("task status unavailable: {err}");
                None
            }
        }
    }

    pub async fn execute(&self, action: ExecuteAction) -> ExecuteOutcome {
        self.surface(&format!(
            "\n> INITIALIZING {} FOR [{}]...\n",
            action.as_str().to_uppercase(),
            self.job
        ));
        match self.api.execute_task(&self.job, action).await {
            Ok(resp) if resp.is_success() => {
                self.stop_visible.store(true, Ordering::SeqCst);
                let (token, _) = self.session.start();
                ExecuteOutcome::Started(token)
            }
            Ok(resp) => {
                let message = resp.failure_message();
                warn!(job = %self.job, "start rejected: {message}");
                self.surface(&format!("\nSTART FAILED: {message}\n"));
                ExecuteOutcome::Rejected(message)
            }
            Err(err) => {
                warn!(job = %self.job, "start request failed: {err}");
                self.surface(&format!("\nNET ERROR: {err}\n"));
                ExecuteOutcome::Unreachable(err.to_string())
            }
        }
    }

    pub async fn stop(&self, confirm: &dyn Confirm) -> StopOutcome {
        if !confirm.confirm(STOP_PROMPT) {
            return StopOutcome::Cancelled;
        }
        match self.api.stop_task().await {
            Ok(resp) if resp.is_success() => {
                self.stop_visible.store(false, Ordering::SeqCst);
                StopOutcome::Stopped
            }
            Ok(resp) => StopOutcome::Failed(resp.failure_message()),
            Err(err) => StopOutcome::Failed(err.to_string()),
        }
    }

    /// Forward a console line to the job. Blank input is ignored; the line
    /// is echoed before the request goes out.
    pub async fn send_input(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.surface(&format!("\n> {text}\n"));
        let req = ConsoleInputRequest {
            cmd: text.to_string(),
        };
        match self.api.console_input(&req).await {
            Ok(_) => true,
            Err(err) => {
                self.surface(&format!("Error: {err}\n"));
                false
            }
        }
    }
}
