//! Job management and live console commands.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use trainerdeck_api::{CloneTaskRequest, DeleteTaskRequest, ExecuteAction};
use trainerdeck_api_client::ApiClient;
use trainerdeck_console::{
    AssumeYes, Confirm, ExecuteOutcome, StopOutcome, StreamSession, StreamTiming, TaskController,
};
use trainerdeck_core::console::ConsoleSink;
use trainerdeck_runtime_config::DeckConfig;

use crate::output::{StdoutSink, TerminalConfirm};

/// Client, tail session and stdout sink for one invocation.
pub struct Deck {
    pub api: ApiClient,
    pub session: Arc<StreamSession<ApiClient>>,
    pub sink: Arc<dyn ConsoleSink>,
}

impl Deck {
    pub fn connect(config: &DeckConfig) -> Result<Self> {
        let api = ApiClient::new(&config.server.url, config.server.timeout())
            .with_context(|| format!("Failed to build client for {}", config.server.url))?;
        let sink: Arc<dyn ConsoleSink> = Arc::new(StdoutSink);
        let session = StreamSession::new(
            Arc::new(api.clone()),
            Arc::clone(&sink),
            StreamTiming::from(&config.stream),
        );
        Ok(Self {
            api,
            session: Arc::new(session),
            sink,
        })
    }

    fn controller(&self, job: &str) -> TaskController<ApiClient> {
        TaskController::new(
            self.api.clone(),
            job,
            Arc::clone(&self.session),
            Arc::clone(&self.sink),
        )
    }
}

fn confirmer(yes: bool) -> &'static dyn Confirm {
    if yes { &AssumeYes } else { &TerminalConfirm }
}

pub async fn list(deck: &Deck) -> Result<()> {
    let resp = deck.api.get_tasks().await.context("Failed to list tasks")?;
    if !resp.envelope.is_success() {
        bail!("{}", resp.envelope.failure_message());
    }
    if resp.tasks.is_empty() {
        println!("No tasks.");
    }
    for task in resp.tasks {
        println!("{task}");
    }
    Ok(())
}

pub async fn clone_task(deck: &Deck, source: &str) -> Result<()> {
    let req = CloneTaskRequest {
        source_task_name: source.to_string(),
    };
    let resp = deck
        .api
        .create_task(&req)
        .await
        .with_context(|| format!("Failed to clone {source}"))?;
    if !resp.envelope.is_success() {
        bail!("{}", resp.envelope.failure_message());
    }
    match resp.task_name {
        Some(name) => println!("Created {name}"),
        None => println!("Created copy of {source}"),
    }
    Ok(())
}

pub async fn delete_task(deck: &Deck, task: &str, yes: bool) -> Result<()> {
    if !confirmer(yes).confirm(&format!("DELETE TASK [{task}]?")) {
        println!("Cancelled.");
        return Ok(());
    }
    let req = DeleteTaskRequest {
        task_name: task.to_string(),
    };
    let resp = deck
        .api
        .delete_task(&req)
        .await
        .with_context(|| format!("Failed to delete {task}"))?;
    if !resp.is_success() {
        bail!("{}", resp.failure_message());
    }
    println!("Deleted {task}");
    Ok(())
}

pub async fn status(deck: &Deck) -> Result<()> {
    let status = deck
        .api
        .task_status()
        .await
        .context("Failed to query task status")?;
    if !status.is_running {
        println!("idle");
        return Ok(());
    }
    let task = status.task.as_deref().unwrap_or("?");
    match status.action.as_deref() {
        Some(action) => println!("running: {task} ({action})"),
        None => println!("running: {task}"),
    }
    Ok(())
}

pub async fn run(deck: &Deck, task: &str, action: ExecuteAction, detach: bool) -> Result<()> {
    let controller = deck.controller(task);
    match controller.execute(action).await {
        ExecuteOutcome::Started(_) if detach => {
            deck.session.stop();
            Ok(())
        }
        ExecuteOutcome::Started(_) => follow(deck).await,
        ExecuteOutcome::Rejected(message) => bail!("start rejected: {message}"),
        ExecuteOutcome::Unreachable(message) => bail!("backend unreachable: {message}"),
    }
}

pub async fn stop(deck: &Deck, yes: bool) -> Result<()> {
    let job = deck
        .api
        .task_status()
        .await
        .ok()
        .and_then(|status| status.task)
        .unwrap_or_default();
    let controller = deck.controller(&job);
    match controller.stop(confirmer(yes)).await {
        StopOutcome::Cancelled => println!("Cancelled."),
        StopOutcome::Stopped => println!("Stop requested."),
        StopOutcome::Failed(message) => bail!("{message}"),
    }
    Ok(())
}

/// Tail the log stream until interrupted.
pub async fn tail(deck: &Deck) -> Result<()> {
    let _tail = deck.session.start();
    follow(deck).await
}

/// Tail the stream and forward each stdin line as console input.
pub async fn console(deck: &Deck, task: &str) -> Result<()> {
    let controller = deck.controller(task);
    let _tail = deck.session.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("Failed to read stdin")? {
                Some(line) => {
                    controller.send_input(&line).await;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                deck.session.stop();
                return Ok(());
            }
        }
    }
    follow(deck).await
}

pub async fn input(deck: &Deck, task: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("nothing to send");
    }
    if !deck.controller(task).send_input(text).await {
        bail!("console input was not delivered");
    }
    Ok(())
}

async fn follow(deck: &Deck) -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt")?;
    deck.session.stop();
    Ok(())
}
