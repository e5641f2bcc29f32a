mod config;
mod editor_cmd;
mod jobs;
mod output;

use clap::{Parser, Subcommand};
use trainerdeck_api::ExecuteAction;

use crate::config::ConfigUpdate;
use crate::editor_cmd::EditorAction;
use crate::jobs::Deck;

#[derive(Parser)]
#[command(name = "trainerdeck", about = "trainerdeck - run, tail and configure training jobs")]
struct Cli {
    /// Backend URL for this invocation (overrides config and environment)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks known to the backend
    List,

    /// Clone a task under a new backend-chosen name
    Clone { source: String },

    /// Delete a task
    Delete {
        task: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show whether a job is running
    Status,

    /// Start caching or training for a task, then tail its output
    Run {
        task: String,
        #[arg(long, value_parser = parse_action, default_value = "train")]
        action: ExecuteAction,
        /// Return as soon as the backend accepts the job
        #[arg(long)]
        detach: bool,
    },

    /// Stop the running job
    Stop {
        #[arg(long)]
        yes: bool,
    },

    /// Tail the live log stream until Ctrl-C
    Tail,

    /// Tail the log stream and forward stdin lines to the job console
    Console { task: String },

    /// Send one line to the job console
    Input { task: String, text: String },

    /// Inspect or edit a task's configuration
    Editor {
        #[command(subcommand)]
        action: EditorAction,
    },

    /// Show or set configuration
    Config {
        /// Set the backend URL
        #[arg(long = "set-server")]
        set_server: Option<String>,

        /// Set the command timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Set the pause after a failed stream connection
        #[arg(long)]
        reconnect_delay_ms: Option<u64>,

        /// Set the pause after the stream closes
        #[arg(long)]
        reopen_delay_ms: Option<u64>,

        /// Set the profile used when a task names none
        #[arg(long)]
        default_profile: Option<String>,
    },
}

fn parse_action(raw: &str) -> Result<ExecuteAction, String> {
    raw.parse()
        .map_err(|_| format!("unknown action {raw:?} (expected cache or train)"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let command = match cli.command {
        Commands::Config {
            set_server,
            timeout_secs,
            reconnect_delay_ms,
            reopen_delay_ms,
            default_profile,
        } => {
            let update = ConfigUpdate {
                server: set_server,
                timeout_secs,
                reconnect_delay_ms,
                reopen_delay_ms,
                default_profile,
            };
            return if update.is_empty() {
                config::show_config()
            } else {
                config::set_config(update)
            };
        }
        other => other,
    };

    let mut settings = config::load_config()?;
    if let Some(url) = cli.server {
        settings.server.url = url;
    }
    let deck = Deck::connect(&settings)?;

    match command {
        Commands::List => jobs::list(&deck).await,
        Commands::Clone { source } => jobs::clone_task(&deck, &source).await,
        Commands::Delete { task, yes } => jobs::delete_task(&deck, &task, yes).await,
        Commands::Status => jobs::status(&deck).await,
        Commands::Run {
            task,
            action,
            detach,
        } => jobs::run(&deck, &task, action, detach).await,
        Commands::Stop { yes } => jobs::stop(&deck, yes).await,
        Commands::Tail => jobs::tail(&deck).await,
        Commands::Console { task } => jobs::console(&deck, &task).await,
        Commands::Input { task, text } => jobs::input(&deck, &task, &text).await,
        Commands::Editor { action } => editor_cmd::run(action, &deck, &settings).await,
        Commands::Config { .. } => Ok(()),
    }
}
