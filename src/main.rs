use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use stickerboard::config::{Config, ConfigError};
use stickerboard::gateway::http::HttpGateway;
use stickerboard::gateway::memory::MemoryGateway;
use stickerboard::gateway::{GatewayError, SyncGateway};
use stickerboard::input::InputEvent;
use stickerboard::permission::BoardRole;
use stickerboard::session::{BoardSession, SessionError};

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to read script {path}: {source}")]
    ReadScript { path: String, source: io::Error },
    #[error("invalid script event on line {line}: {source}")]
    ScriptEvent { line: usize, source: serde_json::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "stickerboard", about = "Sticker board session CLI")]
struct Cli {
    /// Board API base URL (overrides the environment config).
    #[arg(long, env = "STICKERBOARD_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "STICKERBOARD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Persist drag/resize on every pointer-move, not only on release.
    #[arg(long, default_value_t = false)]
    stream_motion: bool,

    /// Run against an empty in-memory board instead of the board API.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Role on the in-memory board (only with --offline).
    #[arg(long, default_value = "creator")]
    role: BoardRole,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a board and print it.
    Show { board_id: String },
    /// Load a board, apply scripted input events, wait for persistence, print the result.
    Replay {
        board_id: String,
        #[arg(long, default_value = "-", help = "JSONL script path, or - for stdin")]
        script: String,
    },
}

impl Command {
    fn board_id(&self) -> &str {
        match self {
            Self::Show { board_id } | Self::Replay { board_id, .. } => board_id,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }
    if cli.token.is_some() {
        config.token = cli.token;
    }
    config.stream_motion |= cli.stream_motion;

    let board_id = cli.command.board_id().to_string();
    let gateway: Arc<dyn SyncGateway> = if cli.offline {
        info!(%board_id, role = cli.role.as_str(), "using in-memory board");
        Arc::new(MemoryGateway::new(board_id.as_str(), "Offline board", cli.role))
    } else {
        info!(api_url = %config.api_url, "using board API");
        Arc::new(HttpGateway::from_config(&config)?)
    };

    let mut session = BoardSession::open(gateway, &board_id, config.stream_motion).await?;

    match cli.command {
        Command::Show { .. } => {}
        Command::Replay { script, .. } => {
            let events = read_script(&script)?;
            let count = events.len();
            for event in events {
                session.dispatch(event);
                session.poll_completions();
            }
            session.settle().await;
            info!(events = count, failures = session.persistence_failures(), "replay finished");
        }
    }

    print_json(&session.view())
}

fn read_script(path: &str) -> Result<Vec<InputEvent>, CliError> {
    let reader: Box<dyn BufRead> = if path == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(path).map_err(|source| CliError::ReadScript { path: path.to_owned(), source })?;
        Box::new(BufReader::new(file))
    };

    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| CliError::ReadScript { path: path.to_owned(), source })?;
        if let Some(event) = parse_script_line(index + 1, &line)? {
            events.push(event);
        }
    }
    Ok(events)
}

/// One event per line. Blank lines and `#` comments are skipped.
fn parse_script_line(line_no: usize, line: &str) -> Result<Option<InputEvent>, CliError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| CliError::ScriptEvent { line: line_no, source })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
