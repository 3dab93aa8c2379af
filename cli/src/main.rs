use clap::{Parser, Subcommand};
use client::{CollabClient, CollabConfig, SessionEvent, SessionState, endpoint_url};
use protocol::{CursorPosition, SelectionRange};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing token; pass --token or set COLLAB_TOKEN")]
    MissingToken,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("health check failed: HTTP {0}")]
    Unhealthy(u16),
    #[error(transparent)]
    Client(#[from] client::ClientError),
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "collab-cli", about = "IDE collaboration room CLI")]
struct Cli {
    #[arg(long, env = "COLLAB_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "COLLAB_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server is up.
    Ping,
    /// Print the websocket endpoint for a project.
    Url { project_id: String },
    /// Join a project room; stdin lines are sent as chat.
    Join {
        project_id: String,
        /// File reported with cursor and selection updates.
        #[arg(long)]
        file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Ping => run_ping(&cli.base_url).await,
        Command::Url { project_id } => {
            let token = cli.token.ok_or(CliError::MissingToken)?;
            println!("{}", endpoint_url(&cli.base_url, &project_id, &token)?);
            Ok(())
        }
        Command::Join { project_id, file } => {
            let token = cli.token.ok_or(CliError::MissingToken)?;
            run_join(&cli.base_url, &project_id, &token, file).await
        }
    }
}

async fn run_ping(base_url: &str) -> Result<(), CliError> {
    let url = format!("{}/healthz", base_url.trim_end_matches('/'));
    tracing::debug!(%url, "checking health");
    let status = reqwest::get(url).await?.status();
    if !status.is_success() {
        return Err(CliError::Unhealthy(status.as_u16()));
    }
    println!("ok");
    Ok(())
}

// =============================================================================
// JOIN
// =============================================================================

async fn run_join(base_url: &str, project_id: &str, token: &str, file: Option<String>) -> Result<(), CliError> {
    let mut config = CollabConfig::new(base_url, project_id, token).with_cursor_callback(|cursor| {
        println!("{}", format_cursor(&cursor.user_id, cursor.position, cursor.file_id.as_deref()));
    });
    if let Some(file) = file {
        config = config.with_active_file(file);
    }

    let (handle, mut events) = CollabClient::connect(config).await?;
    tracing::info!(%project_id, "joined room");
    let mut printer = EventPrinter::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.map_err(CliError::Stdin)? else { break };
                match parse_input(&line) {
                    Input::Empty => {}
                    Input::Chat(text) => report_send(handle.send_message(&text)),
                    Input::Cursor(position) => report_send(handle.send_cursor(position)),
                    Input::Selection(range) => report_send(handle.send_selection(range)),
                    Input::File(file_id) => handle.set_active_file(Some(file_id)),
                    Input::Invalid(reason) => eprintln!("{reason}"),
                }
            }
            event = events.recv() => match event {
                Some(SessionEvent::Connected) => eprintln!("connected to {project_id}"),
                Some(SessionEvent::Updated(_)) => {
                    for line in printer.changes(&handle.snapshot()) {
                        println!("{line}");
                    }
                }
                Some(SessionEvent::Disconnected) | None => {
                    eprintln!("disconnected");
                    break;
                }
            },
        }
    }

    handle.close();
    tracing::info!(%project_id, "left room");
    Ok(())
}

fn report_send(sent: bool) {
    if !sent {
        eprintln!("not connected; input dropped");
    }
}

// =============================================================================
// INPUT
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Empty,
    Chat(String),
    Cursor(CursorPosition),
    Selection(SelectionRange),
    File(String),
    Invalid(String),
}

/// Parse one stdin line. Lines starting with `/` are commands:
/// `/cursor L C`, `/select L1 C1 L2 C2`, `/file ID`. Use `//` to send a
/// chat line that starts with a slash.
fn parse_input(line: &str) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Input::Empty;
    }
    if let Some(rest) = line.strip_prefix("//") {
        return Input::Chat(format!("/{rest}"));
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Chat(line.to_owned());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();
    match (name, args.as_slice()) {
        ("cursor", [line, column]) => match (parse_u32(line), parse_u32(column)) {
            (Some(l), Some(c)) => Input::Cursor(CursorPosition::new(l, c)),
            _ => Input::Invalid("usage: /cursor LINE COLUMN".to_owned()),
        },
        ("select", [sl, sc, el, ec]) => match (parse_u32(sl), parse_u32(sc), parse_u32(el), parse_u32(ec)) {
            (Some(start_line_number), Some(start_column), Some(end_line_number), Some(end_column)) => {
                Input::Selection(SelectionRange { start_line_number, start_column, end_line_number, end_column })
            }
            _ => Input::Invalid("usage: /select LINE COL LINE COL".to_owned()),
        },
        ("file", [file_id]) => Input::File((*file_id).to_owned()),
        ("cursor", _) => Input::Invalid("usage: /cursor LINE COLUMN".to_owned()),
        ("select", _) => Input::Invalid("usage: /select LINE COL LINE COL".to_owned()),
        ("file", _) => Input::Invalid("usage: /file ID".to_owned()),
        (other, _) => Input::Invalid(format!("unknown command: /{other}")),
    }
}

fn parse_u32(raw: &str) -> Option<u32> {
    raw.parse().ok()
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Turns successive session snapshots into printable lines.
#[derive(Debug, Default)]
struct EventPrinter {
    known: Vec<(String, String)>,
    messages_seen: usize,
    last_error: Option<String>,
}

impl EventPrinter {
    fn changes(&mut self, state: &SessionState) -> Vec<String> {
        let mut out = Vec::new();
        let current: Vec<(String, String)> =
            state.collaborators.iter().map(|c| (c.id.clone(), c.name.clone())).collect();

        for (id, name) in &current {
            if !self.known.iter().any(|(k, _)| k == id) {
                out.push(format!("+ {name} ({id}) joined"));
            }
        }
        for (id, name) in &self.known {
            if !current.iter().any(|(k, _)| k == id) {
                out.push(format!("- {name} ({id}) left"));
            }
        }
        self.known = current;

        for message in state.messages.iter().skip(self.messages_seen) {
            out.push(format!("[{}] {}", message.user_name, message.content));
        }
        self.messages_seen = state.messages.len();

        if let Some(err) = &state.last_error {
            let rendered = format!("! {}: {}", err.code, err.message);
            if self.last_error.as_ref() != Some(&rendered) {
                out.push(rendered.clone());
                self.last_error = Some(rendered);
            }
        }
        out
    }
}

fn format_cursor(user_id: &str, position: CursorPosition, file_id: Option<&str>) -> String {
    let location = format!("{}:{}", position.line_number, position.column);
    match file_id {
        Some(file) => format!("~ {user_id} at {location} in {file}"),
        None => format!("~ {user_id} at {location}"),
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
