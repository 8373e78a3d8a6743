//! taskboard-cli - interactive terminal client for the task API.
//!
//! Renders the task list after every command and re-fetches it after every
//! successful change.

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use taskboard::client::{render, Board, HttpTaskApi, Prompt, TaskApi};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Terminal client for a taskboard server
#[derive(Parser)]
#[command(name = "taskboard-cli")]
#[command(version)]
struct Cli {
    /// Server origin, e.g. http://127.0.0.1:5000 (empty means that default)
    #[arg(long, env = "TASKBOARD_API_BASE", default_value = "")]
    api_base: String,
}

const HELP: &str = "\
Commands:
  add [title]     add a task (no title retries the kept draft)
  toggle <n>      flip done on row n
  edit <n>        start editing row n
  title <text>    replace the edit draft
  save            save the edit
  cancel          discard the edit
  delete <n>      delete row n (asks first)
  health          check the API
  reload          fetch the list again
  help            show this help
  quit            exit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Add(Option<String>),
    Toggle(usize),
    Edit(usize),
    Title(String),
    Save,
    Cancel,
    Delete(usize),
    Health,
    Reload,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let row = || -> Result<usize, String> {
            rest.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("'{}' needs a row number", word))
        };
        match word.to_lowercase().as_str() {
            "add" | "a" => Ok(Command::Add((!rest.is_empty()).then(|| rest.to_string()))),
            "toggle" | "t" => Ok(Command::Toggle(row()?)),
            "edit" | "e" => Ok(Command::Edit(row()?)),
            "title" => Ok(Command::Title(rest.to_string())),
            "save" => Ok(Command::Save),
            "cancel" => Ok(Command::Cancel),
            "delete" | "rm" => Ok(Command::Delete(row()?)),
            "health" => Ok(Command::Health),
            "reload" | "r" => Ok(Command::Reload),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            "" => Err(String::new()),
            other => Err(format!("unknown command '{}' (try 'help')", other)),
        }
    }
}

/// Line-oriented stdin/stdout.
struct Terminal {
    lines: Lines<BufReader<Stdin>>,
    out: Stdout,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            out: tokio::io::stdout(),
        }
    }

    async fn print(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes()).await;
        let _ = self.out.flush().await;
    }

    /// `None` on end of input.
    async fn read_line(&mut self) -> Option<String> {
        self.lines.next_line().await.ok().flatten()
    }
}

#[async_trait]
impl Prompt for Terminal {
    async fn confirm(&mut self, question: &str) -> bool {
        self.print(&format!("{} [y/N] ", question)).await;
        self.read_line()
            .await
            .map(|answer| answer.trim().to_lowercase().starts_with('y'))
            .unwrap_or(false)
    }

    async fn acknowledge(&mut self, message: &str) {
        self.print(&format!("{}\n(press Enter) ", message)).await;
        let _ = self.read_line().await;
    }
}

/// Resolve a 1-based row number to a task id.
fn row_id<A: TaskApi>(board: &Board<A>, row: usize) -> Option<String> {
    board
        .state()
        .tasks()
        .get(row.checked_sub(1)?)
        .map(|t| t.id.clone())
}

/// Run one command. Returns `false` when the user asked to quit.
async fn execute<A: TaskApi>(board: &mut Board<A>, term: &mut Terminal, command: Command) -> bool {
    let outcome = match command {
        Command::Add(title) => {
            if let Some(title) = title {
                board.set_draft(title);
            }
            board.create().await
        }
        Command::Toggle(row) => match row_id(board, row) {
            Some(id) => board.toggle(&id).await,
            None => {
                term.print(&format!("! no row {}\n", row)).await;
                Ok(())
            }
        },
        Command::Edit(row) => match row_id(board, row) {
            Some(id) => board.start_edit(&id),
            None => {
                term.print(&format!("! no row {}\n", row)).await;
                Ok(())
            }
        },
        Command::Title(text) => board.set_edit_draft(text),
        Command::Save => board.save_edit().await,
        Command::Cancel => board.cancel_edit(),
        Command::Delete(row) => match row_id(board, row) {
            Some(id) => board.delete(&id, term).await.map(|_| ()),
            None => {
                term.print(&format!("! no row {}\n", row)).await;
                Ok(())
            }
        },
        Command::Health => {
            board.health(term).await;
            Ok(())
        }
        Command::Reload => {
            board.load().await;
            Ok(())
        }
        Command::Help => {
            term.print(&format!("{}\n", HELP)).await;
            Ok(())
        }
        Command::Quit => return false,
    };
    if let Err(refusal) = outcome {
        term.print(&format!("! {}\n", refusal)).await;
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they do not interleave with the board.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let api = HttpTaskApi::new(cli.api_base);
    let api_root = api.api_root().to_string();
    tracing::debug!("Using API at {}", api_root);

    let mut board = Board::new(api);
    let mut term = Terminal::new();
    board.load().await;

    loop {
        term.print(&format!("\n{}> ", render(board.state(), &api_root)))
            .await;
        let Some(line) = term.read_line().await else {
            break;
        };
        match Command::parse(&line) {
            Ok(command) => {
                if !execute(&mut board, &mut term, command).await {
                    break;
                }
            }
            Err(msg) if msg.is_empty() => {}
            Err(msg) => term.print(&format!("! {}\n", msg)).await,
        }
    }

    Ok(())
}
