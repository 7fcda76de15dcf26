#![forbid(unsafe_code)]

mod constants;
mod persistence;
mod preview;
mod reconciler;
mod schema;
mod seed;
mod store;
mod types;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use persistence::HistoryStore;
use reconciler::{EditKind, PersistPolicy, Reconciler};

#[derive(Parser)]
#[command(name = "seedling", version, about = "Avatar customizer with shareable seeds")]
struct Cli {
    /// Session file holding the edit history (defaults to the user config dir)
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// How edits appear in the share link
    #[arg(long, global = true, value_enum, default_value = "seed")]
    policy: Policy,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Single `seed` query key
    Seed,
    /// One query key per attribute
    Attributes,
}

impl From<Policy> for PersistPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Seed => PersistPolicy::Seed,
            Policy::Attributes => PersistPolicy::Attributes,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the current character, its seed, and the share link
    Show,
    /// Edit one attribute (e.g. `set hair 3`, `set hat ninja`)
    Set {
        key: String,
        value: String,
        /// Mid-gesture edit: overwrite the current history entry instead of
        /// pushing a new one
        #[arg(long)]
        transient: bool,
    },
    /// Replace the whole character from a seed string
    Seed { seed: String },
    /// Load a character from a pasted share link (or bare query string)
    Open { link: String },
    /// Step back to the previous character state
    Back,
    /// Step forward to the next character state
    Forward,
    /// Reset every attribute to its default
    Reset,
    /// Print the shareable link
    Link {
        #[arg(long, default_value = constants::share::DEFAULT_BASE)]
        base: String,
    },
}

fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let session_file = cli
        .state_file
        .clone()
        .unwrap_or_else(persistence::session_path);

    let mut history = HistoryStore::load(&session_file)?;
    let changes = history.subscribe();
    let mut reconciler = Reconciler::new(history, cli.policy.into());
    reconciler.initialize();

    match cli.command {
        Command::Show => {
            print!("{}", preview::render(reconciler.snapshot()));
            println!("seed: {}", reconciler.seed());
            println!("link: {}", reconciler.share_link(constants::share::DEFAULT_BASE));
        }
        Command::Set { key, value, transient } => {
            let kind = if transient {
                EditKind::Transient
            } else {
                EditKind::Discrete
            };
            if reconciler.apply_edit(&key, &value, kind)? {
                print!("{}", preview::render(reconciler.snapshot()));
                println!("seed: {}", reconciler.seed());
            } else {
                println!("{key} unchanged");
            }
        }
        Command::Seed { seed } => {
            if reconciler.load_seed(&seed) {
                print!("{}", preview::render(reconciler.snapshot()));
            }
            println!("seed: {}", reconciler.seed());
        }
        Command::Open { link } => {
            let query = link.split_once('?').map_or(link.as_str(), |(_, query)| query);
            let repr = persistence::from_query(query);
            if reconciler.load_representation(&repr) {
                print!("{}", preview::render(reconciler.snapshot()));
            }
            println!("seed: {}", reconciler.seed());
        }
        Command::Back => {
            if reconciler.history_mut().back() {
                drain_external_changes(&changes, &mut reconciler);
                print!("{}", preview::render(reconciler.snapshot()));
                println!("seed: {}", reconciler.seed());
            } else {
                println!("history: nothing to go back to");
            }
        }
        Command::Forward => {
            if reconciler.history_mut().forward() {
                drain_external_changes(&changes, &mut reconciler);
                print!("{}", preview::render(reconciler.snapshot()));
                println!("seed: {}", reconciler.seed());
            } else {
                println!("history: nothing to go forward to");
            }
        }
        Command::Reset => {
            if reconciler.reset() {
                print!("{}", preview::render(reconciler.snapshot()));
            }
            println!("seed: {}", reconciler.seed());
        }
        Command::Link { base } => {
            println!("{}", reconciler.share_link(&base));
        }
    }

    reconciler.history().save(&session_file)?;
    info!(path = %session_file.display(), entries = reconciler.history().len(), "session saved");
    Ok(())
}

/// Route queued external-store changes through the reconciler
fn drain_external_changes(
    changes: &std::sync::mpsc::Receiver<persistence::Representation>,
    reconciler: &mut Reconciler,
) {
    for repr in changes.try_iter() {
        reconciler.on_external_change(&repr);
    }
}

fn init_tracing() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "warn".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "info" => TraceLevel::INFO,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
