//! cfgwiz — line-oriented configuration wizard for JSON parameter files.

mod console;
mod cursor;
mod document;
mod host;
mod options;
mod params;
mod storage;
mod store;
mod value;
mod wizard;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use console::{ScriptedLines, StdConsole, StdinLines};
use options::{IntegerPolicy, Options, ReplacePolicy, DEFAULT_MAX_DOCUMENT_BYTES};
use params::Parameters;
use storage::DirStorage;
use store::DocumentStore;
use wizard::{TickOutcome, Wizard};

/// cfgwiz — review and edit JSON parameter files one key at a time
#[derive(Parser, Debug)]
#[command(name = "cfgwiz", version, about)]
struct Cli {
    /// Directory holding the parameter files (overrides default)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Refuse files larger than this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_DOCUMENT_BYTES)]
    max_bytes: u64,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk every key of FILE and optionally replace its value
    Edit {
        file: String,

        /// How the edited file replaces the original
        #[arg(long, value_enum, default_value_t = ReplacePolicy::RemoveThenWrite)]
        replace: ReplacePolicy,

        /// Ask again instead of storing 0 when integer input is not a number
        #[arg(long)]
        strict_integers: bool,

        /// Milliseconds to wait between polls for operator input
        #[arg(long, default_value_t = 10)]
        poll_ms: u64,

        /// Read answers from a file instead of the terminal, one per line
        #[arg(long)]
        answers: Option<PathBuf>,
    },
    /// Print a single parameter from FILE
    Get {
        file: String,
        key: String,

        /// Only accept a value of this type
        #[arg(long, value_enum)]
        kind: Option<Kind>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    #[value(name = "string")]
    Str,
    #[value(name = "integer")]
    Int,
    #[value(name = "boolean")]
    Bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = match cli.root {
        Some(p) => p,
        None => default_root()?,
    };

    match cli.command {
        Command::Edit {
            file,
            replace,
            strict_integers,
            poll_ms,
            answers,
        } => {
            let options = Options {
                replace_policy: replace,
                integer_policy: if strict_integers {
                    IntegerPolicy::Strict
                } else {
                    IntegerPolicy::Lenient
                },
                max_document_bytes: cli.max_bytes,
            };
            run_edit(
                root,
                &file,
                &options,
                answers,
                Duration::from_millis(poll_ms),
            )
        }
        Command::Get { file, key, kind } => {
            let options = Options {
                max_document_bytes: cli.max_bytes,
                ..Options::default()
            };
            run_get(root, &file, &key, kind, &options)
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the default storage root for the current OS.
fn default_root() -> Result<PathBuf> {
    let config = dirs::config_dir().context("could not determine config directory")?;
    Ok(config.join("cfgwiz"))
}

fn run_edit(
    root: PathBuf,
    file: &str,
    options: &Options,
    answers: Option<PathBuf>,
    poll: Duration,
) -> Result<()> {
    let mut wizard = Wizard::new(DirStorage::new(root), StdConsole, options);
    wizard.select_file(file);

    let outcome = match answers {
        Some(path) => {
            let mut lines = ScriptedLines::from_file(&path)
                .with_context(|| format!("reading answers from {}", path.display()))?;
            host::run_session(&mut wizard, &mut lines, poll)
        }
        None => host::run_session(&mut wizard, &mut StdinLines::spawn(), poll),
    };

    match outcome {
        Some(TickOutcome::OpenFailed { path }) => anyhow::bail!("could not open {path}"),
        Some(TickOutcome::Refused { path }) => anyhow::bail!("{path} is too large to edit"),
        Some(TickOutcome::SaveFailed { path, reason }) => {
            anyhow::bail!("{path} was not saved: {reason}")
        }
        Some(TickOutcome::Saved { path }) => {
            debug!(path = %path, "edit finished");
            Ok(())
        }
        Some(TickOutcome::Started { .. }) | None => Ok(()),
    }
}

fn run_get(
    root: PathBuf,
    file: &str,
    key: &str,
    kind: Option<Kind>,
    options: &Options,
) -> Result<()> {
    let store = DocumentStore::new(DirStorage::new(root), options);
    let params = Parameters::load(&store, file).with_context(|| format!("loading {file}"))?;

    let found = match kind {
        None => params.get(key).map(|v| v.to_string()),
        Some(Kind::Str) => params.get_str(key).map(str::to_string),
        Some(Kind::Int) => params.get_int(key).map(|n| n.to_string()),
        Some(Kind::Bool) => params.get_bool(key).map(|b| b.to_string()),
    };

    match found {
        Some(text) => {
            println!("{text}");
            Ok(())
        }
        None => anyhow::bail!("'{key}' not found in {file}"),
    }
}
