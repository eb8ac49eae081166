//! learning-observer CLI.
//!
//! Runs the startup checks against a settings file and operates on the
//! selected key-value store.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use learning_observer::constants;
use learning_observer::startup::StartupFailure;
use learning_observer::ui;

#[derive(Parser, Debug)]
#[command(name = "learning-observer")]
#[command(about = "Inspect and manage the learning-observer key-value store")]
#[command(version)]
struct Cli {
    /// Settings file
    #[arg(short, long, global = true, default_value = constants::DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the startup checks and report the selected backend
    Check,
    /// Print the value stored under a key
    Get {
        /// Key to read
        key: String,
    },
    /// Store a JSON value under a key
    Set {
        /// Key to write
        key: String,
        /// Value as JSON text, e.g. '{"words": 12}'
        value: String,
    },
    /// List keys in sorted order
    Keys {
        /// Only list keys after this one
        #[arg(long)]
        after: Option<String>,
        /// Maximum number of keys to list
        #[arg(short, long, default_value_t = constants::DEFAULT_KEYS_PAGE_SIZE)]
        limit: usize,
    },
    /// Dump every entry as JSON
    Dump {
        /// Write the dump to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load entries from a dump file
    Load {
        /// Dump file to read
        path: PathBuf,
    },
    /// Remove every entry (stub backend only)
    Clear,
}

/// Install the fmt subscriber on stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool, json: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let factory = commands::bootstrap(&cli.config)?;

    match cli.command {
        Commands::Check => commands::check(&factory),
        Commands::Get { key } => commands::get(&factory.create(), &key).await,
        Commands::Set { key, value } => commands::set(&factory.create(), &key, &value).await,
        Commands::Keys { after, limit } => {
            commands::keys(&factory.create(), after.as_deref(), limit).await
        },
        Commands::Dump { output } => commands::dump(&factory.create(), output.as_deref()).await,
        Commands::Load { path } => commands::load(&factory.create(), &path).await,
        Commands::Clear => commands::clear(&factory.create()).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<StartupFailure>() {
            Some(failure) => ui::print_startup_failure(failure),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}
