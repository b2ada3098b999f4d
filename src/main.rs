use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "vox")]
#[command(about = "Hands-free voice commands - wake word, then command")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.vox/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for utterances typed on stdin, one per line
    Listen {
        /// Wake word (repeatable); overrides the config file
        #[arg(short, long = "wake-word")]
        wake_word: Vec<String>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Match an utterance against a command pattern and print the parameters
    Match {
        /// Command pattern, e.g. "open {app}"
        pattern: String,

        /// Utterance to test
        utterance: String,
    },

    /// Initialize a new ~/.vox/config.toml configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Listen { wake_word, json } => {
            cli::listen::listen_command(cli.config.as_deref(), wake_word, json).await?;
        }
        Commands::Match { pattern, utterance } => {
            if !cli::pattern::match_command(&pattern, &utterance)? {
                std::process::exit(1);
            }
        }
        Commands::Init { force } => {
            cli::init::init_command(cli.config, force)?;
        }
    }

    Ok(())
}
