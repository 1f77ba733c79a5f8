//! studyduel CLI — duel a computer opponent with quiz questions.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "studyduel", version, about = "Quiz duel arena with ranked tiers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a duel against the computer opponent
    Play {
        /// Path to a .toml question set or directory (default: from config)
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Subject to draw questions from (default: first subject found)
        #[arg(long)]
        subject: Option<String>,

        /// Account to play as (default: from config)
        #[arg(long)]
        account: Option<String>,

        /// Seed for question draws and opponent rolls
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show an account's points and arena tier
    Profile {
        /// Account to show (default: from config)
        #[arg(long)]
        account: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the top accounts by points
    Leaderboard {
        /// Number of rows
        #[arg(long, default_value = "10")]
        top: usize,

        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the arena tiers
    Tiers {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate question set TOML files
    Validate {
        /// Path to question set file or directory
        #[arg(long)]
        questions: PathBuf,
    },

    /// Create starter config and example question set
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("studyduel=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            questions,
            subject,
            account,
            seed,
            config,
        } => commands::play::execute(questions, subject, account, seed, config).await,
        Commands::Profile { account, config } => commands::profile::execute(account, config).await,
        Commands::Leaderboard { top, json, config } => {
            commands::leaderboard::execute(top, json, config).await
        }
        Commands::Tiers { config } => commands::tiers::execute(config),
        Commands::Validate { questions } => commands::validate::execute(questions),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
