//! Notification Router CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use notification_router::cli::{
    handle_check_rules, handle_cleanup, handle_count, handle_list, handle_remove, handle_run,
    handle_see, CheckRulesArgs, QueueArgs, RunArgs,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "nrouter")]
#[command(about = "Notification Router - queue notifications, escalate the ones that matter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the router daemon, reading notifications as JSON lines on stdin
    Run(RunArgs),
    /// List queued notifications
    List {
        #[command(flatten)]
        queue: QueueArgs,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the number of queued notifications
    Count {
        #[command(flatten)]
        queue: QueueArgs,
    },
    /// Mark notifications as seen (CRITICAL drops to NORMAL)
    See {
        #[command(flatten)]
        queue: QueueArgs,
        /// Notification ids
        #[arg(required = true)]
        ids: Vec<u32>,
    },
    /// Remove notifications from the queue
    Remove {
        #[command(flatten)]
        queue: QueueArgs,
        /// Notification ids
        #[arg(required = true)]
        ids: Vec<u32>,
    },
    /// Drop expired notifications now
    Cleanup {
        #[command(flatten)]
        queue: QueueArgs,
    },
    /// Parse a rules file and report problems
    CheckRules(CheckRulesArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides, e.g. RUST_LOG=debug nrouter run
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notification_router=info,nrouter=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => handle_run(args).await?,
        Commands::List { queue, json } => handle_list(&queue, json)?,
        Commands::Count { queue } => handle_count(&queue)?,
        Commands::See { queue, ids } => handle_see(&queue, &ids)?,
        Commands::Remove { queue, ids } => handle_remove(&queue, &ids)?,
        Commands::Cleanup { queue } => handle_cleanup(&queue)?,
        Commands::CheckRules(args) => handle_check_rules(args)?,
    }

    Ok(())
}
