//! CLI for the CodePlex issue importer.
//!
//! This tool migrates a static CodePlex issue export into a live GitHub
//! repository, idempotently and paced against the API rate limit.

use clap::Parser;
use codeplex_importer::{RunSummary, Runner, RunnerConfig, RunnerError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// CodePlex Issue Importer - Migrate an exported CodePlex project's issues into GitHub.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the CodePlex export folder (containing issues.json).
    #[arg(long)]
    export_path: PathBuf,

    /// Target repository owner.
    #[arg(long)]
    owner: String,

    /// Target repository name.
    #[arg(long)]
    repo: String,

    /// GitHub Personal Access Token.
    #[arg(long, env = "GITHUB_TOKEN")]
    token: String,

    /// Prefix for derived issue titles.
    #[arg(long, default_value = "CP")]
    title_prefix: String,

    /// Preview the migration without touching the target.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    init_tracing();

    // Parse arguments
    let args = Args::parse();

    // Run the main logic
    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::from(0)
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        // Use compact formatting without module target paths for cleaner output
        .with(fmt::layer().compact().with_target(false))
        // Allow runtime log filtering via RUST_LOG env var (e.g., RUST_LOG=debug)
        // Falls back to "info" level if RUST_LOG is not set or invalid
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        // Register as the global default subscriber
        .init();
}

/// Main execution logic.
async fn run(args: Args) -> Result<RunSummary, RunnerError> {
    let config = RunnerConfig::new(args.export_path, args.owner, args.repo, args.token)
        .with_title_prefix(args.title_prefix)
        .with_dry_run(args.dry_run);
    let runner = Runner::new(config)?;
    runner.run().await
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!("  Issues processed: {}", summary.issues_processed);

    if !summary.dry_run {
        println!("  Issues created: {}", summary.issues_created);
        println!("  Issues reused: {}", summary.issues_reused);
        println!("  Comments created: {}", summary.comments_created);
        println!("  Comments skipped: {}", summary.comments_skipped);
        println!("  Comments suppressed: {}", summary.comments_suppressed);
        println!("  Close transitions: {}", summary.close_transitions);
        println!("  Labels created: {}", summary.labels_created);
        println!("  Attachments copied: {}", summary.attachments_copied);
        if summary.is_noop() {
            println!("  Nothing to do; target already up to date.");
        }
    }
}
