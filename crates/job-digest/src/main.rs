//! Job digest CLI - polls the listings API and emails new postings.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_digest::config::DigestConfig;
use job_digest::digest::SmtpMailer;
use job_digest::pipeline::{Pipeline, RunOutcome};
use job_digest::storage::SentSetStore;

/// Job digest CLI - email new job listings matching a saved search.
#[derive(Parser)]
#[command(name = "job-digest")]
#[command(about = "Job listing poller with email digests")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file
    #[arg(long, global = true, env = "JOB_DIGEST_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Sent-set file (ids of listings already emailed)
    #[arg(long, global = true, env = "JOB_DIGEST_STATE", default_value = "sent_jobs.txt")]
    state: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single poll cycle (default; for cron use)
    Poll,

    /// Print the digest the next poll would send, without sending it
    Preview,

    /// Send a test email to verify SMTP settings
    TestEmail,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "job_digest=debug,info"
    } else {
        "job_digest=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = DigestConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    tracing::debug!(
        config = %cli.config.display(),
        recipient = %config.recipient,
        "Loaded configuration"
    );

    match cli.command.unwrap_or(Commands::Poll) {
        Commands::Poll => run_poll(config, cli.state).await,
        Commands::Preview => run_preview(config, cli.state).await,
        Commands::TestEmail => run_test_email(&config).await,
    }
}

async fn run_poll(config: DigestConfig, state: PathBuf) -> Result<()> {
    tracing::info!(state = %state.display(), "Starting poll cycle");

    let mailer = Arc::new(SmtpMailer::new(&config));
    let pipeline = Pipeline::new(config, SentSetStore::new(state), mailer);

    let outcome = pipeline
        .run_once()
        .await
        .context("Failed to load sent-set")?;

    match outcome {
        RunOutcome::NoListings => tracing::info!("Nothing fetched; no email sent"),
        RunOutcome::NothingNew { fetched } => {
            tracing::info!(fetched, "No new listings; no email sent");
        }
        RunOutcome::Delivered {
            fetched,
            new,
            persisted,
        } => tracing::info!(fetched, new, persisted, "Digest delivered"),
        RunOutcome::DeliveryFailed { fetched, new } => {
            tracing::warn!(fetched, new, "Digest not delivered; will retry next run");
        }
    }

    Ok(())
}

async fn run_preview(config: DigestConfig, state: PathBuf) -> Result<()> {
    let mailer = Arc::new(SmtpMailer::new(&config));
    let pipeline = Pipeline::new(config, SentSetStore::new(state), mailer);

    let preview = pipeline
        .preview()
        .await
        .context("Failed to load sent-set")?;

    tracing::info!(
        fetched = preview.fetched,
        new = preview.new_listings.len(),
        "Preview ready"
    );

    match preview.digest {
        Some(digest) => println!("{}", digest.html),
        None => println!("No new listings."),
    }

    Ok(())
}

async fn run_test_email(config: &DigestConfig) -> Result<()> {
    let mailer = SmtpMailer::new(config);

    match mailer.send_test().await {
        Ok(()) => println!("Test email sent to {}", config.recipient),
        Err(e) => tracing::error!(error = %e, "Test email failed"),
    }

    Ok(())
}
