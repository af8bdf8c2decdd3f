//! takedown CLI
//!
//! Scans GitHub for repositories that potentially infringe copyright,
//! tracks detections across runs, and drives takedown notices.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use takedown::{
    config::Config,
    error::Result,
    models::RecordStore,
    pipeline::{
        self, AutoConfirm, ConfirmPolicy, LogTransport, NotificationDispatcher, StatusFilter,
    },
    services::{GitHubClient, OwnerProfileCache, SearchTarget},
    storage::{self, RecordFormat},
};

/// takedown - GitHub copyright takedown assistant
#[derive(Parser, Debug)]
#[command(name = "takedown", version, about = "GitHub copyright takedown assistant")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "takedown.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for repositories in violation and reconcile records
    Find {
        /// Search query string
        query: String,

        /// GitHub OAuth token (falls back to $GITHUB_TOKEN)
        #[arg(long, env = "GITHUB_TOKEN")]
        token: Option<String>,

        /// Search targets to run, in merge order
        #[arg(short, long, value_delimiter = ',', default_values = ["code", "repo"])]
        targets: Vec<String>,

        /// Previous output files to reconcile against
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Where to write the resulting record set (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: json or yaml (defaults to config)
        #[arg(long)]
        format: Option<String>,

        /// Proceed without operator confirmation prompts
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Send takedown notices for recorded repositories
    Send {
        /// Record files produced by a previous find run
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Status tags selecting repositories to notify about
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Where to write the updated record set (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: json or yaml (defaults to config)
        #[arg(long)]
        format: Option<String>,
    },

    /// Validate the configuration file
    Validate,
}

/// Prompts the operator on stdin before risky searches.
struct StdinConfirm;

impl StdinConfirm {
    fn ask(prompt: &str) -> bool {
        loop {
            print!("{prompt} [y/n] ");
            let _ = std::io::stdout().flush();
            let mut answer = String::new();
            if std::io::stdin().read_line(&mut answer).is_err() {
                return false;
            }
            match answer.trim().to_lowercase().as_str() {
                "y" => return true,
                "n" => return false,
                _ => println!("Please enter 'y' or 'n':"),
            }
        }
    }
}

impl ConfirmPolicy for StdinConfirm {
    fn confirm_short_query(&self, query: &str) -> bool {
        Self::ask(&format!(
            "The search query `{query}` is so short that it will produce massive search \
             results. Are you sure to proceed?"
        ))
    }

    fn confirm_large_result(&self, _query: &str, total: u64, ceiling: u64) -> bool {
        Self::ask(&format!(
            "The number of search results is {total}. It is so large that you may narrow \
             search queries. The max retrievable number is {ceiling}. Are you sure to proceed?"
        ))
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Resolve the output format from flag or config.
fn resolve_format(flag: Option<&str>, config: &Config) -> Result<RecordFormat> {
    flag.unwrap_or(&config.output.format).parse()
}

/// Write the store to a file or print it to stdout.
async fn emit(
    store: &RecordStore,
    output: Option<&PathBuf>,
    format: RecordFormat,
) -> Result<()> {
    match output {
        Some(path) => {
            storage::save_records(path, store, format).await?;
            log::info!(
                "Saved {} owners / {} repos to {}",
                store.owner_count(),
                store.repo_count(),
                path.display()
            );
        }
        None => println!("{}", storage::encode(store, format)?),
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Find {
            query,
            token,
            targets,
            input,
            output,
            format,
            yes,
        } => {
            config.validate()?;
            let format = resolve_format(format.as_deref(), &config)?;
            let targets: Vec<SearchTarget> = targets
                .iter()
                .map(|t| t.parse())
                .collect::<Result<Vec<_>>>()?;

            if token.is_none() {
                log::warn!(
                    "No token provided; code search over all of GitHub requires authentication."
                );
            }

            let client = Arc::new(GitHubClient::new(&config.github, token)?);
            let profiles = OwnerProfileCache::new(client.clone());
            let confirm: Box<dyn ConfirmPolicy> = if yes {
                Box::new(AutoConfirm)
            } else {
                Box::new(StdinConfirm)
            };

            let previous = storage::load_previous(&input).await;
            let outcome = pipeline::run_find(
                &*client,
                &profiles,
                &*confirm,
                &config.search,
                &query,
                &targets,
                &previous,
            )
            .await;

            for report in &outcome.reports {
                log::info!(
                    "Target {}: {} hits, {} new, {} re-detected, {} anomalies",
                    report.target,
                    report.hits,
                    report.stats.new,
                    report.stats.redetected,
                    report.stats.anomalies
                );
            }
            for (target, reason) in &outcome.declined {
                log::info!("Target {target} declined: {reason:?}");
            }

            if !outcome.any_completed() {
                if let Some((target, error)) = outcome.failures.into_iter().next() {
                    log::error!("No target completed; last failure on {target}");
                    return Err(error);
                }
                log::warn!("No target completed; records unchanged.");
            }

            emit(&outcome.store, output.as_ref(), format).await?;
        }

        Command::Send {
            input,
            tags,
            output,
            format,
        } => {
            let format = resolve_format(format.as_deref(), &config)?;
            let filter = if tags.is_empty() {
                StatusFilter::default_notify()
            } else {
                StatusFilter::from_tags(&tags)?
            };

            let mut store = storage::load_previous(&input).await;
            if store.is_empty() {
                log::warn!("No records loaded; nothing to send.");
                return Ok(());
            }

            // SMTP delivery is out of scope here; log instead of sending.
            let transport = LogTransport;
            let dispatcher = NotificationDispatcher::new(&transport, &config.email);
            let outcome = dispatcher.dispatch(&mut store, &filter).await;

            log::info!(
                "Notified {} owners about {} repos ({} skipped without email, {} without match)",
                outcome.owners_contacted,
                outcome.repos_notified,
                outcome.skipped_no_email,
                outcome.skipped_no_match
            );
            for (address, reason) in &outcome.failed_recipients {
                log::warn!("Delivery to {address} failed: {reason}");
            }

            emit(&store, output.as_ref(), format).await?;
        }

        Command::Validate => {
            config.validate()?;
            log::info!("Configuration OK.");
        }
    }

    Ok(())
}
