use anyhow::{Context, Result};
use clap::Parser;
use diff_model::ChangeScope;
use diff_sync::{DiffSelection, SessionContext, SessionHandle, SessionSnapshot};
use diff_sync_config::SyncConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use vcs_client::{CliClient, VcsClient};

mod logger;

/// Follow a repository's uncommitted changes or a pull request's diff
#[derive(Debug, Parser)]
#[command(name = "diff-sync", version, about)]
struct Cli {
    /// Repository root
    #[arg(short = 'C', long, default_value = ".")]
    repo: PathBuf,

    /// Which changes to list: all, staged or unstaged
    #[arg(short, long, default_value_t = ChangeScope::All)]
    scope: ChangeScope,

    /// Load the diff of one changed path
    #[arg(short, long)]
    path: Option<String>,

    /// Show a pull request's diff instead of the working tree
    #[arg(long, conflicts_with = "path")]
    pr: Option<u64>,

    /// Print the first settled state and exit
    #[arg(long)]
    once: bool,

    /// Print snapshots as JSON lines
    #[arg(long)]
    json: bool,

    /// Mirror the log to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = logger::init(cli.verbose)?;
    log::info!("Starting diff-sync, logging to {}", log_file.display());

    let config = SyncConfig::load();
    let repo_root = cli
        .repo
        .canonicalize()
        .with_context(|| format!("Repository {} not found", cli.repo.display()))?;

    let context = match cli.pr {
        Some(number) => SessionContext::pull_request(&repo_root, number),
        None => SessionContext::working_tree(&repo_root, cli.scope),
    };

    let git: Arc<dyn VcsClient> = Arc::new(CliClient::git(&config));
    let gh: Arc<dyn VcsClient> = Arc::new(CliClient::gh(&config));
    let session = SessionHandle::spawn(config, git, gh);

    let mut snapshots = session.subscribe();
    session.set_visible(true, context);
    if let Some(path) = &cli.path {
        session.load_diff(DiffSelection::Path(path.clone()));
    }

    let result = follow(&cli, &mut snapshots).await;

    session.shutdown().await;
    log::info!("Exiting diff-sync");
    result
}

async fn follow(cli: &Cli, snapshots: &mut watch::Receiver<Arc<SessionSnapshot>>) -> Result<()> {
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = Arc::clone(&snapshots.borrow_and_update());
                let settled = snapshot.is_settled();
                if settled || !cli.once {
                    print_snapshot(&snapshot, cli.json)?;
                }
                if settled && cli.once {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &SessionSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }

    let when = snapshot
        .refreshed_at
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    let busy = if snapshot.refreshing || snapshot.loading_diff {
        " (refreshing)"
    } else {
        ""
    };
    println!("[{} #{}]{}", when, snapshot.revision, busy);

    if let Some(error) = &snapshot.status_error {
        println!("  error: {}", error);
    }
    for entry in snapshot.visible_entries() {
        println!(
            "  {} {} +{} -{}",
            entry.status_code,
            entry.display_name(),
            entry.additions,
            entry.deletions
        );
    }

    if let Some(error) = &snapshot.diff_error {
        println!("  diff error: {}", error);
    }
    if let Some(document) = &snapshot.document {
        for file in &document.files {
            let note = file.fallback_text.as_deref().unwrap_or_default();
            println!(
                "  @ {} +{} -{} {}",
                file.display_name(),
                file.additions,
                file.deletions,
                note
            );
        }
    }
    Ok(())
}
