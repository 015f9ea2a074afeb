//! CLI struct definitions and dispatch for the `driftlock` binary.
//!
//! Every command is a thin shell over the library operations in
//! [`driftlock::core`]; no semantics live here.

use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use driftlock::core::db::Store;
use driftlock::core::error::{DriftlockError, Result};
use driftlock::core::models::{Project, ProjectLock, PullRequest};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "driftlock",
    version = env!("CARGO_PKG_VERSION"),
    about = "Inspect and administer the driftlock store: project locks and merged pull-request plan/apply status."
)]
pub struct Cli {
    /// Data directory holding the store file. Falls back to
    /// DRIFTLOCK_DATA_DIR, then to ".driftlock".
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Operate on project locks
    Lock {
        #[clap(subcommand)]
        command: LockCommand,
    },
    /// Operate on pull-request status records
    Pull {
        #[clap(subcommand)]
        command: PullCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum LockCommand {
    /// List all current locks in key order
    List {
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Show the lock held on one (repo, path, workspace), if any
    Get {
        #[clap(long)]
        repo: String,
        #[clap(long)]
        path: String,
        #[clap(long, default_value = "default")]
        workspace: String,
    },
    /// Try to acquire a lock on behalf of a pull request
    Acquire {
        #[clap(long)]
        repo: String,
        #[clap(long)]
        path: String,
        #[clap(long, default_value = "default")]
        workspace: String,
        #[clap(long)]
        hostname: String,
        /// Base repository of the holding pull (defaults to --repo)
        #[clap(long)]
        base_repo: Option<String>,
        #[clap(long)]
        num: u64,
        #[clap(long)]
        head_commit: String,
    },
    /// Release the lock on one (repo, path, workspace)
    Release {
        #[clap(long)]
        repo: String,
        #[clap(long)]
        path: String,
        #[clap(long, default_value = "default")]
        workspace: String,
    },
    /// Release every lock a pull request holds under a repository
    ReleasePull {
        #[clap(long)]
        repo: String,
        #[clap(long)]
        num: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum PullCommand {
    /// Show the merged status record for a pull request
    Status {
        #[clap(long)]
        hostname: String,
        #[clap(long)]
        repo: String,
        #[clap(long)]
        num: u64,
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Delete the entire status record for a pull request
    Delete {
        #[clap(long)]
        hostname: String,
        #[clap(long)]
        repo: String,
        #[clap(long)]
        num: u64,
    },
    /// Drop every project status matching (workspace, dir) under a pull
    PruneProject {
        #[clap(long)]
        hostname: String,
        #[clap(long)]
        repo: String,
        #[clap(long)]
        num: u64,
        #[clap(long, default_value = "default")]
        workspace: String,
        #[clap(long)]
        dir: String,
    },
}

// Status records are keyed by (hostname, repo, num); the head commit is
// irrelevant for lookup and deletion.
fn pull_ref(hostname: &str, repo: &str, num: u64) -> PullRequest {
    PullRequest {
        hostname: hostname.to_string(),
        base_repo: repo.to_string(),
        num,
        head_commit: String::new(),
    }
}

fn print_lock(lock: &ProjectLock) {
    println!(
        "{} {}  workspace={} pull=#{} ({}) acquired={}",
        "locked".red().bold(),
        format!("{}/{}", lock.project.repo_full_name, lock.project.path).bold(),
        lock.workspace,
        lock.pull.num,
        lock.pull.base_repo,
        lock.time.format("%Y-%m-%d %H:%M:%S %Z"),
    );
}

pub fn run_lock_cli(store: &Store, command: LockCommand) -> Result<()> {
    match command {
        LockCommand::List { format } => {
            let locks = store.list_locks()?;
            if format == "json" {
                let rendered =
                    serde_json::to_string_pretty(&locks).map_err(DriftlockError::Encode)?;
                println!("{}", rendered);
            } else if locks.is_empty() {
                println!("No locks held.");
            } else {
                for lock in &locks {
                    print_lock(lock);
                }
            }
        }
        LockCommand::Get {
            repo,
            path,
            workspace,
        } => match store.get_lock(&Project::new(&repo, &path), &workspace)? {
            Some(lock) => print_lock(&lock),
            None => println!("{} {}/{} workspace={}", "free".green(), repo, path, workspace),
        },
        LockCommand::Acquire {
            repo,
            path,
            workspace,
            hostname,
            base_repo,
            num,
            head_commit,
        } => {
            let candidate = ProjectLock {
                project: Project::new(&repo, &path),
                workspace,
                pull: PullRequest {
                    hostname,
                    base_repo: base_repo.unwrap_or_else(|| repo.clone()),
                    num,
                    head_commit,
                },
                time: Local::now(),
            };
            let (acquired, holder) = store.try_acquire(candidate)?;
            if acquired {
                println!("{}", "Lock acquired.".green());
            } else {
                println!("{}", "Lock already held:".red());
                print_lock(&holder);
            }
        }
        LockCommand::Release {
            repo,
            path,
            workspace,
        } => match store.release(&Project::new(&repo, &path), &workspace)? {
            Some(lock) => println!("Released lock held by pull #{}.", lock.pull.num),
            None => println!("No lock was held."),
        },
        LockCommand::ReleasePull { repo, num } => {
            let released = store.release_all_for_pull(&repo, num)?;
            println!("Released {} lock(s) for {} #{}.", released.len(), repo, num);
            for lock in &released {
                println!("  {}/{} workspace={}", lock.project.repo_full_name, lock.project.path, lock.workspace);
            }
        }
    }
    Ok(())
}

pub fn run_pull_cli(store: &Store, command: PullCommand) -> Result<()> {
    match command {
        PullCommand::Status {
            hostname,
            repo,
            num,
            format,
        } => match store.get_pull_status(&pull_ref(&hostname, &repo, num))? {
            Some(status) => {
                if format == "json" {
                    let rendered =
                        serde_json::to_string_pretty(&status).map_err(DriftlockError::Encode)?;
                    println!("{}", rendered);
                } else {
                    println!(
                        "{} #{} @ {}",
                        status.pull.base_repo, status.pull.num, status.pull.head_commit
                    );
                    for p in &status.projects {
                        println!(
                            "  {} dir={} workspace={} -> {}",
                            p.project_name, p.repo_rel_dir, p.workspace, p.status
                        );
                    }
                }
            }
            None => println!("No status recorded for {} #{}.", repo, num),
        },
        PullCommand::Delete {
            hostname,
            repo,
            num,
        } => {
            store.delete_pull_status(&pull_ref(&hostname, &repo, num))?;
            println!("Deleted status for {} #{}.", repo, num);
        }
        PullCommand::PruneProject {
            hostname,
            repo,
            num,
            workspace,
            dir,
        } => {
            store.delete_project_status(&pull_ref(&hostname, &repo, num), &workspace, &dir)?;
            println!("Pruned projects in {} (workspace={}) from {} #{}.", dir, workspace, repo, num);
        }
    }
    Ok(())
}
