use anyhow::Context;
use clap::Parser;
use driftlock::core::db::Store;
use std::env;
use std::path::PathBuf;

mod cli;

fn data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var("DRIFTLOCK_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".driftlock"))
}

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let dir = data_dir(args.data_dir);
    let store =
        Store::open(&dir).with_context(|| format!("opening store at {}", dir.display()))?;

    let result = match args.command {
        cli::Command::Lock { command } => cli::run_lock_cli(&store, command),
        cli::Command::Pull { command } => cli::run_pull_cli(&store, command),
    };
    result?;

    store.close()?;
    Ok(())
}
