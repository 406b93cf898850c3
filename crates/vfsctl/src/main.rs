//! Auxiliary CLI tools over the version store.
//!
//! Four thin subcommands of one binary: `cat-version`, `list-versions`,
//! `promote`, `purge-old`. None of them go through the mount — they
//! operate directly on the on-disk layout that `vfsmount` also writes to.

mod cli;
mod commands;

use std::io;
use std::path::PathBuf;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let store = cli
        .store
        .unwrap_or_else(|| PathBuf::from(vfscore::STORE_DIR_NAME));

    let result = match cli.command {
        Commands::CatVersion { name, n } => {
            commands::cat_version(&store, &name, n, &mut io::stdout())
        }
        Commands::ListVersions { name } => {
            commands::list_versions(&store, &name, &mut io::stdout())
        }
        Commands::Promote { name, k } => commands::promote(&store, &name, k),
        Commands::PurgeOld { name } => commands::purge_old(&store, &name),
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, "vfsctl command failed");
        eprintln!("vfsctl: {e:#}");
        std::process::exit(1);
    }
}
