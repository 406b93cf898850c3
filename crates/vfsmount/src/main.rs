//! Mount entry point.
//!
//! Parses a single mount-point argument, ensures the version store exists
//! relative to the process's working directory, and hands the driver to
//! `fuser` in foreground, single-threaded mode. Exits non-zero on argument
//! error.

use std::path::PathBuf;

use clap::Parser;

/// Mount the versioning file system at a single flat directory.
#[derive(Parser)]
#[command(name = "vfsmount")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Mount the versioning file system")]
struct Cli {
    /// Where to mount the flat, versioned directory.
    mountpoint: PathBuf,

    /// Version store directory (default: .versiondir under the CWD).
    #[arg(short, long, value_name = "PATH")]
    store: Option<PathBuf>,
}

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

    if let Err(e) = vfsfuse::mount_foreground(store, &cli.mountpoint) {
        tracing::error!(error = %e, "mount failed");
        eprintln!("vfsmount: {e:#}");
        std::process::exit(1);
    }
}
