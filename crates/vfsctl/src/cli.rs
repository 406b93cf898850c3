//! Command line interface definition.
//!
//! Four thin subcommands over the same version store layout the `vfsmount`
//! binary writes to — expressed as one multi-call binary rather than four
//! separate executables, sharing one root-directory argument.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vfsctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and manage the versioning file system's on-disk store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Version store directory (default: .versiondir under the CWD).
    #[arg(short, long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the raw bytes of a specific numbered version to stdout.
    CatVersion {
        /// Logical file name.
        name: String,
        /// Version index (1 = current).
        n: u32,
    },

    /// Print one line per existing version of a logical file, ascending.
    ListVersions {
        /// Logical file name.
        name: String,
    },

    /// Promote a historical version to become the current one.
    Promote {
        /// Logical file name.
        name: String,
        /// Version index to promote.
        k: u32,
    },

    /// Delete every non-current version of a logical file.
    PurgeOld {
        /// Logical file name.
        name: String,
    },
}
