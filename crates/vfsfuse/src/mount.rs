//! Foreground mount entry point.
//!
//! Unlike the background-session style used by an embedding GUI
//! application, this system's bridge call blocks the calling thread for
//! the lifetime of the mount — there is no supervisory process to restart
//! it, so there is nothing to hand a `BackgroundSession` back to.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::filesystem::VersionFilesystem;

/// Mount the versioning file system at `mountpoint`, backed by `store`,
/// blocking the calling thread until the mount is torn down (unmounted by
/// the host or the process is killed).
pub fn mount_foreground(store: PathBuf, mountpoint: &Path) -> Result<()> {
    let fs = VersionFilesystem::new(store.clone())
        .with_context(|| format!("initializing version store at {store:?}"))?;

    let options = vec![
        fuser::MountOption::FSName("versionfs".to_string()),
        fuser::MountOption::DefaultPermissions,
    ];

    tracing::info!(?mountpoint, ?store, "mounting versionfs in foreground");
    fuser::mount2(fs, mountpoint, &options)
        .with_context(|| format!("mounting versionfs at {mountpoint:?}"))
}
