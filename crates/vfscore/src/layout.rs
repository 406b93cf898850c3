//! Pure operations over the version store.
//!
//! Every function here takes the store directory explicitly and performs no
//! caching — the store is the single source of truth, inspectable with
//! standard tools at any time.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::config::MAX_VERSIONS;
use crate::error::VfsError;

const COMPARE_CHUNK: usize = 64 * 1024;

/// Join the store directory with `name.n`.
pub fn store_path(store: &Path, name: &str, n: u32) -> PathBuf {
    store.join(format!("{name}.{n}"))
}

/// Path of the transient staging file for `name`.
pub fn staging_path(store: &Path, name: &str) -> PathBuf {
    store.join(format!(".staging.{name}"))
}

/// Path of the transient tmp file used by the promote tool.
pub fn tmp_path(store: &Path, name: &str) -> PathBuf {
    store.join(format!(".tmp.{name}"))
}

/// Enumerate the version chain for `name`, ordered ascending by index.
///
/// Scans `store` for entries of the form `name.N`, splitting on the *last*
/// `.` (so a logical name may itself contain dots). Entries whose suffix
/// does not parse as a `u32`, or whose name part does not match, are
/// silently ignored, rather than tripping enumeration up.
pub fn enumerate(store: &Path, name: &str) -> Result<Vec<(u32, PathBuf)>, VfsError> {
    let mut chain = Vec::new();

    let entries = match fs::read_dir(store) {
        Ok(entries) => entries,
        Err(source) => return Err(VfsError::io(store, source)),
    };

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let file_name = entry.file_name();
        let file_name = match file_name.to_str() {
            Some(s) => s,
            None => continue,
        };

        let Some((stem, suffix)) = file_name.rsplit_once('.') else {
            continue;
        };
        if stem != name {
            continue;
        }
        let Ok(n) = suffix.parse::<u32>() else {
            continue;
        };
        chain.push((n, entry.path()));
    }

    chain.sort_by_key(|(n, _)| *n);
    Ok(chain)
}

/// Returns true iff `store/name.1` exists — that is the definition of a
/// logical file being "present" in the mount.
pub fn is_present(store: &Path, name: &str) -> bool {
    store_path(store, name, 1).exists()
}

/// Rotate the version chain for `name`: shift every `name.n` to `name.n+1`
/// in descending order, evicting `name.K` first if present.
///
/// Post-condition: no file at `name.1` exists afterwards — the caller
/// installs the new current version.
pub fn rotate(store: &Path, name: &str) -> Result<(), VfsError> {
    let chain = enumerate(store, name)?;

    for (n, path) in chain.into_iter().rev() {
        if n >= MAX_VERSIONS {
            if let Err(source) = fs::remove_file(&path) {
                if source.kind() != std::io::ErrorKind::NotFound {
                    return Err(VfsError::io(path, source));
                }
            }
        } else {
            let dest = store_path(store, name, n + 1);
            if let Err(source) = fs::rename(&path, &dest) {
                return Err(VfsError::io(path, source));
            }
        }
    }

    Ok(())
}

/// Compare two files for byte equality.
///
/// Returns `false` if either path is missing or their sizes differ;
/// otherwise compares in fixed-size chunks rather than reading either file
/// fully into memory.
pub fn bytes_equal(a: &Path, b: &Path) -> bool {
    let (Ok(meta_a), Ok(meta_b)) = (fs::metadata(a), fs::metadata(b)) else {
        return false;
    };
    if meta_a.len() != meta_b.len() {
        return false;
    }

    let (Ok(mut fa), Ok(mut fb)) = (fs::File::open(a), fs::File::open(b)) else {
        return false;
    };
    if fa.seek(SeekFrom::Start(0)).is_err() || fb.seek(SeekFrom::Start(0)).is_err() {
        return false;
    }

    let mut buf_a = vec![0u8; COMPARE_CHUNK];
    let mut buf_b = vec![0u8; COMPARE_CHUNK];

    loop {
        let na = match fa.read(&mut buf_a) {
            Ok(n) => n,
            Err(_) => return false,
        };
        let nb = match fb.read(&mut buf_b) {
            Ok(n) => n,
            Err(_) => return false,
        };
        if na != nb {
            return false;
        }
        if na == 0 {
            return true;
        }
        if buf_a[..na] != buf_b[..nb] {
            return false;
        }
    }
}

/// The sorted set of visible logical names present in the store: every
/// distinct name for which `name.1` exists. This is what `readdir` yields.
/// Hidden names (leading `.`) are never included.
pub fn list_visible_names(store: &Path) -> Result<Vec<String>, VfsError> {
    use std::collections::BTreeSet;

    let mut names = BTreeSet::new();

    let entries = match fs::read_dir(store) {
        Ok(entries) => entries,
        Err(source) => return Err(VfsError::io(store, source)),
    };

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some((stem, suffix)) = file_name.rsplit_once('.') else {
            continue;
        };
        if suffix.parse::<u32>().is_err() {
            continue;
        }
        if crate::config::is_hidden_name(stem) {
            continue;
        }
        if is_present(store, stem) {
            names.insert(stem.to_string());
        }
    }

    Ok(names.into_iter().collect())
}

/// Delete every version of `name` (used by unlink).
pub fn delete_all(store: &Path, name: &str) -> Result<(), VfsError> {
    for (_, path) in enumerate(store, name)? {
        if let Err(source) = fs::remove_file(&path) {
            if source.kind() != std::io::ErrorKind::NotFound {
                return Err(VfsError::io(path, source));
            }
        }
    }
    Ok(())
}

/// Move every version of `old` to the corresponding index under `new`,
/// preserving the version number.
pub fn rename_chain(store: &Path, old: &str, new: &str) -> Result<(), VfsError> {
    for (n, path) in enumerate(store, old)? {
        let dest = store_path(store, new, n);
        if let Err(source) = fs::rename(&path, &dest) {
            return Err(VfsError::io(path, source));
        }
    }
    Ok(())
}
