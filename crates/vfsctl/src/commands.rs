//! Implementations of the four auxiliary tools.
//!
//! Each function operates directly on the version store layout via
//! `vfscore::layout` — none of them go through a mount. They are kept
//! independent of `clap` so they can be exercised directly from tests.

use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;

use anyhow::{bail, Context, Result};

use vfscore::layout;

/// `cat-version`: write the raw bytes of `store/name.n` to `out`.
pub fn cat_version(store: &Path, name: &str, n: u32, out: &mut impl IoWrite) -> Result<()> {
    let path = layout::store_path(store, name, n);
    if !path.exists() {
        bail!("{name}.{n} does not exist in the version store");
    }
    let bytes = fs::read(&path).with_context(|| format!("reading {path:?}"))?;
    out.write_all(&bytes).context("writing to stdout")?;
    Ok(())
}

/// `list-versions`: one line per existing version, ascending, formatted
/// `name.n`.
pub fn list_versions(store: &Path, name: &str, out: &mut impl IoWrite) -> Result<()> {
    for (n, _) in layout::enumerate(store, name)? {
        writeln!(out, "{name}.{n}")?;
    }
    Ok(())
}

/// `promote`: snapshot `name.k` into the transient tmp file, rotate the
/// whole chain (evicting the oldest version, shifting everything else up
/// by one — including position 1, which the rotation vacates), then
/// install the snapshot as the new `name.1`. The chain is rotated in
/// full, so the old `name.1` ends up at `name.2` just like every other
/// surviving version.
pub fn promote(store: &Path, name: &str, k: u32) -> Result<()> {
    let src = layout::store_path(store, name, k);
    if !src.exists() {
        bail!("{name}.{k} does not exist in the version store");
    }

    let tmp = layout::tmp_path(store, name);
    fs::copy(&src, &tmp).with_context(|| format!("snapshotting {src:?} to {tmp:?}"))?;
    if let Ok(meta) = fs::metadata(&src) {
        if let Ok(mtime) = meta.modified() {
            if let Ok(file) = fs::File::open(&tmp) {
                let _ = file.set_modified(mtime);
            }
        }
    }

    layout::rotate(store, name).context("rotating version chain")?;

    let dst = layout::store_path(store, name, 1);
    fs::rename(&tmp, &dst).with_context(|| format!("installing {tmp:?} as {dst:?}"))?;
    Ok(())
}

/// `purge-old`: delete every version but the current one.
pub fn purge_old(store: &Path, name: &str) -> Result<()> {
    for (n, path) in layout::enumerate(store, name)? {
        if n == 1 {
            continue;
        }
        if let Err(source) = fs::remove_file(&path) {
            if source.kind() != std::io::ErrorKind::NotFound {
                return Err(source).with_context(|| format!("removing {path:?}"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(store: &Path, name: &str, n: u32, content: &[u8]) {
        fs::write(layout::store_path(store, name, n), content).unwrap();
    }

    #[test]
    fn cat_version_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a", 1, b"hello");

        let mut out = Vec::new();
        cat_version(dir.path(), "a", 1, &mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn cat_version_missing_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        assert!(cat_version(dir.path(), "a", 1, &mut out).is_err());
    }

    #[test]
    fn list_versions_prints_ascending() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b", 1, b"1");
        touch(dir.path(), "b", 2, b"2");
        touch(dir.path(), "b", 3, b"3");

        let mut out = Vec::new();
        list_versions(dir.path(), "b", &mut out).unwrap();
        assert_eq!(out, b"b.1\nb.2\nb.3\n");
    }

    #[test]
    fn list_versions_of_absent_name_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        list_versions(dir.path(), "nope", &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn promote_installs_target_and_shifts_rest() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=6u32 {
            touch(dir.path(), "b", n, format!("v{n}").as_bytes());
        }

        promote(dir.path(), "b", 4).unwrap();

        assert_eq!(
            fs::read_to_string(layout::store_path(dir.path(), "b", 1)).unwrap(),
            "v4"
        );
        assert_eq!(
            fs::read_to_string(layout::store_path(dir.path(), "b", 2)).unwrap(),
            "v1"
        );
        assert_eq!(
            fs::read_to_string(layout::store_path(dir.path(), "b", 3)).unwrap(),
            "v2"
        );
        assert_eq!(
            fs::read_to_string(layout::store_path(dir.path(), "b", 4)).unwrap(),
            "v3"
        );
        assert_eq!(
            fs::read_to_string(layout::store_path(dir.path(), "b", 5)).unwrap(),
            "v4"
        );
        assert_eq!(
            fs::read_to_string(layout::store_path(dir.path(), "b", 6)).unwrap(),
            "v5"
        );
        // former v6 was evicted
        assert!(!layout::store_path(dir.path(), "b", 7).exists());
    }

    #[test]
    fn promote_missing_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b", 1, b"v1");
        assert!(promote(dir.path(), "b", 4).is_err());
    }

    #[test]
    fn purge_old_keeps_only_current() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a", 1, b"1");
        touch(dir.path(), "a", 2, b"2");
        touch(dir.path(), "a", 3, b"3");

        purge_old(dir.path(), "a").unwrap();

        assert!(layout::store_path(dir.path(), "a", 1).exists());
        assert!(!layout::store_path(dir.path(), "a", 2).exists());
        assert!(!layout::store_path(dir.path(), "a", 3).exists());
    }
}
